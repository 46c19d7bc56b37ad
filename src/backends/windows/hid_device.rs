#![cfg(target_os = "windows")]

//! Windows HID joystick handle.
//!
//! [`HidJoystick`] wraps a non-blocking `hidapi::HidDevice` and a
//! [`WinHidpParser`]. `refresh` drains up to `buffer_size` queued reports and
//! folds each into the accumulated [`JoystickState`], so `current_state`
//! always reflects the newest report.
//!
//! HID handles on Windows are opened shared; "exclusive" here means the
//! handle is owned by exactly one poller.

use crate::backends::windows::hidp_parser::WinHidpParser;
use crate::device::DeviceHandle;
use crate::error::DeviceError;
use crate::state::JoystickState;
use hidapi::HidDevice;

/// Acquired HID joystick.
pub struct HidJoystick {
    raw: Option<HidDevice>,
    parser: WinHidpParser,
    buf: Vec<u8>,
    /// Upper bound on reports drained per `refresh`.
    buffer_size: usize,
    state: JoystickState,
}

impl HidJoystick {
    pub fn new(
        raw: HidDevice,
        parser: WinHidpParser,
        buffer_size: usize,
    ) -> Result<Self, String> {
        // Polled from a host-controlled tick, so reads must not block.
        raw.set_blocking_mode(false).map_err(|e| e.to_string())?;

        let buf = vec![0u8; parser.input_report_len().max(1)];
        let state = parser.initial_state();
        Ok(Self {
            raw: Some(raw),
            parser,
            buf,
            buffer_size: buffer_size.max(1),
            state,
        })
    }

    /// Windows-style split: first byte is the report ID.
    #[inline]
    fn split_report(data: &[u8]) -> (u8, &[u8]) {
        match data.split_first() {
            Some((&rid, payload)) => (rid, payload),
            None => (0, &[]),
        }
    }
}

impl DeviceHandle for HidJoystick {
    fn refresh(&mut self) -> Result<(), DeviceError> {
        let raw = self.raw.as_ref().ok_or(DeviceError::Disconnected)?;
        for _ in 0..self.buffer_size {
            let n = raw
                .read(&mut self.buf)
                .map_err(|e| DeviceError::Read(e.to_string()))?;
            if n == 0 {
                break; // queue drained (non-blocking)
            }
            let slice = &self.buf[..n];
            let (report_id, payload) = if self.parser.expects_report_id_prefix() {
                Self::split_report(slice)
            } else {
                (0, slice)
            };
            self.parser.parse(report_id, payload, &mut self.state);
        }
        Ok(())
    }

    fn current_state(&mut self) -> Result<JoystickState, DeviceError> {
        if self.raw.is_none() {
            return Err(DeviceError::Disconnected);
        }
        Ok(self.state.clone())
    }

    fn unacquire(&mut self) {
        // Closing the hidapi handle; the parser's OS handles go with Drop.
        self.raw = None;
    }
}
