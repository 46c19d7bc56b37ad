//! Windows HID joystick discovery.
//!
//! - Enumerate HID devices via `hidapi`
//! - Keep only joystick (`0x04`) and gamepad (`0x05`) collections on the
//!   Generic Desktop page
//! - Gamepad collections are offered before joystick collections
//! - Drop XInput HID-compat "IG_" endpoints; those pads are read through XInput
//! - Acquire: open the device non-blocking and build a HIDP parser for it

#![cfg(target_os = "windows")]

use crate::backends::windows::hid_device::HidJoystick;
use crate::backends::windows::hidp_parser::WinHidpParser;
use crate::device::DeviceEnumerator;
use crate::error::DeviceError;
use crate::metadata::{sort_by_class, DeviceMeta, USAGE_GAMEPAD, USAGE_JOYSTICK};
use hidapi::{DeviceInfo, HidApi};
use std::ffi::CString;

const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;

/// [`DeviceEnumerator`] over `hidapi`.
///
/// The `HidApi` context is created on the first enumeration and refreshed on
/// every later one, so a failing init is retried on the next tick.
#[derive(Default)]
pub struct HidEnumerator {
    api: Option<HidApi>,
}

impl HidEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn api(&mut self) -> Result<&mut HidApi, DeviceError> {
        if let Some(api) = self.api.as_mut() {
            api.refresh_devices()
                .map_err(|e| DeviceError::Enumeration(e.to_string()))?;
        } else {
            let api = HidApi::new().map_err(|e| DeviceError::Enumeration(e.to_string()))?;
            self.api = Some(api);
        }
        self.api
            .as_mut()
            .ok_or_else(|| DeviceError::Enumeration("hidapi unavailable".into()))
    }
}

/// Decide whether a `hidapi` entry is a joystick/gamepad we should bind to.
fn accept_device(info: &DeviceInfo) -> bool {
    if info.usage_page() != USAGE_PAGE_GENERIC_DESKTOP {
        return false;
    }
    if !matches!(info.usage(), USAGE_JOYSTICK | USAGE_GAMEPAD) {
        return false;
    }
    // Interface Group = XInput-style HID; XInput already covers it.
    !info.path().to_string_lossy().contains("IG_")
}

fn meta(info: &DeviceInfo) -> DeviceMeta {
    DeviceMeta {
        bus: Some("usb".into()),
        vid: Some(info.vendor_id()),
        pid: Some(info.product_id()),
        product_string: info.product_string().map(|s| s.to_string()),
        serial_number: info.serial_number().map(|s| s.to_string()),
        usage_page: Some(info.usage_page()),
        usage: Some(info.usage()),
        path: info.path().to_string_lossy().to_string(),
    }
}

impl DeviceEnumerator for HidEnumerator {
    type Handle = HidJoystick;

    fn enumerate(&mut self) -> Result<Vec<DeviceMeta>, DeviceError> {
        let api = self.api()?;
        let mut out: Vec<DeviceMeta> = Vec::new();
        for info in api.device_list() {
            if !accept_device(info) {
                continue;
            }
            let m = meta(info);
            if out.iter().any(|seen| seen.path == m.path) {
                continue;
            }
            out.push(m);
        }
        sort_by_class(&mut out);
        Ok(out)
    }

    fn acquire(
        &mut self,
        device: &DeviceMeta,
        buffer_size: usize,
    ) -> Result<HidJoystick, DeviceError> {
        let fail = |reason: String| DeviceError::Acquisition {
            device: device.display_name().to_string(),
            reason,
        };
        let api = self
            .api
            .as_ref()
            .ok_or_else(|| fail("hidapi not initialised".into()))?;
        let path = CString::new(device.path.as_str()).map_err(|e| fail(e.to_string()))?;

        // HIDP parser is mandatory. If it fails, nothing is held.
        let parser = WinHidpParser::new(&device.path).map_err(fail)?;
        let raw = api.open_path(&path).map_err(|e| fail(e.to_string()))?;

        HidJoystick::new(raw, parser, buffer_size).map_err(fail)
    }
}
