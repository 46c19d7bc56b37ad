//! Polling backends.
//!
//! A [`Backend`] turns one device-access collaborator into per-tick
//! [`PollResult`]s. There are two shapes:
//!
//! - [`SlotPoller`](slot::SlotPoller) scans a fixed list of numbered slots
//!   (XInput) and binds to the first occupied one.
//! - [`DevicePoller`](enumerated::DevicePoller) enumerates joystick and gamepad
//!   devices (HID), acquires the first one and reads it through a handle.
//!
//! Both own their previous-snapshot and binding state; nothing is shared
//! between backends. Failures never escape `poll`: the backend releases what
//! it holds, drops back to disconnected and tries again on the next tick.
//!
//! # Feature flags
//! - **`hid`**: native Windows backends (XInput slots + HID joysticks).
//! - **`virtual`**: scripted in-memory devices for tests and headless hosts.

use crate::config::InputConfig;
use crate::device::{DeviceEnumerator, DeviceHandle, SlotApi};
use crate::error::DeviceError;
use crate::frame::InputFrame;
use crate::metadata::DeviceMeta;
use crate::state::{JoystickState, SlotState};

pub mod enumerated;
pub mod slot;

#[cfg(feature = "virtual")]
#[cfg_attr(docsrs, doc(cfg(feature = "virtual")))]
pub mod virtual_input;

#[cfg(all(feature = "hid", target_os = "windows"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "hid", target_os = "windows"))))]
pub mod windows;

use enumerated::DevicePoller;
use slot::SlotPoller;

/// Where a connected result came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    /// Slot-based backend, with the slot index.
    Slot(u32),
    /// Enumeration-based backend, with the device's display name.
    Device(String),
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Slot(slot) => write!(f, "XInput slot {slot}"),
            Source::Device(name) => write!(f, "HID device {name}"),
        }
    }
}

/// Outcome of one poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollResult {
    /// `Some` when a controller was read this tick.
    pub source: Option<Source>,
    /// Edges for this tick. Always empty when `source` is `None`.
    pub frame: InputFrame,
}

impl PollResult {
    #[inline]
    pub fn connected(source: Source, frame: InputFrame) -> Self {
        Self {
            source: Some(source),
            frame,
        }
    }

    #[inline]
    pub fn disconnected() -> Self {
        Self {
            source: None,
            frame: InputFrame::EMPTY,
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Slot number or device name of the controller that was read.
    pub fn identifier(&self) -> Option<String> {
        match &self.source {
            Some(Source::Slot(slot)) => Some(slot.to_string()),
            Some(Source::Device(name)) => Some(name.clone()),
            None => None,
        }
    }

    /// Status line suitable for a UI footer.
    pub fn status(&self) -> String {
        match &self.source {
            Some(src) => format!("Gamepad: {src} connected"),
            None => "Gamepad: not connected".to_string(),
        }
    }
}

/// A pollable controller source.
///
/// Implementations must make every method safe to call at any time, in any
/// order, any number of times.
pub trait Backend {
    /// Short label used in logs.
    fn kind(&self) -> &'static str;

    /// Bind to a device if one is available. Clears the previous snapshot.
    fn ensure_connected(&mut self) -> bool;

    /// Read one tick. Connects first when unbound.
    fn poll(&mut self) -> PollResult;

    /// Release whatever is held and drop back to disconnected. Idempotent.
    fn release(&mut self);

    /// Whether a binding is currently held.
    fn is_connected(&self) -> bool;
}

/// Collaborator for platforms without native support: no slots, no devices.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unavailable;

impl SlotApi for Unavailable {
    fn slot_count(&self) -> u32 {
        0
    }

    fn is_connected(&self, _slot: u32) -> bool {
        false
    }

    fn read(&mut self, _slot: u32) -> Result<SlotState, DeviceError> {
        Err(DeviceError::Disconnected)
    }
}

impl DeviceEnumerator for Unavailable {
    type Handle = std::convert::Infallible;

    fn enumerate(&mut self) -> Result<Vec<DeviceMeta>, DeviceError> {
        Ok(Vec::new())
    }

    fn acquire(
        &mut self,
        device: &DeviceMeta,
        _buffer_size: usize,
    ) -> Result<Self::Handle, DeviceError> {
        Err(DeviceError::Acquisition {
            device: device.display_name().to_string(),
            reason: "no native backend on this platform".into(),
        })
    }
}

impl DeviceHandle for std::convert::Infallible {
    fn refresh(&mut self) -> Result<(), DeviceError> {
        match *self {}
    }

    fn current_state(&mut self) -> Result<JoystickState, DeviceError> {
        match *self {}
    }

    fn unacquire(&mut self) {
        match *self {}
    }
}

/// Native backends in priority order: XInput slots first, then HID joysticks.
#[cfg(all(feature = "hid", target_os = "windows"))]
pub fn native_backends(config: &InputConfig) -> Vec<Box<dyn Backend>> {
    use self::windows::{HidEnumerator, XInputSlots};
    vec![
        Box::new(SlotPoller::new(XInputSlots, &config.slots)),
        Box::new(DevicePoller::new(HidEnumerator::new(), &config.device)),
    ]
}

/// Native backends in priority order. Without native support both backends
/// stay disconnected forever.
#[cfg(not(all(feature = "hid", target_os = "windows")))]
pub fn native_backends(config: &InputConfig) -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(SlotPoller::new(Unavailable, &config.slots)),
        Box::new(DevicePoller::new(Unavailable, &config.device)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_result_is_empty() {
        let r = PollResult::disconnected();
        assert!(!r.is_connected());
        assert!(r.frame.is_empty());
        assert_eq!(r.identifier(), None);
        assert_eq!(r.status(), "Gamepad: not connected");
    }

    #[test]
    fn identifiers_and_status() {
        let r = PollResult::connected(Source::Slot(2), InputFrame::EMPTY);
        assert_eq!(r.identifier().as_deref(), Some("2"));
        assert_eq!(r.status(), "Gamepad: XInput slot 2 connected");

        let r = PollResult::connected(Source::Device("Arcade Stick".into()), InputFrame::EMPTY);
        assert_eq!(r.identifier().as_deref(), Some("Arcade Stick"));
        assert_eq!(r.status(), "Gamepad: HID device Arcade Stick connected");
    }

    #[test]
    fn unavailable_backends_never_connect() {
        let mut backends = native_backends_for_test();
        for b in backends.iter_mut() {
            for _ in 0..3 {
                assert_eq!(b.poll(), PollResult::disconnected());
            }
            assert!(!b.is_connected());
            b.release();
            b.release();
        }
    }

    fn native_backends_for_test() -> Vec<Box<dyn Backend>> {
        let cfg = InputConfig::default();
        vec![
            Box::new(SlotPoller::new(Unavailable, &cfg.slots)),
            Box::new(DevicePoller::new(Unavailable, &cfg.device)),
        ]
    }
}
