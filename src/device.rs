//! Device-access collaborator traits.
//!
//! The pollers in [`backends`](crate::backends) never call platform APIs
//! directly. They talk to one of these traits, so the native Windows
//! implementations and the scripted virtual ones are interchangeable.
//!
//! ## Slot-based access ([`SlotApi`])
//! A fixed, small set of numbered slots (XInput has four). There is nothing
//! to open or close: a slot is either connected or not.
//!
//! ## Enumeration-based access ([`DeviceEnumerator`] + [`DeviceHandle`])
//! Devices are discovered by enumeration and must be acquired before reading.
//! The handle is exclusively owned by whoever acquired it; the native
//! resource is freed when the handle is dropped.

use crate::error::DeviceError;
use crate::metadata::DeviceMeta;
use crate::state::{JoystickState, SlotState};

/// Slot-based controller access.
pub trait SlotApi {
    /// Number of slots, scanned in ascending order.
    fn slot_count(&self) -> u32;

    /// Whether a controller currently occupies `slot`.
    fn is_connected(&self, slot: u32) -> bool;

    /// Read the current state of `slot`.
    fn read(&mut self, slot: u32) -> Result<SlotState, DeviceError>;
}

/// Enumeration-based controller discovery.
pub trait DeviceEnumerator {
    type Handle: DeviceHandle;

    /// Attached joystick/gamepad-class devices, in priority order.
    fn enumerate(&mut self) -> Result<Vec<DeviceMeta>, DeviceError>;

    /// Acquire an exclusive, buffered read handle to `device`.
    fn acquire(
        &mut self,
        device: &DeviceMeta,
        buffer_size: usize,
    ) -> Result<Self::Handle, DeviceError>;
}

/// An acquired device.
pub trait DeviceHandle {
    /// Refresh the handle's internal buffer.
    fn refresh(&mut self) -> Result<(), DeviceError>;

    /// The state accumulated by the last `refresh`.
    fn current_state(&mut self) -> Result<JoystickState, DeviceError>;

    /// Give up exclusive access. Called once, right before the handle is dropped.
    fn unacquire(&mut self);
}
