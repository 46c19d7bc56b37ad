#![cfg(target_os = "windows")]

//! Windows input backends.
//!
//! - **XInput** slots ([`XInputSlots`]) for Xbox-style pads, the primary source
//! - **HID** discovery ([`HidEnumerator`]) for every other joystick/gamepad,
//!   with reports decoded by the Windows HID parser (HIDP)
//!
//! Most users should not touch these directly; [`Gamepad::native`](crate::Gamepad::native)
//! wires them up in the right order.

pub mod hid_device;
pub mod hid_discovery;
pub mod hidp_parser;
pub mod xinput;

pub use hid_device::HidJoystick;
pub use hid_discovery::HidEnumerator;
pub use xinput::XInputSlots;
