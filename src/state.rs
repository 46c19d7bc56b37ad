//! Raw device snapshots.
//!
//! Backends read one of these per tick and keep the last successful one as the
//! "previous" snapshot for edge detection. Snapshots are plain owned values;
//! nothing here talks to hardware.
//!
//! # Conventions
//! - [`SlotState`] mirrors the XInput gamepad layout: a `u16` button bitmask
//!   and signed thumbstick axes centred on `0` (`-32768..=32767`).
//! - [`JoystickState`] mirrors a generic joystick: indexable buttons, unsigned
//!   axes centred near `32767` (`0..=65535`, smaller `y` is up) and zero or more
//!   point-of-view hats in hundredths of a degree.

use crate::frame::Directions;

/// XInput button bits, as reported in [`SlotState::buttons`].
pub mod buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// Centre of an unsigned joystick axis.
pub const AXIS_CENTER: u16 = 32767;

/// Hat value meaning "no direction".
pub const POV_CENTERED: u32 = u32::MAX;

/// Snapshot of one XInput-style controller slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotState {
    /// Button bitmask (see [`buttons`]).
    pub buttons: u16,
    /// Left stick X, right is positive.
    pub thumb_lx: i16,
    /// Left stick Y, up is positive.
    pub thumb_ly: i16,
}

impl SlotState {
    #[inline]
    pub fn is_down(&self, mask: u16) -> bool {
        self.buttons & mask != 0
    }

    /// Directions held on the digital d-pad.
    pub(crate) fn dpad(&self) -> Directions {
        Directions {
            left: self.is_down(buttons::DPAD_LEFT),
            right: self.is_down(buttons::DPAD_RIGHT),
            up: self.is_down(buttons::DPAD_UP),
            down: self.is_down(buttons::DPAD_DOWN),
        }
    }

    /// Directions the left stick is pushed past `deadzone` (strict).
    pub(crate) fn stick(&self, deadzone: i16) -> Directions {
        let dz = deadzone as i32;
        let (x, y) = (self.thumb_lx as i32, self.thumb_ly as i32);
        Directions {
            left: x < -dz,
            right: x > dz,
            up: y > dz,
            down: y < -dz,
        }
    }
}

/// Snapshot of one enumerated joystick/gamepad.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoystickState {
    /// Button states by position. Missing positions read as released.
    pub buttons: Vec<bool>,
    /// Primary X axis (`0..=65535`).
    pub x: u16,
    /// Primary Y axis (`0..=65535`, smaller is up).
    pub y: u16,
    /// Point-of-view hats in hundredths of a degree (`0..=35999`) or [`POV_CENTERED`].
    /// Empty when the device has no hat.
    pub povs: Vec<u32>,
}

impl Default for JoystickState {
    fn default() -> Self {
        Self {
            buttons: Vec::new(),
            x: AXIS_CENTER,
            y: AXIS_CENTER,
            povs: Vec::new(),
        }
    }
}

impl JoystickState {
    /// Whether the button at `idx` is held. Out-of-range reads as released.
    #[inline]
    pub fn button(&self, idx: usize) -> bool {
        self.buttons.get(idx).copied().unwrap_or(false)
    }

    /// First hat, or `None` when the device has none.
    #[inline]
    pub fn pov(&self) -> Option<u32> {
        self.povs.first().copied()
    }

    /// Cardinal direction of the first hat. Diagonals and the centred sentinel
    /// map to nothing.
    pub(crate) fn hat(&self) -> Directions {
        match self.pov() {
            Some(v) => pov_direction(v),
            None => Directions::default(),
        }
    }

    /// Directions the primary stick is pushed past the thresholds (strict).
    pub(crate) fn stick(&self, low: u16, high: u16) -> Directions {
        Directions {
            left: self.x < low,
            right: self.x > high,
            up: self.y < low,
            down: self.y > high,
        }
    }
}

/// Map an exact hat angle to a cardinal direction.
fn pov_direction(value: u32) -> Directions {
    let mut d = Directions::default();
    match value {
        0 => d.up = true,
        9000 => d.right = true,
        18000 => d.down = true,
        27000 => d.left = true,
        _ => {}
    }
    d
}
