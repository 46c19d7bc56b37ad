//! Enumerated device description.
//!
//! [`DeviceMeta`] is what a [`DeviceEnumerator`](crate::device::DeviceEnumerator)
//! hands back for each attached device. The enumeration-based backend picks
//! the first entry, passes it back to `acquire`, and reports its display name
//! as the connection identifier.
//!
//! # Conventions
//! - `bus` is a short hint like `"usb"`, `"bluetooth"` or `"virtual"`.
//! - `product_string` is the OS/firmware name when available.
//! - `path` is an opaque OS path. Backends use it to reopen the device; treat it
//!   as diagnostic otherwise.

use serde::{Deserialize, Serialize};

/// Metadata describing one attached device.
///
/// All fields except `path` are best-effort.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// High-level bus classification.
    pub bus: Option<String>,

    /// USB Vendor ID, if known.
    pub vid: Option<u16>,

    /// USB Product ID, if known.
    pub pid: Option<u16>,

    /// Human-readable product name.
    pub product_string: Option<String>,

    /// Serial number, if the firmware supplies one.
    pub serial_number: Option<String>,

    /// HID Usage Page (`0x01` Generic Desktop for joysticks and gamepads).
    pub usage_page: Option<u16>,

    /// HID Usage (`0x04` Joystick, `0x05` Gamepad).
    pub usage: Option<u16>,

    /// OS path used to open the device.
    pub path: String,
}

impl DeviceMeta {
    /// Name used in status lines and as the backend's connection identifier.
    pub fn display_name(&self) -> &str {
        match self.product_string.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => "Unknown device",
        }
    }

    /// Enumeration priority: gamepads first, then joysticks, then anything else.
    fn class_rank(&self) -> u8 {
        match self.usage {
            Some(USAGE_GAMEPAD) => 0,
            Some(USAGE_JOYSTICK) => 1,
            _ => 2,
        }
    }
}

/// HID Usage for joysticks on the Generic Desktop page.
pub const USAGE_JOYSTICK: u16 = 0x04;
/// HID Usage for gamepads on the Generic Desktop page.
pub const USAGE_GAMEPAD: u16 = 0x05;

/// Order enumerated devices by class, gamepads before joysticks. Stable, so
/// devices of the same class keep their enumeration order.
pub fn sort_by_class(devices: &mut [DeviceMeta]) {
    devices.sort_by_key(DeviceMeta::class_rank);
}

impl std::fmt::Display for DeviceMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => {
                write!(f, "{} [{vid:04x}:{pid:04x}]", self.display_name())
            }
            _ => f.write_str(self.display_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_product_falls_back() {
        let m = DeviceMeta {
            product_string: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(m.display_name(), "Unknown device");
    }

    #[test]
    fn gamepads_sort_before_joysticks() {
        let dev = |path: &str, usage: u16| DeviceMeta {
            usage: Some(usage),
            path: path.into(),
            ..Default::default()
        };
        let mut list = vec![
            dev("j1", USAGE_JOYSTICK),
            dev("g1", USAGE_GAMEPAD),
            dev("j2", USAGE_JOYSTICK),
            dev("g2", USAGE_GAMEPAD),
        ];
        sort_by_class(&mut list);
        let paths: Vec<&str> = list.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, ["g1", "g2", "j1", "j2"]);
    }

    #[test]
    fn display_includes_ids_when_known() {
        let m = DeviceMeta {
            product_string: Some("Pad".into()),
            vid: Some(0x054c),
            pid: Some(0x09cc),
            ..Default::default()
        };
        assert_eq!(m.to_string(), "Pad [054c:09cc]");
    }
}
