#![cfg(target_os = "windows")]
//! Windows HIDP descriptor-driven report decoding.
//!
//! Builds a per-device field map using the Windows HID Parser (HIDP) APIs and
//! folds input reports into a [`JoystickState`]:
//! - Buttons (Button page `0x09`) via `HidP_GetUsages`. Usage `n` lands at
//!   index `n - 1`, so "button 1" is position 0.
//! - X / Y (Generic Desktop `0x30` / `0x31`) via `HidP_GetUsageValue`, rescaled
//!   from the descriptor's logical range to `0..=65535`.
//! - Hat switch (Generic Desktop `0x39`) converted to hundredths of a degree,
//!   with anything outside the logical range reported as [`POV_CENTERED`].
//!
//! Other usages (Z, rotations, sliders, vendor pages) are ignored; navigation
//! only needs the primary stick, the first hat and the buttons.
//!
//! ## Hat policy
//! - positional hats (at most 16 positions, e.g. `0..7`, `1..8`, `0..3`): the
//!   circle is split evenly, `(raw - min) * 36000 / positions`
//! - angular hats (e.g. `0..315`, `0..359`): `(raw - min) * 100`
//!
//! We open an OS handle from the HID path and keep it alive alongside the
//! `PreparsedData` handle for the parser lifetime.

use core::mem::MaybeUninit;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

use crate::state::{JoystickState, AXIS_CENTER, POV_CENTERED};

use windows_sys::Win32::Devices::HumanInterfaceDevice::*;
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE, NTSTATUS,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};

const STATUS_SUCCESS: NTSTATUS = HIDP_STATUS_SUCCESS;
const STATUS_BUFFER_TOO_SMALL: NTSTATUS = HIDP_STATUS_BUFFER_TOO_SMALL;

const PAGE_GENERIC_DESKTOP: u16 = 0x01;
const PAGE_BUTTON: u16 = 0x09;
const USAGE_X: u16 = 0x30;
const USAGE_Y: u16 = 0x31;
const USAGE_HAT: u16 = 0x39;

/// One button cap, expanded to its concrete usages.
#[derive(Clone, Debug)]
struct ButtonField {
    report_id: u8,
    link_collection: u16,
    usages: Vec<u16>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueRole {
    X,
    Y,
    /// Hundredths of a degree per logical unit.
    Hat { step: u32 },
}

/// One value cap we care about.
#[derive(Clone, Debug)]
struct ValueField {
    report_id: u8,
    usage: u16,
    link_collection: u16,
    logical_min: i32,
    logical_max: i32,
    bit_size: u16,
    role: ValueRole,
}

/// Descriptor-driven HIDP parser (Windows).
pub struct WinHidpParser {
    handle: HANDLE,
    ppd: PHIDP_PREPARSED_DATA,
    input_report_max_len: u16,
    buttons: Vec<ButtonField>,
    values: Vec<ValueField>,
    button_count: usize,
    has_hat: bool,
    /// Descriptor uses only report ID 0 (no ID byte on the wire).
    only_rid0: bool,
}

impl Drop for WinHidpParser {
    fn drop(&mut self) {
        unsafe {
            if self.ppd != 0 {
                HidD_FreePreparsedData(self.ppd);
                self.ppd = 0;
            }
            if !self.handle.is_null() {
                CloseHandle(self.handle);
                self.handle = std::ptr::null_mut();
            }
        }
    }
}

// The raw OS handles are only used from the owning poller.
unsafe impl Send for WinHidpParser {}

impl WinHidpParser {
    /// Open `path` and read its HID descriptor.
    ///
    /// Fails when the device cannot be opened, its preparsed data or caps
    /// cannot be read, or it exposes neither buttons nor an X/Y/hat value.
    /// Every OS handle acquired on the way is released before returning an error.
    pub fn new(path: &str) -> Result<Self, String> {
        let handle = open_device_handle(path).map_err(|code| format!("open failed ({code})"))?;

        let mut ppd: PHIDP_PREPARSED_DATA = 0;
        let ok = unsafe { HidD_GetPreparsedData(handle, &mut ppd) };
        if ok == 0 || ppd == 0 {
            unsafe { CloseHandle(handle) };
            return Err("HidD_GetPreparsedData failed".into());
        }

        let release = || unsafe {
            HidD_FreePreparsedData(ppd);
            CloseHandle(handle);
        };

        let mut caps = MaybeUninit::<HIDP_CAPS>::uninit();
        let status = unsafe { HidP_GetCaps(ppd, caps.as_mut_ptr()) };
        if status != STATUS_SUCCESS {
            release();
            return Err(format!("HidP_GetCaps failed (0x{:08x})", status as u32));
        }
        let caps = unsafe { caps.assume_init() };

        // A device may legally have only buttons or only values.
        let btn_caps = enumerate_button_caps(ppd, HidP_Input).unwrap_or_default();
        let val_caps = enumerate_value_caps(ppd, HidP_Input).unwrap_or_default();

        let buttons = normalize_buttons(&btn_caps);
        let values = normalize_values(&val_caps);
        if buttons.is_empty() && values.is_empty() {
            release();
            return Err("no buttons, axes or hat in descriptor".into());
        }

        let mut report_ids = BTreeSet::new();
        for b in &buttons {
            report_ids.insert(b.report_id);
        }
        for v in &values {
            report_ids.insert(v.report_id);
        }
        let only_rid0 = report_ids.len() == 1 && report_ids.contains(&0);

        let button_count = buttons
            .iter()
            .flat_map(|b| b.usages.iter().copied())
            .max()
            .map(usize::from)
            .unwrap_or(0);
        let has_hat = values
            .iter()
            .any(|v| matches!(v.role, ValueRole::Hat { .. }));

        tracing::debug!(
            path,
            buttons = button_count,
            values = values.len(),
            has_hat,
            only_rid0,
            "HIDP descriptor parsed"
        );

        Ok(Self {
            handle,
            ppd,
            input_report_max_len: caps.InputReportByteLength,
            buttons,
            values,
            button_count,
            has_hat,
            only_rid0,
        })
    }

    /// Size of one input report including the ID byte.
    pub fn input_report_len(&self) -> usize {
        self.input_report_max_len as usize
    }

    /// Whether reads carry a leading report ID byte.
    pub fn expects_report_id_prefix(&self) -> bool {
        !self.only_rid0
    }

    /// Neutral state shaped like this device.
    pub fn initial_state(&self) -> JoystickState {
        JoystickState {
            buttons: vec![false; self.button_count],
            x: AXIS_CENTER,
            y: AXIS_CENTER,
            povs: if self.has_hat {
                vec![POV_CENTERED]
            } else {
                Vec::new()
            },
        }
    }

    /// Fold one input report into `state`.
    ///
    /// Only fields belonging to the report's ID are updated; state carried by
    /// other reports is left alone.
    pub fn parse(&mut self, report_id: u8, payload: &[u8], state: &mut JoystickState) {
        let max = self.input_report_max_len as usize;
        let mut report = vec![0u8; max.max(1)];

        // With a single unnumbered report the "ID" byte is really data.
        let tmp_body: Vec<u8>;
        let (effective_rid, body): (u8, &[u8]) = if self.only_rid0 && report_id != 0 {
            tmp_body = std::iter::once(report_id)
                .chain(payload.iter().copied())
                .collect();
            (0, tmp_body.as_slice())
        } else {
            (report_id, payload)
        };

        report[0] = effective_rid;
        let copy_len = body.len().min(report.len().saturating_sub(1));
        report[1..1 + copy_len].copy_from_slice(&body[..copy_len]);
        let report_len = report.len() as u32;

        if state.buttons.len() < self.button_count {
            state.buttons.resize(self.button_count, false);
        }

        // ----- BUTTONS -----
        for bf in &self.buttons {
            if bf.report_id != 0 && bf.report_id != effective_rid {
                continue;
            }

            let mut usage_buf = [0u16; 128];
            let mut usage_len: u32 = usage_buf.len() as u32;
            let status = unsafe {
                HidP_GetUsages(
                    HidP_Input,
                    PAGE_BUTTON,
                    bf.link_collection,
                    usage_buf.as_mut_ptr(),
                    &mut usage_len,
                    self.ppd,
                    report.as_mut_ptr(),
                    report_len,
                )
            };
            if status != STATUS_SUCCESS {
                continue;
            }

            for &u in &bf.usages {
                if let Some(slot) = button_index(u).and_then(|i| state.buttons.get_mut(i)) {
                    *slot = false;
                }
            }
            for &u in &usage_buf[..usage_len as usize] {
                if let Some(slot) = button_index(u).and_then(|i| state.buttons.get_mut(i)) {
                    *slot = true;
                }
            }
        }

        // ----- VALUES (X, Y, hat) -----
        for vf in self.values.iter_mut() {
            if vf.report_id != 0 && vf.report_id != effective_rid {
                continue;
            }

            let mut value: u32 = 0;
            let mut status = unsafe {
                HidP_GetUsageValue(
                    HidP_Input,
                    PAGE_GENERIC_DESKTOP,
                    vf.link_collection,
                    vf.usage,
                    &mut value,
                    self.ppd,
                    report.as_mut_ptr(),
                    report_len,
                )
            };
            // Some stacks only answer on link collection 0.
            if status != STATUS_SUCCESS && vf.link_collection != 0 {
                status = unsafe {
                    HidP_GetUsageValue(
                        HidP_Input,
                        PAGE_GENERIC_DESKTOP,
                        0,
                        vf.usage,
                        &mut value,
                        self.ppd,
                        report.as_mut_ptr(),
                        report_len,
                    )
                };
                if status == STATUS_SUCCESS {
                    vf.link_collection = 0;
                }
            }
            if status != STATUS_SUCCESS {
                continue;
            }

            let raw = sign_extend(value, vf.bit_size, vf.logical_min);
            match vf.role {
                ValueRole::X => state.x = scale_axis(raw, vf.logical_min, vf.logical_max),
                ValueRole::Y => state.y = scale_axis(raw, vf.logical_min, vf.logical_max),
                ValueRole::Hat { step } => {
                    let pov = hat_to_pov(raw, vf.logical_min, vf.logical_max, step);
                    match state.povs.first_mut() {
                        Some(p) => *p = pov,
                        None => state.povs.push(pov),
                    }
                }
            }
        }
    }
}

// --------------------- descriptor enumeration helpers ---------------------

/// Query HIDP for button capabilities, growing the buffer once if needed.
fn enumerate_button_caps(
    ppd: PHIDP_PREPARSED_DATA,
    report_type: HIDP_REPORT_TYPE,
) -> Option<Vec<HIDP_BUTTON_CAPS>> {
    let mut len: u16 = 64;
    for _ in 0..2 {
        let mut caps: Vec<HIDP_BUTTON_CAPS> = vec![unsafe { core::mem::zeroed() }; len as usize];
        let mut needed: u16 = len;
        let status =
            unsafe { HidP_GetButtonCaps(report_type, caps.as_mut_ptr(), &mut needed, ppd) };
        if status == STATUS_SUCCESS {
            caps.truncate(needed as usize);
            return Some(caps);
        }
        if status != STATUS_BUFFER_TOO_SMALL || needed == 0 {
            return None;
        }
        len = needed;
    }
    None
}

/// Query HIDP for value capabilities, growing the buffer once if needed.
fn enumerate_value_caps(
    ppd: PHIDP_PREPARSED_DATA,
    report_type: HIDP_REPORT_TYPE,
) -> Option<Vec<HIDP_VALUE_CAPS>> {
    let mut len: u16 = 64;
    for _ in 0..2 {
        let mut caps: Vec<HIDP_VALUE_CAPS> = vec![unsafe { core::mem::zeroed() }; len as usize];
        let mut needed: u16 = len;
        let status =
            unsafe { HidP_GetValueCaps(report_type, caps.as_mut_ptr(), &mut needed, ppd) };
        if status == STATUS_SUCCESS {
            caps.truncate(needed as usize);
            return Some(caps);
        }
        if status != STATUS_BUFFER_TOO_SMALL || needed == 0 {
            return None;
        }
        len = needed;
    }
    None
}

/// Button-page caps, expanded to concrete usages.
fn normalize_buttons(caps: &[HIDP_BUTTON_CAPS]) -> Vec<ButtonField> {
    let mut out = Vec::new();
    for c in caps {
        if c.UsagePage != PAGE_BUTTON {
            continue;
        }
        let mut usages = Vec::new();
        unsafe {
            if c.IsRange != 0 {
                let r = c.Anonymous.Range;
                if r.UsageMin <= r.UsageMax {
                    usages.extend(r.UsageMin..=r.UsageMax);
                }
            } else {
                usages.push(c.Anonymous.NotRange.Usage);
            }
        }
        out.push(ButtonField {
            report_id: c.ReportID,
            link_collection: c.LinkCollection,
            usages,
        });
    }
    out
}

/// X, Y and hat value caps. The first cap for each role wins.
fn normalize_values(caps: &[HIDP_VALUE_CAPS]) -> Vec<ValueField> {
    let mut out: Vec<ValueField> = Vec::new();
    for c in caps {
        if c.UsagePage != PAGE_GENERIC_DESKTOP {
            continue;
        }
        let logical_min = c.LogicalMin;
        let logical_max = c.LogicalMax;

        let mut usages = Vec::new();
        unsafe {
            if c.IsRange != 0 {
                let r = c.Anonymous.Range;
                if r.UsageMin <= r.UsageMax {
                    usages.extend(r.UsageMin..=r.UsageMax);
                }
            } else {
                usages.push(c.Anonymous.NotRange.Usage);
            }
        }

        for u in usages {
            let role = match u {
                USAGE_X => ValueRole::X,
                USAGE_Y => ValueRole::Y,
                USAGE_HAT => ValueRole::Hat {
                    step: hat_step(logical_min, logical_max),
                },
                _ => continue,
            };
            let taken = out.iter().any(|v| {
                std::mem::discriminant(&v.role) == std::mem::discriminant(&role)
            });
            if taken {
                continue;
            }
            out.push(ValueField {
                report_id: c.ReportID,
                usage: u,
                link_collection: c.LinkCollection,
                logical_min,
                logical_max,
                bit_size: c.BitSize,
                role,
            });
        }
    }
    out
}

// --------------------- decoding helpers ---------------------

#[inline]
fn button_index(usage: u16) -> Option<usize> {
    (usage as usize).checked_sub(1)
}

/// Largest logical range still read as discrete hat positions.
const MAX_HAT_POSITIONS: i64 = 16;

/// Hundredths of a degree per logical unit of a hat with range `lo..=hi`.
fn hat_step(lo: i32, hi: i32) -> u32 {
    let positions = i64::from(hi) - i64::from(lo) + 1;
    if (2..=MAX_HAT_POSITIONS).contains(&positions) {
        (36000 / positions) as u32
    } else {
        100
    }
}

/// HIDP returns values zero-extended; restore the sign for signed ranges.
fn sign_extend(value: u32, bit_size: u16, logical_min: i32) -> i32 {
    if logical_min >= 0 || bit_size == 0 || bit_size >= 32 {
        return value as i32;
    }
    let shift = 32 - u32::from(bit_size);
    ((value << shift) as i32) >> shift
}

/// Rescale `[lo..hi]` onto `0..=65535` with clamping.
fn scale_axis(v: i32, lo: i32, hi: i32) -> u16 {
    let (lo, hi, v) = (lo as i64, hi as i64, v as i64);
    if hi <= lo {
        return AXIS_CENTER;
    }
    let t = (v.clamp(lo, hi) - lo) * 65535 / (hi - lo);
    t as u16
}

/// Convert a raw hat value to hundredths of a degree.
fn hat_to_pov(raw: i32, lo: i32, hi: i32, step: u32) -> u32 {
    if raw < lo || raw > hi {
        return POV_CENTERED;
    }
    let units = (i64::from(raw) - i64::from(lo)) as u64;
    let pov = units.saturating_mul(u64::from(step)).min(u64::from(u32::MAX)) as u32;
    if pov >= 36000 {
        POV_CENTERED
    } else {
        pov
    }
}

// --------------------- OS handle helpers ---------------------

/// Open a Windows file handle for a HID interface path.
///
/// The returned `HANDLE` must be closed with `CloseHandle`.
fn open_device_handle(path: &str) -> Result<HANDLE, u32> {
    use std::ptr::{null, null_mut};

    let wide: Vec<u16> = OsStr::new(path)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let try_open = |access: u32| unsafe {
        CreateFileW(
            wide.as_ptr(),
            access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            null(),
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            null_mut(),
        )
    };

    let mut handle = try_open(GENERIC_READ | GENERIC_WRITE);
    if handle == INVALID_HANDLE_VALUE {
        handle = try_open(GENERIC_READ);
    }

    if handle == INVALID_HANDLE_VALUE {
        Err(unsafe { GetLastError() })
    } else {
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_scaling_covers_full_range() {
        assert_eq!(scale_axis(0, 0, 255), 0);
        assert_eq!(scale_axis(255, 0, 255), 65535);
        assert_eq!(scale_axis(-32768, -32768, 32767), 0);
        assert_eq!(scale_axis(999, 0, 255), 65535);
        assert_eq!(scale_axis(5, 3, 3), AXIS_CENTER);
    }

    #[test]
    fn eight_way_hats_map_to_cardinals() {
        let step = hat_step(0, 7);
        assert_eq!(step, 4500);
        assert_eq!(hat_to_pov(0, 0, 7, step), 0);
        assert_eq!(hat_to_pov(2, 0, 7, step), 9000);
        assert_eq!(hat_to_pov(5, 1, 8, hat_step(1, 8)), 18000);
        assert_eq!(hat_to_pov(8, 0, 7, step), POV_CENTERED);
    }

    #[test]
    fn four_way_hats_reach_every_cardinal() {
        let step = hat_step(0, 3);
        assert_eq!(step, 9000);
        let povs: Vec<u32> = (0..=3).map(|raw| hat_to_pov(raw, 0, 3, step)).collect();
        assert_eq!(povs, vec![0, 9000, 18000, 27000]);
        assert_eq!(hat_to_pov(4, 0, 3, step), POV_CENTERED);
        assert_eq!(hat_to_pov(2, 1, 4, hat_step(1, 4)), 9000);
    }

    #[test]
    fn wide_hat_ranges_are_degrees() {
        assert_eq!(hat_step(0, 315), 100);
        assert_eq!(hat_step(0, 359), 100);
        assert_eq!(hat_to_pov(270, 0, 315, 100), 27000);
        assert_eq!(hat_to_pov(90, 0, 359, 100), 9000);
        // Degenerate single-value range.
        assert_eq!(hat_step(3, 3), 100);
    }

    #[test]
    fn sign_extension_for_signed_ranges() {
        // 8-bit field, -127..127: 0xFF is -1.
        assert_eq!(sign_extend(0xFF, 8, -127), -1);
        assert_eq!(sign_extend(0x7F, 8, -127), 127);
        assert_eq!(sign_extend(0x8000, 16, -32768), -32768);
        assert_eq!(sign_extend(200, 8, 0), 200);
    }
}
