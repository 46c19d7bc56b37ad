#![cfg(target_os = "windows")]

//! Windows XInput slots.
//!
//! XInput exposes up to four controllers as numbered slots (`0..4`). There is
//! no handle to open: `XInputGetState` either fills the state or reports the
//! slot empty.
//!
//! Xbox-style pads also show up as HID "IG_" endpoints; the HID enumerator
//! skips those so a pad is only ever read through this path.

use crate::device::SlotApi;
use crate::error::DeviceError;
use crate::state::SlotState;

use windows_sys::Win32::Foundation::{ERROR_DEVICE_NOT_CONNECTED, ERROR_SUCCESS};
use windows_sys::Win32::UI::Input::XboxController::{XInputGetState, XINPUT_STATE};

/// Number of slots XInput supports.
pub const XUSER_MAX_COUNT: u32 = 4;

/// [`SlotApi`] over the system XInput slots.
#[derive(Clone, Copy, Debug, Default)]
pub struct XInputSlots;

impl XInputSlots {
    fn get_state(slot: u32) -> Result<XINPUT_STATE, u32> {
        // FFI struct: must be manually zeroed
        let mut state: XINPUT_STATE = unsafe { std::mem::zeroed() };
        let res = unsafe { XInputGetState(slot, &mut state) };
        if res == ERROR_SUCCESS {
            Ok(state)
        } else {
            Err(res)
        }
    }
}

impl SlotApi for XInputSlots {
    fn slot_count(&self) -> u32 {
        XUSER_MAX_COUNT
    }

    fn is_connected(&self, slot: u32) -> bool {
        Self::get_state(slot).is_ok()
    }

    fn read(&mut self, slot: u32) -> Result<SlotState, DeviceError> {
        match Self::get_state(slot) {
            Ok(state) => {
                let gp = state.Gamepad;
                Ok(SlotState {
                    buttons: gp.wButtons as u16,
                    thumb_lx: gp.sThumbLX,
                    thumb_ly: gp.sThumbLY,
                })
            }
            Err(code) if code == ERROR_DEVICE_NOT_CONNECTED => Err(DeviceError::Disconnected),
            Err(code) => Err(DeviceError::Read(format!(
                "XInputGetState(slot {slot}) failed with {code}"
            ))),
        }
    }
}
