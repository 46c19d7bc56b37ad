//! Slot-based poller.
//!
//! Scans slots `0..slot_count` in ascending order and binds to the first
//! connected one. Each tick the bound slot is read and compared against the
//! snapshot from the previous tick:
//!
//! - buttons: bit set now and not set before
//! - directions: d-pad edge OR stick edge, where the stick counts as pushed once
//!   its magnitude strictly exceeds the deadzone
//!
//! A failed read drops the binding and the snapshot, so a reconnect starts
//! from a clean slate.

use super::{Backend, PollResult, Source};
use crate::config::SlotConfig;
use crate::device::SlotApi;
use crate::frame::{rising, Directions, InputFrame};
use crate::state::{buttons, SlotState};
use tracing::{debug, info, warn};

/// Backend over a [`SlotApi`].
pub struct SlotPoller<S> {
    api: S,
    slot_count: u32,
    deadzone: i16,
    /// Bound slot, `Some` while connected.
    active: Option<u32>,
    /// Last successfully read state of `active`.
    prev: Option<SlotState>,
}

impl<S: SlotApi> SlotPoller<S> {
    pub fn new(api: S, config: &SlotConfig) -> Self {
        let slot_count = config.slot_count.min(api.slot_count());
        Self {
            api,
            slot_count,
            deadzone: config.stick_deadzone,
            active: None,
            prev: None,
        }
    }

    /// Currently bound slot.
    #[inline]
    pub fn active_slot(&self) -> Option<u32> {
        self.active
    }

    /// Access the collaborator (used by hosts that script virtual slots).
    #[inline]
    pub fn api(&self) -> &S {
        &self.api
    }

    fn translate(&self, now: &SlotState) -> InputFrame {
        let prev = self.prev.as_ref();
        let pressed = |mask: u16| rising(now.is_down(mask), prev.map(|p| p.is_down(mask)));

        let dpad = Directions::edges(now.dpad(), prev.map(SlotState::dpad));
        let stick = Directions::edges(
            now.stick(self.deadzone),
            prev.map(|p| p.stick(self.deadzone)),
        );
        let dir = dpad.or(stick);

        InputFrame {
            left: dir.left,
            right: dir.right,
            up: dir.up,
            down: dir.down,
            a: pressed(buttons::A),
            b: pressed(buttons::B),
            start: pressed(buttons::START),
            back: pressed(buttons::BACK),
        }
    }
}

impl<S: SlotApi> Backend for SlotPoller<S> {
    fn kind(&self) -> &'static str {
        "slot"
    }

    fn ensure_connected(&mut self) -> bool {
        self.prev = None;
        for slot in 0..self.slot_count {
            if self.api.is_connected(slot) {
                if self.active != Some(slot) {
                    info!(slot, "slot controller connected");
                }
                self.active = Some(slot);
                return true;
            }
        }
        self.active = None;
        false
    }

    fn poll(&mut self) -> PollResult {
        if self.active.is_none() && !self.ensure_connected() {
            return PollResult::disconnected();
        }
        let Some(slot) = self.active else {
            return PollResult::disconnected();
        };

        match self.api.read(slot) {
            Ok(now) => {
                let frame = self.translate(&now);
                if !frame.is_empty() {
                    debug!(slot, pressed = ?frame.pressed(), "slot frame");
                }
                self.prev = Some(now);
                PollResult::connected(Source::Slot(slot), frame)
            }
            Err(e) => {
                warn!(slot, error = %e, "slot controller lost");
                self.release();
                PollResult::disconnected()
            }
        }
    }

    fn release(&mut self) {
        self.active = None;
        self.prev = None;
    }

    fn is_connected(&self) -> bool {
        self.active.is_some()
    }
}
