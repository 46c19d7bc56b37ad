//! Fixed-interval polling driver.
//!
//! The driver owns a [`Gamepad`] and calls [`Gamepad::poll`] once per tick,
//! strictly sequentially. A host can pause it while its surface is inactive
//! (window unfocused, a launched game in the foreground) and resume it later;
//! paused ticks do not touch the devices at all.
//!
//! [`PollDriver::tick`] is for hosts that already own a timer. [`PollDriver::run`]
//! runs the loop on the current thread until a stop flag is set.

use crate::backends::PollResult;
use crate::config::InputConfig;
use crate::manager::Gamepad;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cloneable pause switch shared with other surfaces.
#[derive(Clone, Debug, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    pub fn pause(&self) {
        if !self.0.swap(true, Ordering::AcqRel) {
            debug!("polling paused");
        }
    }

    pub fn resume(&self) {
        if self.0.swap(false, Ordering::AcqRel) {
            debug!("polling resumed");
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Drives a [`Gamepad`] at a fixed interval.
pub struct PollDriver {
    gamepad: Gamepad,
    interval: Duration,
    pause: PauseHandle,
}

impl PollDriver {
    pub fn new(gamepad: Gamepad, interval: Duration) -> Self {
        Self {
            gamepad,
            interval,
            pause: PauseHandle::default(),
        }
    }

    /// Use the configured tick interval.
    pub fn from_config(gamepad: Gamepad, config: &InputConfig) -> Self {
        Self::new(gamepad, config.tick_interval())
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A handle that pauses/resumes this driver from elsewhere.
    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    pub fn pause(&self) {
        self.pause.pause();
    }

    pub fn resume(&self) {
        self.pause.resume();
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// Poll once. `None` while paused.
    pub fn tick(&mut self) -> Option<PollResult> {
        if self.pause.is_paused() {
            return None;
        }
        Some(self.gamepad.poll())
    }

    /// Tick at the configured interval until `stop` is set, handing each result
    /// to `sink`. Returns the number of ticks that actually polled.
    ///
    /// Ticks that overrun the interval are not made up; the schedule restarts
    /// from the late tick.
    pub fn run<F>(&mut self, stop: &AtomicBool, mut sink: F) -> u64
    where
        F: FnMut(&PollResult),
    {
        let mut polled = 0u64;
        let mut next = Instant::now();
        while !stop.load(Ordering::Acquire) {
            if let Some(result) = self.tick() {
                polled += 1;
                sink(&result);
            }
            next += self.interval;
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            } else {
                next = now;
            }
        }
        polled
    }

    pub fn gamepad(&self) -> &Gamepad {
        &self.gamepad
    }

    pub fn gamepad_mut(&mut self) -> &mut Gamepad {
        &mut self.gamepad
    }

    /// Take the gamepad back.
    pub fn into_inner(self) -> Gamepad {
        self.gamepad
    }
}
