//! The orchestrator.
//!
//! [`Gamepad`] owns an ordered list of [`Backend`]s and, each tick, returns the
//! first connected result. With the native setup that is XInput first and HID
//! second, so an Xbox-style pad always wins over a generic joystick plugged in
//! at the same time. It performs no edge detection of its own.

use crate::backends::enumerated::DevicePoller;
use crate::backends::slot::SlotPoller;
use crate::backends::{native_backends, Backend, PollResult, Source};
use crate::config::InputConfig;
use crate::device::{DeviceEnumerator, SlotApi};
use tracing::{debug, info};

/// Unified controller input with ordered backend fallback.
pub struct Gamepad {
    backends: Vec<Box<dyn Backend>>,
    /// Source that produced the last connected result.
    active: Option<Source>,
    /// [`Backend::kind`] of the backend behind `active`.
    active_kind: Option<&'static str>,
}

impl Gamepad {
    /// `primary` is always tried before `fallback`.
    pub fn new(primary: impl Backend + 'static, fallback: impl Backend + 'static) -> Self {
        Self::with_backends(vec![Box::new(primary), Box::new(fallback)])
    }

    /// Any number of backends, tried in the given order.
    pub fn with_backends(backends: Vec<Box<dyn Backend>>) -> Self {
        Self {
            backends,
            active: None,
            active_kind: None,
        }
    }

    /// Slot poller over `slots` first, device poller over `devices` second.
    pub fn from_collaborators<S, E>(slots: S, devices: E, config: &InputConfig) -> Self
    where
        S: SlotApi + 'static,
        E: DeviceEnumerator + 'static,
    {
        Self::new(
            SlotPoller::new(slots, &config.slots),
            DevicePoller::new(devices, &config.device),
        )
    }

    /// Platform backends (XInput, then HID). On platforms without native
    /// support this never connects.
    pub fn native(config: &InputConfig) -> Self {
        Self::with_backends(native_backends(config))
    }

    /// Poll backends in order and return the first connected result, or a
    /// disconnected one when none is available. Never fails.
    pub fn poll(&mut self) -> PollResult {
        for backend in self.backends.iter_mut() {
            let result = backend.poll();
            if result.is_connected() {
                let hit = result.source.clone().map(|src| (backend.kind(), src));
                self.note_source(hit);
                return result;
            }
        }
        self.note_source(None);
        PollResult::disconnected()
    }

    /// Source of the last connected result, `None` after a tick with nothing.
    #[inline]
    pub fn active_source(&self) -> Option<&Source> {
        self.active.as_ref()
    }

    /// Kind of the backend that produced the last connected result.
    #[inline]
    pub fn active_backend(&self) -> Option<&'static str> {
        self.active_kind
    }

    /// Release every backend in order. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        for backend in self.backends.iter_mut() {
            if backend.is_connected() {
                debug!(backend = backend.kind(), "releasing backend");
            }
            backend.release();
        }
        self.active_kind = None;
        if self.active.take().is_some() {
            info!("gamepad shut down");
        }
    }

    fn note_source(&mut self, hit: Option<(&'static str, Source)>) {
        let (kind, source) = match hit {
            Some((kind, src)) => (Some(kind), Some(src)),
            None => (None, None),
        };
        self.active_kind = kind;
        if self.active == source {
            return;
        }
        match (&source, kind) {
            (Some(src), Some(backend)) => info!(backend, source = %src, "gamepad input source"),
            _ => info!("no gamepad connected"),
        }
        self.active = source;
    }
}

impl Drop for Gamepad {
    fn drop(&mut self) {
        self.shutdown();
    }
}
