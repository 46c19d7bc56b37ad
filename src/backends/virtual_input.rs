//! Scripted in-memory devices.
//!
//! [`VirtualSlots`] and [`VirtualEnumerator`] implement the same collaborator
//! traits as the native backends, so a [`Gamepad`](crate::manager::Gamepad) can
//! be driven without hardware (tests, headless hosts, demos).
//!
//! Both types are cheap handles over shared state: clone one, give the clone
//! to a poller, and keep scripting through the original.
//!
//! ```
//! use padnav::backends::virtual_input::{VirtualEnumerator, VirtualSlots};
//! use padnav::state::{buttons, SlotState};
//! use padnav::{Gamepad, InputConfig};
//!
//! let slots = VirtualSlots::new(4);
//! let devices = VirtualEnumerator::new();
//! let mut pad = Gamepad::from_collaborators(slots.clone(), devices.clone(), &InputConfig::default());
//!
//! slots.plug(0);
//! slots.set(0, SlotState { buttons: buttons::A, ..Default::default() });
//! assert!(pad.poll().frame.a);
//! ```

use crate::device::{DeviceEnumerator, DeviceHandle, SlotApi};
use crate::error::DeviceError;
use crate::metadata::DeviceMeta;
use crate::state::{JoystickState, SlotState};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SlotEntry {
    connected: bool,
    state: SlotState,
    fail_next_read: bool,
}

#[derive(Default)]
struct SlotsInner {
    slots: Vec<SlotEntry>,
    reads: usize,
}

/// Virtual slot-based controllers.
#[derive(Clone, Default)]
pub struct VirtualSlots {
    inner: Arc<Mutex<SlotsInner>>,
}

impl VirtualSlots {
    /// `count` empty slots.
    pub fn new(count: u32) -> Self {
        let slots = (0..count).map(|_| SlotEntry::default()).collect();
        Self {
            inner: Arc::new(Mutex::new(SlotsInner { slots, reads: 0 })),
        }
    }

    /// Connect a controller to `slot` with a neutral state.
    pub fn plug(&self, slot: u32) {
        if let Some(e) = lock(&self.inner).slots.get_mut(slot as usize) {
            e.connected = true;
            e.state = SlotState::default();
        }
    }

    /// Disconnect `slot`. Reads of it fail from now on.
    pub fn unplug(&self, slot: u32) {
        if let Some(e) = lock(&self.inner).slots.get_mut(slot as usize) {
            e.connected = false;
        }
    }

    /// Replace the state reported by `slot`.
    pub fn set(&self, slot: u32, state: SlotState) {
        if let Some(e) = lock(&self.inner).slots.get_mut(slot as usize) {
            e.state = state;
        }
    }

    /// Make the next read of `slot` fail once, without unplugging it.
    pub fn fail_next_read(&self, slot: u32) {
        if let Some(e) = lock(&self.inner).slots.get_mut(slot as usize) {
            e.fail_next_read = true;
        }
    }

    /// Number of reads served so far, successful or not.
    pub fn reads(&self) -> usize {
        lock(&self.inner).reads
    }
}

impl SlotApi for VirtualSlots {
    fn slot_count(&self) -> u32 {
        lock(&self.inner).slots.len() as u32
    }

    fn is_connected(&self, slot: u32) -> bool {
        lock(&self.inner)
            .slots
            .get(slot as usize)
            .is_some_and(|e| e.connected)
    }

    fn read(&mut self, slot: u32) -> Result<SlotState, DeviceError> {
        let mut inner = lock(&self.inner);
        inner.reads += 1;
        let entry = inner
            .slots
            .get_mut(slot as usize)
            .ok_or(DeviceError::Disconnected)?;
        if !entry.connected {
            return Err(DeviceError::Disconnected);
        }
        if std::mem::take(&mut entry.fail_next_read) {
            return Err(DeviceError::Read(format!("virtual slot {slot} read error")));
        }
        Ok(entry.state)
    }
}

// ---------------------------------------------------------------------------
// Enumerated devices
// ---------------------------------------------------------------------------

struct VirtualJoystick {
    meta: DeviceMeta,
    state: JoystickState,
    acquired: bool,
    fail_acquire: bool,
    fail_reads: bool,
}

#[derive(Default)]
struct DevicesInner {
    devices: Vec<VirtualJoystick>,
    next_id: u64,
    fail_enumeration: bool,
    acquisitions: usize,
    releases: usize,
    live_handles: usize,
}

impl DevicesInner {
    fn find(&mut self, path: &str) -> Option<&mut VirtualJoystick> {
        self.devices.iter_mut().find(|d| d.meta.path == path)
    }
}

/// Virtual enumeration-based joysticks.
#[derive(Clone, Default)]
pub struct VirtualEnumerator {
    inner: Arc<Mutex<DevicesInner>>,
}

impl VirtualEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device named `name`. Returns its path, used to script it.
    pub fn attach(&self, name: &str) -> String {
        let mut inner = lock(&self.inner);
        let path = format!("virtual:{}", inner.next_id);
        inner.next_id += 1;
        inner.devices.push(VirtualJoystick {
            meta: DeviceMeta {
                bus: Some("virtual".into()),
                product_string: Some(name.to_string()),
                usage_page: Some(0x01),
                usage: Some(0x05),
                path: path.clone(),
                ..Default::default()
            },
            state: JoystickState::default(),
            acquired: false,
            fail_acquire: false,
            fail_reads: false,
        });
        path
    }

    /// Detach the device at `path`. Open handles fail on their next refresh.
    pub fn detach(&self, path: &str) {
        lock(&self.inner).devices.retain(|d| d.meta.path != path);
    }

    /// Replace the state the device at `path` reports.
    pub fn set_state(&self, path: &str, state: JoystickState) {
        if let Some(d) = lock(&self.inner).find(path) {
            d.state = state;
        }
    }

    pub fn fail_acquire(&self, path: &str, fail: bool) {
        if let Some(d) = lock(&self.inner).find(path) {
            d.fail_acquire = fail;
        }
    }

    pub fn fail_reads(&self, path: &str, fail: bool) {
        if let Some(d) = lock(&self.inner).find(path) {
            d.fail_reads = fail;
        }
    }

    pub fn fail_enumeration(&self, fail: bool) {
        lock(&self.inner).fail_enumeration = fail;
    }

    /// Successful acquisitions so far.
    pub fn acquisitions(&self) -> usize {
        lock(&self.inner).acquisitions
    }

    /// `unacquire` calls so far.
    pub fn releases(&self) -> usize {
        lock(&self.inner).releases
    }

    /// Handles acquired and not yet dropped.
    pub fn live_handles(&self) -> usize {
        lock(&self.inner).live_handles
    }
}

impl DeviceEnumerator for VirtualEnumerator {
    type Handle = VirtualHandle;

    fn enumerate(&mut self) -> Result<Vec<DeviceMeta>, DeviceError> {
        let inner = lock(&self.inner);
        if inner.fail_enumeration {
            return Err(DeviceError::Enumeration("virtual enumeration error".into()));
        }
        Ok(inner.devices.iter().map(|d| d.meta.clone()).collect())
    }

    fn acquire(
        &mut self,
        device: &DeviceMeta,
        buffer_size: usize,
    ) -> Result<VirtualHandle, DeviceError> {
        let mut inner = lock(&self.inner);
        let fail = |reason: &str| DeviceError::Acquisition {
            device: device.display_name().to_string(),
            reason: reason.to_string(),
        };
        let dev = inner.find(&device.path).ok_or_else(|| fail("not attached"))?;
        if dev.fail_acquire {
            return Err(fail("access denied"));
        }
        if dev.acquired {
            return Err(fail("already acquired"));
        }
        dev.acquired = true;
        inner.acquisitions += 1;
        inner.live_handles += 1;
        Ok(VirtualHandle {
            shared: Arc::clone(&self.inner),
            path: device.path.clone(),
            buffer_size,
            buffered: None,
            acquired: true,
        })
    }
}

/// Handle to one acquired [`VirtualEnumerator`] device.
pub struct VirtualHandle {
    shared: Arc<Mutex<DevicesInner>>,
    path: String,
    buffer_size: usize,
    /// State captured by the last `refresh`.
    buffered: Option<JoystickState>,
    acquired: bool,
}

impl VirtualHandle {
    /// Buffer size requested at acquisition.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn mark_unacquired(&mut self, inner: &mut DevicesInner) {
        if std::mem::take(&mut self.acquired) {
            if let Some(d) = inner.find(&self.path) {
                d.acquired = false;
            }
        }
    }
}

impl DeviceHandle for VirtualHandle {
    fn refresh(&mut self) -> Result<(), DeviceError> {
        if !self.acquired {
            return Err(DeviceError::Read("handle not acquired".into()));
        }
        let mut inner = lock(&self.shared);
        let dev = inner.find(&self.path).ok_or(DeviceError::Disconnected)?;
        if dev.fail_reads {
            return Err(DeviceError::Read(format!("{} read error", self.path)));
        }
        self.buffered = Some(dev.state.clone());
        Ok(())
    }

    fn current_state(&mut self) -> Result<JoystickState, DeviceError> {
        self.buffered
            .clone()
            .ok_or_else(|| DeviceError::Read("no buffered state".into()))
    }

    fn unacquire(&mut self) {
        let shared = Arc::clone(&self.shared);
        let mut inner = lock(&shared);
        if self.acquired {
            inner.releases += 1;
        }
        self.mark_unacquired(&mut inner);
    }
}

impl Drop for VirtualHandle {
    fn drop(&mut self) {
        let shared = Arc::clone(&self.shared);
        let mut inner = lock(&shared);
        self.mark_unacquired(&mut inner);
        inner.live_handles = inner.live_handles.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquisition_is_exclusive() {
        let mut devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let meta = devs.enumerate().unwrap().remove(0);

        let mut h = devs.acquire(&meta, 128).unwrap();
        assert_eq!(h.buffer_size(), 128);
        assert!(matches!(
            devs.acquire(&meta, 128),
            Err(DeviceError::Acquisition { .. })
        ));

        h.unacquire();
        h.unacquire();
        assert_eq!(devs.releases(), 1);
        drop(h);
        assert_eq!(devs.live_handles(), 0);

        let _h2 = devs.acquire(&meta, 16).unwrap();
        assert_eq!(devs.acquisitions(), 2);
        devs.detach(&path);
    }

    #[test]
    fn handle_reads_buffered_state() {
        let mut devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let meta = devs.enumerate().unwrap().remove(0);
        let mut h = devs.acquire(&meta, 8).unwrap();

        assert!(h.current_state().is_err());
        devs.set_state(&path, JoystickState { x: 1, ..Default::default() });
        h.refresh().unwrap();
        devs.set_state(&path, JoystickState { x: 2, ..Default::default() });
        assert_eq!(h.current_state().unwrap().x, 1);

        devs.detach(&path);
        assert!(matches!(h.refresh(), Err(DeviceError::Disconnected)));
    }

    #[test]
    fn unplugged_slot_fails_reads() {
        let mut slots = VirtualSlots::new(2);
        slots.plug(1);
        assert!(slots.read(1).is_ok());
        slots.unplug(1);
        assert!(!slots.is_connected(1));
        assert!(matches!(slots.read(1), Err(DeviceError::Disconnected)));
        assert!(matches!(slots.read(7), Err(DeviceError::Disconnected)));
        assert_eq!(slots.reads(), 3);
    }
}
