//! Enumeration-based poller.
//!
//! Enumerates attached joystick/gamepad devices, acquires the first one and
//! reads it through a [`DeviceHandle`]. Per tick:
//!
//! 1. `refresh` the handle's buffer, then take `current_state`
//! 2. buttons: configured positions, pressed now and not before
//! 3. directions: hat edge OR stick edge
//!    - hat: exact `0 / 9000 / 18000 / 27000` only; anything else is no direction
//!    - stick: `x < low` left, `x > high` right, `y < low` up, `y > high` down
//!
//! Any error while refreshing or reading unacquires and drops the handle, and
//! discards the snapshot.

use super::{Backend, PollResult, Source};
use crate::config::DeviceConfig;
use crate::device::{DeviceEnumerator, DeviceHandle};
use crate::error::DeviceError;
use crate::frame::{rising, Directions, InputFrame};
use crate::metadata::DeviceMeta;
use crate::state::JoystickState;
use tracing::{debug, info, warn};

/// Backend over a [`DeviceEnumerator`].
pub struct DevicePoller<E: DeviceEnumerator> {
    enumerator: E,
    config: DeviceConfig,
    /// Acquired handle, `Some` while connected.
    handle: Option<E::Handle>,
    /// Device `handle` was acquired from.
    device: Option<DeviceMeta>,
    prev: Option<JoystickState>,
}

impl<E: DeviceEnumerator> DevicePoller<E> {
    pub fn new(enumerator: E, config: &DeviceConfig) -> Self {
        Self {
            enumerator,
            config: config.clone(),
            handle: None,
            device: None,
            prev: None,
        }
    }

    /// Metadata of the bound device.
    #[inline]
    pub fn device(&self) -> Option<&DeviceMeta> {
        self.device.as_ref()
    }

    /// Access the collaborator (used by hosts that script virtual devices).
    #[inline]
    pub fn enumerator(&self) -> &E {
        &self.enumerator
    }

    fn try_connect(&mut self) -> Result<(), DeviceError> {
        let devices = self.enumerator.enumerate()?;
        let first = devices.into_iter().next().ok_or(DeviceError::NoDevice)?;
        let handle = self.enumerator.acquire(&first, self.config.buffer_size)?;
        info!(device = %first, "joystick acquired");
        self.handle = Some(handle);
        self.device = Some(first);
        Ok(())
    }

    fn read(&mut self) -> Result<JoystickState, DeviceError> {
        let handle = self.handle.as_mut().ok_or(DeviceError::Disconnected)?;
        handle.refresh()?;
        handle.current_state()
    }

    fn translate(&self, now: &JoystickState) -> InputFrame {
        let prev = self.prev.as_ref();
        let map = self.config.buttons;
        let pressed = |idx: usize| rising(now.button(idx), prev.map(|p| p.button(idx)));

        let (low, high) = (self.config.low_threshold, self.config.high_threshold);
        let hat = Directions::edges(now.hat(), prev.map(JoystickState::hat));
        let stick = Directions::edges(now.stick(low, high), prev.map(|p| p.stick(low, high)));
        let dir = hat.or(stick);

        InputFrame {
            left: dir.left,
            right: dir.right,
            up: dir.up,
            down: dir.down,
            a: pressed(map.a),
            b: pressed(map.b),
            start: pressed(map.start),
            back: pressed(map.back),
        }
    }
}

impl<E: DeviceEnumerator> Backend for DevicePoller<E> {
    fn kind(&self) -> &'static str {
        "enumerated"
    }

    fn ensure_connected(&mut self) -> bool {
        self.release();
        match self.try_connect() {
            Ok(()) => true,
            Err(DeviceError::NoDevice) => false,
            Err(e) => {
                // Repeats every tick while the device stays unusable.
                debug!(error = %e, "joystick unavailable");
                false
            }
        }
    }

    fn poll(&mut self) -> PollResult {
        if self.handle.is_none() && !self.ensure_connected() {
            return PollResult::disconnected();
        }

        match self.read() {
            Ok(now) => {
                let frame = self.translate(&now);
                let name = self
                    .device
                    .as_ref()
                    .map(|d| d.display_name().to_string())
                    .unwrap_or_default();
                if !frame.is_empty() {
                    debug!(device = %name, pressed = ?frame.pressed(), "joystick frame");
                }
                self.prev = Some(now);
                PollResult::connected(Source::Device(name), frame)
            }
            Err(e) => {
                warn!(error = %e, "joystick lost");
                self.release();
                PollResult::disconnected()
            }
        }
    }

    fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.unacquire();
            drop(handle);
            if let Some(dev) = &self.device {
                debug!(device = %dev, "joystick released");
            }
        }
        self.device = None;
        self.prev = None;
    }

    fn is_connected(&self) -> bool {
        self.handle.is_some()
    }
}

impl<E: DeviceEnumerator> Drop for DevicePoller<E> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(all(test, feature = "virtual"))]
mod tests {
    use super::*;
    use crate::backends::virtual_input::VirtualEnumerator;
    use crate::state::POV_CENTERED;

    fn poller(devs: &VirtualEnumerator) -> DevicePoller<VirtualEnumerator> {
        DevicePoller::new(devs.clone(), &DeviceConfig::default())
    }

    fn axis(x: u16, y: u16) -> JoystickState {
        JoystickState {
            x,
            y,
            ..Default::default()
        }
    }

    fn hat(v: u32) -> JoystickState {
        JoystickState {
            povs: vec![v],
            ..Default::default()
        }
    }

    fn buttons(on: &[usize]) -> JoystickState {
        let mut b = vec![false; 12];
        for &i in on {
            b[i] = true;
        }
        JoystickState {
            buttons: b,
            ..Default::default()
        }
    }

    #[test]
    fn nothing_attached_stays_disconnected() {
        let devs = VirtualEnumerator::new();
        let mut p = poller(&devs);
        assert_eq!(p.poll(), PollResult::disconnected());
        assert_eq!(devs.acquisitions(), 0);
    }

    #[test]
    fn binds_first_enumerated_device() {
        let devs = VirtualEnumerator::new();
        devs.attach("Flight Stick");
        devs.attach("Pad");
        let mut p = poller(&devs);
        let r = p.poll();
        assert_eq!(r.source, Some(Source::Device("Flight Stick".into())));
        assert_eq!(p.device().map(|d| d.display_name()), Some("Flight Stick"));
    }

    #[test]
    fn unsigned_axis_scenario() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let mut p = poller(&devs);

        devs.set_state(&path, axis(10000, 32767));
        assert!(p.poll().frame.left);

        devs.set_state(&path, axis(10000, 32767));
        assert!(!p.poll().frame.left);

        devs.set_state(&path, axis(32767, 32767));
        assert!(!p.poll().frame.any_direction());

        devs.set_state(&path, axis(45000, 32767));
        assert!(p.poll().frame.right);
    }

    #[test]
    fn thresholds_are_strict() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let mut p = poller(&devs);

        devs.set_state(&path, axis(24000, 42000));
        assert!(p.poll().frame.is_empty());

        devs.set_state(&path, axis(23999, 42001));
        let f = p.poll().frame;
        assert!(f.left && f.down);

        devs.set_state(&path, axis(42001, 23999));
        let f = p.poll().frame;
        assert!(f.right && f.up);
    }

    #[test]
    fn hat_cardinals_fire_and_others_do_not() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let mut p = poller(&devs);

        for (value, expect) in [
            (0, "up"),
            (9000, "right"),
            (18000, "down"),
            (27000, "left"),
        ] {
            devs.set_state(&path, hat(value));
            assert_eq!(p.poll().frame.pressed(), vec![expect], "pov {value}");
            devs.set_state(&path, hat(POV_CENTERED));
            assert!(p.poll().frame.is_empty());
        }

        for value in [4500, 13500, 22500, 31500, 35999, POV_CENTERED] {
            devs.set_state(&path, hat(value));
            assert!(p.poll().frame.is_empty(), "pov {value}");
        }
    }

    #[test]
    fn hat_held_does_not_repeat() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let mut p = poller(&devs);

        devs.set_state(&path, hat(9000));
        assert!(p.poll().frame.right);
        assert!(!p.poll().frame.right);
        // Moving to a diagonal and back counts as a new press.
        devs.set_state(&path, hat(4500));
        assert!(p.poll().frame.is_empty());
        devs.set_state(&path, hat(9000));
        assert!(p.poll().frame.right);
    }

    #[test]
    fn hat_and_stick_together_fire_one_edge() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let mut p = poller(&devs);
        p.poll();

        devs.set_state(
            &path,
            JoystickState {
                x: 1000,
                povs: vec![27000],
                ..Default::default()
            },
        );
        assert_eq!(p.poll().frame.pressed(), vec!["left"]);
        assert!(p.poll().frame.is_empty());
    }

    #[test]
    fn default_button_positions() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let mut p = poller(&devs);

        devs.set_state(&path, buttons(&[1, 2, 8, 9]));
        let f = p.poll().frame;
        assert!(f.a && f.b && f.back && f.start);

        devs.set_state(&path, buttons(&[0, 3, 4, 5]));
        assert!(p.poll().frame.is_empty());
    }

    #[test]
    fn short_button_list_reads_released() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let mut p = poller(&devs);

        devs.set_state(
            &path,
            JoystickState {
                buttons: vec![true, true],
                ..Default::default()
            },
        );
        let f = p.poll().frame;
        assert!(f.a);
        assert!(!f.b && !f.start && !f.back);
    }

    #[test]
    fn custom_button_map() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let mut cfg = DeviceConfig::default();
        cfg.buttons.a = 0;
        let mut p = DevicePoller::new(devs.clone(), &cfg);

        devs.set_state(&path, buttons(&[0]));
        assert!(p.poll().frame.a);
    }

    #[test]
    fn read_failure_releases_handle_once() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let mut p = poller(&devs);
        assert!(p.poll().is_connected());
        assert_eq!(devs.acquisitions(), 1);

        devs.fail_reads(&path, true);
        let r = p.poll();
        assert!(!r.is_connected());
        assert!(r.frame.is_empty());
        assert!(!p.is_connected());
        assert_eq!(devs.releases(), 1);

        p.release();
        assert_eq!(devs.releases(), 1);
        assert_eq!(devs.live_handles(), 0);
    }

    #[test]
    fn acquisition_failure_holds_nothing() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        devs.fail_acquire(&path, true);
        let mut p = poller(&devs);

        assert!(!p.poll().is_connected());
        assert!(!p.is_connected());
        assert_eq!(devs.live_handles(), 0);

        devs.fail_acquire(&path, false);
        assert!(p.poll().is_connected());
        assert_eq!(devs.live_handles(), 1);
    }

    #[test]
    fn enumeration_failure_is_not_connected() {
        let devs = VirtualEnumerator::new();
        devs.attach("Pad");
        devs.fail_enumeration(true);
        let mut p = poller(&devs);
        assert!(!p.poll().is_connected());

        devs.fail_enumeration(false);
        assert!(p.poll().is_connected());
    }

    #[test]
    fn unplug_and_replug_starts_clean() {
        let devs = VirtualEnumerator::new();
        let path = devs.attach("Pad");
        let mut p = poller(&devs);

        devs.set_state(&path, buttons(&[1]));
        assert!(p.poll().frame.a);

        devs.detach(&path);
        assert!(!p.poll().is_connected());
        assert!(!p.poll().is_connected());

        // Re-attached with nothing held: no edge from the reconnect itself.
        let path = devs.attach("Pad");
        let r = p.poll();
        assert!(r.is_connected());
        assert!(r.frame.is_empty());

        devs.set_state(&path, buttons(&[1]));
        assert!(p.poll().frame.a);
        assert_eq!(devs.acquisitions(), 2);
        assert_eq!(devs.releases(), 1);
    }

    #[test]
    fn drop_unacquires() {
        let devs = VirtualEnumerator::new();
        devs.attach("Pad");
        {
            let mut p = poller(&devs);
            p.poll();
            assert_eq!(devs.live_handles(), 1);
        }
        assert_eq!(devs.live_handles(), 0);
        assert_eq!(devs.releases(), 1);
    }
}
