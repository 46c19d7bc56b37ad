#![cfg(feature = "virtual")]

use padnav::backends::virtual_input::{VirtualEnumerator, VirtualSlots};
use padnav::state::{buttons, JoystickState, SlotState};
use padnav::{Gamepad, InputConfig, InputFrame, PollResult, Source};

fn rig() -> (VirtualSlots, VirtualEnumerator, Gamepad) {
    let slots = VirtualSlots::new(4);
    let devices = VirtualEnumerator::new();
    let pad = Gamepad::from_collaborators(slots.clone(), devices.clone(), &InputConfig::default());
    (slots, devices, pad)
}

#[test]
fn slot_backend_wins_when_both_are_connected() {
    let (slots, devices, mut pad) = rig();
    slots.plug(0);
    slots.set(
        0,
        SlotState {
            buttons: buttons::A,
            ..Default::default()
        },
    );
    let path = devices.attach("Generic Pad");
    devices.set_state(
        &path,
        JoystickState {
            buttons: vec![false, false, true],
            ..Default::default()
        },
    );

    let r = pad.poll();
    assert_eq!(r.source, Some(Source::Slot(0)));
    assert_eq!(
        r.frame,
        InputFrame {
            a: true,
            ..InputFrame::EMPTY
        }
    );
    // The fallback was never touched while the slot answered.
    assert_eq!(devices.acquisitions(), 0);
}

#[test]
fn nothing_connected_returns_empty_frame() {
    let (_slots, _devices, mut pad) = rig();
    for _ in 0..3 {
        let r = pad.poll();
        assert_eq!(r, PollResult::disconnected());
        assert_eq!(r.identifier(), None);
    }
}

#[test]
fn falls_back_to_joystick_and_back_again() {
    let (slots, devices, mut pad) = rig();
    let path = devices.attach("Arcade Stick");

    let r = pad.poll();
    assert_eq!(r.source, Some(Source::Device("Arcade Stick".into())));
    assert_eq!(r.identifier().as_deref(), Some("Arcade Stick"));

    devices.set_state(
        &path,
        JoystickState {
            povs: vec![18000],
            ..Default::default()
        },
    );
    assert!(pad.poll().frame.down);

    slots.plug(2);
    let r = pad.poll();
    assert_eq!(r.source, Some(Source::Slot(2)));
    assert_eq!(pad.active_source(), Some(&Source::Slot(2)));

    slots.unplug(2);
    assert_eq!(pad.poll().source, Some(Source::Device("Arcade Stick".into())));
}

#[test]
fn switching_backends_does_not_leak_edges() {
    let (slots, devices, mut pad) = rig();
    let path = devices.attach("Pad");
    devices.set_state(
        &path,
        JoystickState {
            x: 1000,
            ..Default::default()
        },
    );
    assert!(pad.poll().frame.left);

    // Slot takes over holding nothing: no left from the joystick's history.
    slots.plug(0);
    assert!(pad.poll().frame.is_empty());

    // Slot drops out and the joystick answers in the same tick. It kept its
    // own snapshot while idle, so the held left does not fire again.
    slots.unplug(0);
    let r = pad.poll();
    assert_eq!(r.source, Some(Source::Device("Pad".into())));
    assert!(!r.frame.left);
    assert_eq!(devices.acquisitions(), 1);
}

#[test]
fn joystick_lost_mid_session_recovers_next_tick() {
    let (_slots, devices, mut pad) = rig();
    let path = devices.attach("Pad");
    assert!(pad.poll().is_connected());

    devices.fail_reads(&path, true);
    assert!(!pad.poll().is_connected());
    assert_eq!(devices.releases(), 1);
    assert_eq!(devices.live_handles(), 0);

    devices.fail_reads(&path, false);
    assert!(pad.poll().is_connected());
    assert_eq!(devices.acquisitions(), 2);
}

#[test]
fn shutdown_is_idempotent_and_releases_joystick() {
    let (_slots, devices, mut pad) = rig();
    devices.attach("Pad");
    pad.poll();
    assert_eq!(devices.live_handles(), 1);

    pad.shutdown();
    pad.shutdown();
    assert_eq!(devices.live_handles(), 0);
    assert_eq!(devices.releases(), 1);

    drop(pad);
    assert_eq!(devices.releases(), 1);
}

#[test]
fn poll_after_shutdown_reconnects() {
    let (slots, _devices, mut pad) = rig();
    slots.plug(0);
    pad.poll();
    pad.shutdown();
    assert_eq!(pad.active_source(), None);
    assert!(pad.poll().is_connected());
}
