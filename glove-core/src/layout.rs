//! Where each stream position lands in a [`HandRecord`].
//!
//! The peer has no per-value addressing, so these tables are the only thing
//! tying a stream index to a finger, fold, sensor or axis. Stream index `i`
//! maps to entry `i` of the matching table.

use crate::stream::{AXIS_LEN, CONTACT_LEN, FLEX_LEN};
use crate::{
    Axis, ContactSlot, FOLD_COUNT, FingerRole, FoldRole, HAND_COUNT, HandRecord, Mount,
    NINE_AXIS_COUNT, SIX_AXIS_COUNT, SensorStreams, Side,
};

/// Destination of one contact stream value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactTarget {
    Finger(FingerRole, ContactSlot),
    Fold(FoldRole),
}

pub const FLEX_LAYOUT: [FingerRole; FLEX_LEN] = [
    FingerRole::Index,
    FingerRole::Middle,
    FingerRole::Ring,
    FingerRole::Pinky,
];

/// Finger contacts first (tip then mid, thumb tip only), then one per fold.
pub const CONTACT_LAYOUT: [ContactTarget; CONTACT_LEN] = [
    ContactTarget::Finger(FingerRole::Index, ContactSlot::Tip),
    ContactTarget::Finger(FingerRole::Index, ContactSlot::Mid),
    ContactTarget::Finger(FingerRole::Middle, ContactSlot::Tip),
    ContactTarget::Finger(FingerRole::Middle, ContactSlot::Mid),
    ContactTarget::Finger(FingerRole::Ring, ContactSlot::Tip),
    ContactTarget::Finger(FingerRole::Ring, ContactSlot::Mid),
    ContactTarget::Finger(FingerRole::Pinky, ContactSlot::Tip),
    ContactTarget::Finger(FingerRole::Pinky, ContactSlot::Mid),
    ContactTarget::Finger(FingerRole::Thumb, ContactSlot::Tip),
    ContactTarget::Fold(FoldRole::ThumbIndex),
    ContactTarget::Fold(FoldRole::IndexMiddle),
    ContactTarget::Fold(FoldRole::MiddleRing),
    ContactTarget::Fold(FoldRole::RingPinky),
];

/// Per-axis-across-instances: both mounts' X, then both Y, then both Z.
///
/// Shared by every accel/mag/gyro stream of both sensor families.
pub const AXIS_LAYOUT: [(Mount, Axis); AXIS_LEN] = [
    (Mount::Top, Axis::X),
    (Mount::Bottom, Axis::X),
    (Mount::Top, Axis::Y),
    (Mount::Bottom, Axis::Y),
    (Mount::Top, Axis::Z),
    (Mount::Bottom, Axis::Z),
];

const fn wired_contact_slots() -> usize {
    let mut total = FOLD_COUNT;
    let mut i = 0;
    while i < FingerRole::ALL.len() {
        total += FingerRole::ALL[i].contact_slots().len();
        i += 1;
    }
    total
}

const fn flex_fingers() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < FingerRole::ALL.len() {
        if FingerRole::ALL[i].has_flex() {
            total += 1;
        }
        i += 1;
    }
    total
}

const _: () = assert!(wired_contact_slots() == CONTACT_LEN);
const _: () = assert!(flex_fingers() == FLEX_LEN);
const _: () = assert!(SIX_AXIS_COUNT == NINE_AXIS_COUNT);
const _: () = assert!(Mount::ALL.len() == SIX_AXIS_COUNT);

/// Populates a zero-initialized record from one glove's streams.
pub fn assemble(streams: &SensorStreams) -> HandRecord {
    let mut hand = HandRecord::default();

    for (value, role) in streams.flex.iter().zip(FLEX_LAYOUT) {
        hand.fingers[role.index()].flex = *value;
    }

    for (value, target) in streams.contacts.iter().zip(CONTACT_LAYOUT) {
        match target {
            ContactTarget::Finger(role, slot) => {
                hand.fingers[role.index()].contact[slot.index()] = *value;
            }
            ContactTarget::Fold(role) => hand.folds[role.index()].contact = *value,
        }
    }

    for (i, (mount, axis)) in AXIS_LAYOUT.into_iter().enumerate() {
        let six = &mut hand.six_axis[mount.index()];
        *six.accel.get_mut(axis) = streams.six_axis_accel[i];
        *six.mag.get_mut(axis) = streams.six_axis_mag[i];

        let nine = &mut hand.nine_axis[mount.index()];
        *nine.accel.get_mut(axis) = streams.nine_axis_accel[i];
        *nine.mag.get_mut(axis) = streams.nine_axis_mag[i];
        *nine.gyro.get_mut(axis) = streams.nine_axis_gyro[i];
    }

    hand
}

/// Runs [`assemble`] once per side, indexed by [`Side::index`].
pub fn assemble_hands(streams: &[SensorStreams; HAND_COUNT]) -> [HandRecord; HAND_COUNT] {
    Side::ALL.map(|side| assemble(&streams[side.index()]))
}
