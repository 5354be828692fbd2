use serde::{Deserialize, Serialize};

use crate::{Axis, FINGER_COUNT, FOLD_COUNT, SIX_AXIS_COUNT};

/// Flex sensors read per glove: every finger but the thumb.
pub const FLEX_LEN: usize = FINGER_COUNT - 1;
/// Contact sensors read per glove: 4 fingers x 2, thumb x 1, folds x 1.
pub const CONTACT_LEN: usize = 13;
/// Values per axis-type stream: one per axis per sensor instance.
pub const AXIS_LEN: usize = Axis::ALL.len() * SIX_AXIS_COUNT;

const _: () = assert!(CONTACT_LEN == 4 * 2 + 1 + FOLD_COUNT);

/// Decoded values for one glove for one cycle, in wire order.
///
/// Position is the only addressing; see [`crate::layout`] for what each
/// position means.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorStreams {
    pub flex: [u32; FLEX_LEN],
    pub contacts: [bool; CONTACT_LEN],
    pub six_axis_accel: [f64; AXIS_LEN],
    pub six_axis_mag: [f64; AXIS_LEN],
    pub nine_axis_accel: [f64; AXIS_LEN],
    pub nine_axis_mag: [f64; AXIS_LEN],
    pub nine_axis_gyro: [f64; AXIS_LEN],
}
