pub mod decode;
pub mod layout;
pub mod normalize;
pub mod stream;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use decode::RawSample;
pub use layout::{assemble, assemble_hands};
pub use normalize::{FlexBucket, FlexNormalizer, normalize};
pub use stream::SensorStreams;

/// Number of hands a gesture record carries.
pub const HAND_COUNT: usize = 2;
/// Fingers per hand, thumb included.
pub const FINGER_COUNT: usize = 5;
/// Inter-digital folds per hand.
pub const FOLD_COUNT: usize = 4;
/// Contact slots reserved per finger. The thumb only wires the first one.
pub const CONTACT_SLOTS: usize = 2;
/// 6-axis (accel + mag) sensors per hand.
pub const SIX_AXIS_COUNT: usize = 2;
/// 9-axis (accel + mag + gyro) sensors per hand.
pub const NINE_AXIS_COUNT: usize = 2;

/// Which hand a record belongs to. Index 0 is always the left hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; HAND_COUNT] = [Side::Left, Side::Right];

    pub const fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Finger roles in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerRole {
    Index,
    Middle,
    Ring,
    Pinky,
    Thumb,
}

impl FingerRole {
    pub const ALL: [FingerRole; FINGER_COUNT] = [
        FingerRole::Index,
        FingerRole::Middle,
        FingerRole::Ring,
        FingerRole::Pinky,
        FingerRole::Thumb,
    ];

    pub const fn index(self) -> usize {
        match self {
            FingerRole::Index => 0,
            FingerRole::Middle => 1,
            FingerRole::Ring => 2,
            FingerRole::Pinky => 3,
            FingerRole::Thumb => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FingerRole::Index => "index",
            FingerRole::Middle => "middle",
            FingerRole::Ring => "ring",
            FingerRole::Pinky => "pinky",
            FingerRole::Thumb => "thumb",
        }
    }

    /// Contact slots physically wired on this finger.
    pub const fn contact_slots(self) -> &'static [ContactSlot] {
        match self {
            FingerRole::Thumb => &[ContactSlot::Tip],
            _ => &[ContactSlot::Tip, ContactSlot::Mid],
        }
    }

    /// The thumb carries no flex sensor.
    pub const fn has_flex(self) -> bool {
        !matches!(self, FingerRole::Thumb)
    }
}

/// Inter-digital folds in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoldRole {
    ThumbIndex,
    IndexMiddle,
    MiddleRing,
    RingPinky,
}

impl FoldRole {
    pub const ALL: [FoldRole; FOLD_COUNT] = [
        FoldRole::ThumbIndex,
        FoldRole::IndexMiddle,
        FoldRole::MiddleRing,
        FoldRole::RingPinky,
    ];

    pub const fn index(self) -> usize {
        match self {
            FoldRole::ThumbIndex => 0,
            FoldRole::IndexMiddle => 1,
            FoldRole::MiddleRing => 2,
            FoldRole::RingPinky => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FoldRole::ThumbIndex => "thumb-index",
            FoldRole::IndexMiddle => "index-middle",
            FoldRole::MiddleRing => "middle-ring",
            FoldRole::RingPinky => "ring-pinky",
        }
    }
}

/// Contact positions along a finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactSlot {
    Tip,
    Mid,
}

impl ContactSlot {
    pub const fn index(self) -> usize {
        match self {
            ContactSlot::Tip => 0,
            ContactSlot::Mid => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ContactSlot::Tip => "contact-tip",
            ContactSlot::Mid => "contact-mid",
        }
    }
}

/// Mounting position of an inertial sensor on the back of the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mount {
    Top,
    Bottom,
}

impl Mount {
    pub const ALL: [Mount; 2] = [Mount::Top, Mount::Bottom];

    pub const fn index(self) -> usize {
        match self {
            Mount::Top => 0,
            Mount::Bottom => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Mount::Top => "top",
            Mount::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// Three components of one physical quantity, in the firmware's integer-scaled units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn get_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

impl fmt::Display for Axes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Finger {
    /// Raw flex count. Always zero on the thumb.
    pub flex: u32,
    /// Indexed by [`ContactSlot::index`]. `true` means contact.
    pub contact: [bool; CONTACT_SLOTS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fold {
    pub contact: bool,
}

/// Accelerometer + magnetometer sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SixAxisReading {
    pub accel: Axes,
    pub mag: Axes,
}

/// Accelerometer + magnetometer + gyrometer sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NineAxisReading {
    pub accel: Axes,
    pub mag: Axes,
    pub gyro: Axes,
}

/// Everything read from one glove during one cycle.
///
/// `Default` is the zero-initialized record every cycle starts from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandRecord {
    /// Indexed by [`FingerRole::index`].
    pub fingers: [Finger; FINGER_COUNT],
    /// Indexed by [`FoldRole::index`].
    pub folds: [Fold; FOLD_COUNT],
    /// Indexed by [`Mount::index`].
    pub six_axis: [SixAxisReading; SIX_AXIS_COUNT],
    /// Indexed by [`Mount::index`].
    pub nine_axis: [NineAxisReading; NINE_AXIS_COUNT],
}

impl HandRecord {
    pub fn finger(&self, role: FingerRole) -> &Finger {
        &self.fingers[role.index()]
    }

    pub fn fold(&self, role: FoldRole) -> &Fold {
        &self.folds[role.index()]
    }
}

impl fmt::Display for HandRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flex")?;
        for role in FingerRole::ALL.into_iter().filter(|r| r.has_flex()) {
            write!(f, " {}={}", role.name(), self.finger(role).flex)?;
        }
        write!(f, "; contact")?;
        for role in FingerRole::ALL {
            let finger = self.finger(role);
            write!(f, " {}=", role.name())?;
            for slot in role.contact_slots() {
                write!(f, "{}", u8::from(finger.contact[slot.index()]))?;
            }
        }
        write!(f, "; fold")?;
        for role in FoldRole::ALL {
            write!(f, " {}={}", role.name(), u8::from(self.fold(role).contact))?;
        }
        for mount in Mount::ALL {
            let six = &self.six_axis[mount.index()];
            write!(f, "; lsm303 {} accel={} mag={}", mount.name(), six.accel, six.mag)?;
        }
        for mount in Mount::ALL {
            let nine = &self.nine_axis[mount.index()];
            write!(
                f,
                "; lsm9dof {} accel={} mag={} gyro={}",
                mount.name(),
                nine.accel,
                nine.mag,
                nine.gyro
            )?;
        }
        Ok(())
    }
}

/// Bus connectivity over one cycle. Once disconnected, stays so until the cycle ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleStatus {
    pub connected: bool,
}

impl CycleStatus {
    pub const fn connected() -> Self {
        Self { connected: true }
    }

    pub const fn disconnected() -> Self {
        Self { connected: false }
    }

    pub fn mark_disconnected(&mut self) {
        self.connected = false;
    }

    pub const fn as_str(self) -> &'static str {
        if self.connected {
            "connected"
        } else {
            "disconnected"
        }
    }
}

impl Default for CycleStatus {
    fn default() -> Self {
        Self::connected()
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The finished result of one cycle, as handed to the serializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gesture {
    /// Indexed by [`Side::index`].
    pub hands: [HandRecord; HAND_COUNT],
    /// Normalized flex buckets, indexed by side then finger.
    pub flex: [[FlexBucket; FINGER_COUNT]; HAND_COUNT],
    pub status: CycleStatus,
}

impl Gesture {
    pub fn new(
        hands: [HandRecord; HAND_COUNT],
        status: CycleStatus,
        normalizer: &FlexNormalizer,
    ) -> Self {
        let flex = hands.map(|hand| hand.fingers.map(|finger| normalizer.normalize(finger.flex)));
        Self {
            hands,
            flex,
            status,
        }
    }

    pub fn hand(&self, side: Side) -> &HandRecord {
        &self.hands[side.index()]
    }

    pub fn flex(&self, side: Side, finger: FingerRole) -> FlexBucket {
        self.flex[side.index()][finger.index()]
    }
}
