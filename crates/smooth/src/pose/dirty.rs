use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::POSE_COMPONENTS;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFields: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
        const H = 1 << 3;
        const P = 1 << 4;
        const R = 1 << 5;
    }
}

impl DirtyFields {
    pub const XY: Self = Self::X.union(Self::Y);
    pub const XZ: Self = Self::X.union(Self::Z);
    pub const POS: Self = Self::XY.union(Self::Z);
    pub const HPR: Self = Self::H.union(Self::P).union(Self::R);
    pub const XYH: Self = Self::XY.union(Self::H);
    pub const XYZH: Self = Self::POS.union(Self::H);

    #[inline]
    pub const fn component(index: usize) -> Self {
        Self::from_bits_retain(1 << index)
    }

    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..POSE_COMPONENTS).filter(move |&i| self.contains(Self::component(i)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageShape {
    Stop,
    H,
    Z,
    Xy,
    Xz,
    Pos,
    Hpr,
    Xyh,
    Xyzh,
    PosHpr,
    PosHprL,
}

impl MessageShape {
    pub const ALL: [MessageShape; 11] = [
        Self::Stop,
        Self::H,
        Self::Z,
        Self::Xy,
        Self::Xz,
        Self::Pos,
        Self::Hpr,
        Self::Xyh,
        Self::Xyzh,
        Self::PosHpr,
        Self::PosHprL,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            Self::Stop => "setSmStop",
            Self::H => "setSmH",
            Self::Z => "setSmZ",
            Self::Xy => "setSmXY",
            Self::Xz => "setSmXZ",
            Self::Pos => "setSmPos",
            Self::Hpr => "setSmHpr",
            Self::Xyh => "setSmXYH",
            Self::Xyzh => "setSmXYZH",
            Self::PosHpr => "setSmPosHpr",
            Self::PosHprL => "setSmPosHprL",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shape| shape.field_name() == name)
    }

    pub fn carried(self) -> DirtyFields {
        match self {
            Self::Stop => DirtyFields::empty(),
            Self::H => DirtyFields::H,
            Self::Z => DirtyFields::Z,
            Self::Xy => DirtyFields::XY,
            Self::Xz => DirtyFields::XZ,
            Self::Pos => DirtyFields::POS,
            Self::Hpr => DirtyFields::HPR,
            Self::Xyh => DirtyFields::XYH,
            Self::Xyzh => DirtyFields::XYZH,
            Self::PosHpr | Self::PosHprL => DirtyFields::all(),
        }
    }

    pub fn carries_location(self) -> bool {
        matches!(self, Self::PosHprL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BroadcastVariant {
    #[default]
    Full,
    Xyh,
    Xy,
}

// Order is significant: the first exact match wins.
const FULL_RULES: [(DirtyFields, MessageShape); 8] = [
    (DirtyFields::H, MessageShape::H),
    (DirtyFields::Z, MessageShape::Z),
    (DirtyFields::XY, MessageShape::Xy),
    (DirtyFields::XZ, MessageShape::Xz),
    (DirtyFields::POS, MessageShape::Pos),
    (DirtyFields::HPR, MessageShape::Hpr),
    (DirtyFields::XYH, MessageShape::Xyh),
    (DirtyFields::XYZH, MessageShape::Xyzh),
];

const XYH_RULES: [(DirtyFields, MessageShape); 2] = [
    (DirtyFields::H, MessageShape::H),
    (DirtyFields::XY, MessageShape::Xy),
];

impl BroadcastVariant {
    pub fn watched(self) -> DirtyFields {
        match self {
            Self::Full => DirtyFields::all(),
            Self::Xyh => DirtyFields::XYH,
            Self::Xy => DirtyFields::XY,
        }
    }

    pub fn tracks_location(self) -> bool {
        matches!(self, Self::Full)
    }

    fn rules(self) -> &'static [(DirtyFields, MessageShape)] {
        match self {
            Self::Full => &FULL_RULES,
            Self::Xyh => &XYH_RULES,
            Self::Xy => &[],
        }
    }

    fn fallback(self) -> MessageShape {
        match self {
            Self::Full => MessageShape::PosHpr,
            Self::Xyh => MessageShape::Xyh,
            Self::Xy => MessageShape::Xy,
        }
    }

    /// Shape for a non-empty dirty set. Empty sets are the stop/suppress
    /// branch and are resolved by the caller.
    pub fn select(self, dirty: DirtyFields) -> MessageShape {
        self.rules()
            .iter()
            .find(|(mask, _)| *mask == dirty)
            .map(|&(_, shape)| shape)
            .unwrap_or_else(|| self.fallback())
    }
}
