use serde::{Deserialize, Serialize};

use super::packer::Packer;
use crate::pose::{MessageShape, Pose};

pub const CLIENT_OBJECT_UPDATE_FIELD: u16 = 24;
pub const STATESERVER_OBJECT_UPDATE_FIELD: u16 = 2004;

pub const AUTHORITATIVE_RECIPIENT_COUNT: u8 = 1;

pub const CLIENT_HEADER_LEN: usize = 2 + 4 + 2;
pub const AUTHORITATIVE_HEADER_LEN: usize = 1 + 8 + 8 + CLIENT_HEADER_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    Authoritative,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingMode {
    Authoritative { sender_channel: u64 },
    Client,
}

impl RoutingMode {
    pub fn kind(&self) -> HeaderKind {
        match self {
            Self::Authoritative { .. } => HeaderKind::Authoritative,
            Self::Client => HeaderKind::Client,
        }
    }

    pub fn header_len(&self) -> usize {
        match self {
            Self::Authoritative { .. } => AUTHORITATIVE_HEADER_LEN,
            Self::Client => CLIENT_HEADER_LEN,
        }
    }

    pub fn write_header(&self, packer: &mut Packer, do_id: u32, field_number: u16) {
        match *self {
            Self::Authoritative { sender_channel } => {
                packer.raw_pack_u8(AUTHORITATIVE_RECIPIENT_COUNT);
                packer.raw_pack_u64(u64::from(do_id));
                packer.raw_pack_u64(sender_channel);
                packer.raw_pack_u16(STATESERVER_OBJECT_UPDATE_FIELD);
            }
            Self::Client => {
                packer.raw_pack_u16(CLIENT_OBJECT_UPDATE_FIELD);
            }
        }
        packer.raw_pack_u32(do_id);
        packer.raw_pack_u16(field_number);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothMessage {
    pub shape: MessageShape,
    pub pose: Pose,
    pub location: Option<u64>,
}

impl SmoothMessage {
    pub fn new(shape: MessageShape, pose: Pose, location: u64) -> Self {
        Self {
            shape,
            pose,
            location: shape.carries_location().then_some(location),
        }
    }

    pub fn stop() -> Self {
        Self {
            shape: MessageShape::Stop,
            pose: Pose::ZERO,
            location: None,
        }
    }

    pub fn components(&self) -> impl Iterator<Item = f32> + '_ {
        self.shape.carried().indices().map(|i| self.pose.component(i))
    }

    pub fn apply_to(&self, pose: &mut Pose) {
        for i in self.shape.carried().indices() {
            pose.set_component(i, self.pose.component(i));
        }
    }
}
