use super::packer::{PackValue, Unpacker};
use super::protocol::{
    CLIENT_OBJECT_UPDATE_FIELD, HeaderKind, STATESERVER_OBJECT_UPDATE_FIELD, SmoothMessage,
};
use super::schema::FieldSchema;
use crate::pose::{MessageShape, Pose};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("datagram truncated at byte {offset} (needed {needed} more)")]
    Truncated { offset: usize, needed: usize },
    #[error("authoritative header names no recipients")]
    NoRecipients,
    #[error("unexpected opcode {0}")]
    UnexpectedOpcode(u16),
    #[error("unknown field number {0}")]
    UnknownField(u16),
    #[error("field {0} is not a smooth-node update")]
    NotSmoothField(String),
    #[error("malformed value for {field}.{param}")]
    BadValue { field: String, param: String },
    #[error("{0} trailing bytes after field")]
    TrailingBytes(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub channels: Option<(u64, u64)>,
    pub do_id: u32,
    pub field_number: u16,
    pub message: SmoothMessage,
    pub timestamp: i32,
}

impl FieldUpdate {
    pub fn decode(
        data: &[u8],
        kind: HeaderKind,
        schema: &dyn FieldSchema,
    ) -> Result<Self, DecodeError> {
        let mut unpacker = Unpacker::new(data);

        let (channels, expected_opcode) = match kind {
            HeaderKind::Authoritative => {
                let count = unpacker.raw_unpack_u8()?;
                if count == 0 {
                    return Err(DecodeError::NoRecipients);
                }
                let recipient = unpacker.raw_unpack_u64()?;
                // Extra recipients are skipped; updates address one object.
                for _ in 1..count {
                    unpacker.raw_unpack_u64()?;
                }
                let sender = unpacker.raw_unpack_u64()?;
                (Some((recipient, sender)), STATESERVER_OBJECT_UPDATE_FIELD)
            }
            HeaderKind::Client => (None, CLIENT_OBJECT_UPDATE_FIELD),
        };

        let opcode = unpacker.raw_unpack_u16()?;
        if opcode != expected_opcode {
            return Err(DecodeError::UnexpectedOpcode(opcode));
        }
        let do_id = unpacker.raw_unpack_u32()?;
        let field_number = unpacker.raw_unpack_u16()?;

        let field = schema
            .field_by_number(field_number)
            .ok_or(DecodeError::UnknownField(field_number))?;
        let shape = MessageShape::from_field_name(&field.name)
            .ok_or_else(|| DecodeError::NotSmoothField(field.name.clone()))?;

        let values = unpacker.unpack_field(field)?;
        if unpacker.remaining() > 0 {
            return Err(DecodeError::TrailingBytes(unpacker.remaining()));
        }

        let bad_value = |index: usize| DecodeError::BadValue {
            field: field.name.clone(),
            param: field
                .params
                .get(index)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
        };

        let carried: Vec<usize> = shape.carried().indices().collect();
        let expected = carried.len() + usize::from(shape.carries_location()) + 1;
        if values.len() != expected {
            return Err(bad_value(values.len().min(expected)));
        }

        let mut pose = Pose::ZERO;
        for (slot, &index) in carried.iter().enumerate() {
            pose.set_component(index, values[slot].as_f64() as f32);
        }

        let mut next = carried.len();
        let location = if shape.carries_location() {
            let location = values[next].as_u64().ok_or_else(|| bad_value(next))?;
            next += 1;
            Some(location)
        } else {
            None
        };

        let timestamp = match values[next] {
            PackValue::Float(_) => None,
            other => other.as_i64().and_then(|t| i32::try_from(t).ok()),
        }
        .ok_or_else(|| bad_value(next))?;

        Ok(Self {
            channels,
            do_id,
            field_number,
            message: SmoothMessage {
                shape,
                pose,
                location,
            },
            timestamp,
        })
    }
}
