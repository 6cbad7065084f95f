use super::decode::DecodeError;
use super::schema::{FieldDef, ParamType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PackValue {
    Float(f64),
    Unsigned(u64),
    Signed(i64),
}

impl PackValue {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Float(v) => v,
            Self::Unsigned(v) => v as f64,
            Self::Signed(v) => v as f64,
        }
    }

    pub fn as_u64(self) -> Option<u64> {
        match self {
            Self::Unsigned(v) => Some(v),
            Self::Signed(v) => u64::try_from(v).ok(),
            Self::Float(_) => None,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Signed(v) => Some(v),
            Self::Unsigned(v) => i64::try_from(v).ok(),
            Self::Float(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PackError {
    #[error("value {value} out of range for {field}.{param}")]
    Range {
        field: String,
        param: String,
        value: f64,
    },
    #[error("pack mismatch in {field}: {detail}")]
    Mismatch { field: String, detail: String },
}

impl PackError {
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }
}

enum EncodeFailure {
    Range,
    Mismatch,
}

/// Little-endian datagram builder.
///
/// Raw writes go straight to the buffer. Between [`Packer::begin`] and
/// [`Packer::end`] values are checked against the field's declared
/// parameters; the first failure is latched and reported by `end`.
#[derive(Debug, Default)]
pub struct Packer<'a> {
    buf: Vec<u8>,
    field: Option<&'a FieldDef>,
    next_param: usize,
    error: Option<PackError>,
}

impl<'a> Packer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn raw_pack_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn raw_pack_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn raw_pack_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn raw_pack_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn begin(&mut self, field: &'a FieldDef) {
        self.field = Some(field);
        self.next_param = 0;
    }

    pub fn had_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn had_range_error(&self) -> bool {
        self.error.as_ref().is_some_and(PackError::is_range)
    }

    pub fn push_f64(&mut self, value: f64) {
        self.push(PackValue::Float(value));
    }

    pub fn push_u64(&mut self, value: u64) {
        self.push(PackValue::Unsigned(value));
    }

    pub fn push_i64(&mut self, value: i64) {
        self.push(PackValue::Signed(value));
    }

    pub fn push(&mut self, value: PackValue) {
        if self.error.is_some() {
            return;
        }
        let Some(field) = self.field else {
            self.error = Some(PackError::Mismatch {
                field: String::new(),
                detail: "value pushed before begin".into(),
            });
            return;
        };
        let Some(param) = field.params.get(self.next_param) else {
            self.error = Some(PackError::Mismatch {
                field: field.name.clone(),
                detail: format!("more than {} values pushed", field.params.len()),
            });
            return;
        };
        self.next_param += 1;

        match encode(&mut self.buf, param.ty, value) {
            Ok(()) => {}
            Err(EncodeFailure::Range) => {
                self.error = Some(PackError::Range {
                    field: field.name.clone(),
                    param: param.name.clone(),
                    value: value.as_f64(),
                });
            }
            Err(EncodeFailure::Mismatch) => {
                self.error = Some(PackError::Mismatch {
                    field: field.name.clone(),
                    detail: format!("{value:?} does not fit {}: {:?}", param.name, param.ty),
                });
            }
        }
    }

    pub fn end(self) -> Result<Vec<u8>, PackError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        match self.field {
            Some(field) if self.next_param != field.params.len() => Err(PackError::Mismatch {
                field: field.name.clone(),
                detail: format!("{} of {} values pushed", self.next_param, field.params.len()),
            }),
            _ => Ok(self.buf),
        }
    }
}

fn scale(value: f64, divisor: u16, modulus: Option<f64>) -> f64 {
    let value = modulus.map_or(value, |m| value.rem_euclid(m));
    (value * f64::from(divisor) + 0.5).floor()
}

fn scaled_integer(
    value: PackValue,
    divisor: u16,
    modulus: Option<f64>,
) -> Result<f64, EncodeFailure> {
    match value {
        PackValue::Float(v) => Ok(scale(v, divisor, modulus)),
        PackValue::Signed(v) if modulus.is_none() => v
            .checked_mul(i64::from(divisor))
            .map(|v| v as f64)
            .ok_or(EncodeFailure::Range),
        PackValue::Unsigned(v) if modulus.is_none() => v
            .checked_mul(u64::from(divisor))
            .map(|v| v as f64)
            .ok_or(EncodeFailure::Range),
        other => Ok(scale(other.as_f64(), divisor, modulus)),
    }
}

fn encode(buf: &mut Vec<u8>, ty: ParamType, value: PackValue) -> Result<(), EncodeFailure> {
    match ty {
        ParamType::Int16 { divisor, modulus } => {
            let scaled = scaled_integer(value, divisor, modulus)?;
            if !(f64::from(i16::MIN)..=f64::from(i16::MAX)).contains(&scaled) {
                return Err(EncodeFailure::Range);
            }
            buf.extend_from_slice(&(scaled as i16).to_le_bytes());
        }
        ParamType::Int32 { divisor, modulus } => {
            let scaled = scaled_integer(value, divisor, modulus)?;
            if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&scaled) {
                return Err(EncodeFailure::Range);
            }
            buf.extend_from_slice(&(scaled as i32).to_le_bytes());
        }
        ParamType::Uint32 => {
            let raw = match value {
                PackValue::Float(_) => return Err(EncodeFailure::Mismatch),
                other => other
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or(EncodeFailure::Range)?,
            };
            buf.extend_from_slice(&raw.to_le_bytes());
        }
        ParamType::Uint64 => {
            let raw = match value {
                PackValue::Float(_) => return Err(EncodeFailure::Mismatch),
                other => other.as_u64().ok_or(EncodeFailure::Range)?,
            };
            buf.extend_from_slice(&raw.to_le_bytes());
        }
        ParamType::Float32 => {
            let v = value.as_f64();
            if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                return Err(EncodeFailure::Range);
            }
            buf.extend_from_slice(&(v as f32).to_le_bytes());
        }
        ParamType::Float64 => {
            buf.extend_from_slice(&value.as_f64().to_le_bytes());
        }
    }
    Ok(())
}

#[derive(Debug)]
pub struct Unpacker<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Unpacker<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.offset + N;
        let bytes = self
            .data
            .get(self.offset..end)
            .ok_or(DecodeError::Truncated {
                offset: self.offset,
                needed: N,
            })?;
        self.offset = end;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn raw_unpack_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn raw_unpack_u16(&mut self) -> Result<u16, DecodeError> {
        self.take().map(u16::from_le_bytes)
    }

    pub fn raw_unpack_u32(&mut self) -> Result<u32, DecodeError> {
        self.take().map(u32::from_le_bytes)
    }

    pub fn raw_unpack_u64(&mut self) -> Result<u64, DecodeError> {
        self.take().map(u64::from_le_bytes)
    }

    pub fn unpack_param(&mut self, ty: ParamType) -> Result<PackValue, DecodeError> {
        let value = match ty {
            ParamType::Int16 { divisor, .. } => {
                let raw = i16::from_le_bytes(self.take()?);
                if ty.is_scaled() {
                    PackValue::Float(f64::from(raw) / f64::from(divisor))
                } else {
                    PackValue::Signed(i64::from(raw))
                }
            }
            ParamType::Int32 { divisor, .. } => {
                let raw = i32::from_le_bytes(self.take()?);
                if ty.is_scaled() {
                    PackValue::Float(f64::from(raw) / f64::from(divisor))
                } else {
                    PackValue::Signed(i64::from(raw))
                }
            }
            ParamType::Uint32 => PackValue::Unsigned(u64::from(self.raw_unpack_u32()?)),
            ParamType::Uint64 => PackValue::Unsigned(self.raw_unpack_u64()?),
            ParamType::Float32 => PackValue::Float(f64::from(f32::from_le_bytes(self.take()?))),
            ParamType::Float64 => PackValue::Float(f64::from_le_bytes(self.take()?)),
        };
        Ok(value)
    }

    pub fn unpack_field(&mut self, field: &FieldDef) -> Result<Vec<PackValue>, DecodeError> {
        field
            .params
            .iter()
            .map(|param| self.unpack_param(param.ty))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::schema::{FieldRegistry, FieldSchema, Param};

    fn field(params: Vec<Param>) -> FieldDef {
        FieldDef {
            name: "setTest".into(),
            number: 1,
            params,
        }
    }

    #[test]
    fn scaled_int16_rounds_half_up() {
        let def = field(vec![Param::new("x", FieldRegistry::POSITION)]);
        let mut packer = Packer::new();
        packer.begin(&def);
        packer.push_f64(12.34);
        let bytes = packer.end().unwrap();
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 123);

        let mut packer = Packer::new();
        packer.begin(&def);
        packer.push_f64(0.25);
        let bytes = packer.end().unwrap();
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 3);

        let mut packer = Packer::new();
        packer.begin(&def);
        packer.push_f64(-0.25);
        let bytes = packer.end().unwrap();
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), -2);
    }

    #[test]
    fn angles_wrap_before_scaling() {
        let def = field(vec![Param::new("h", FieldRegistry::ANGLE)]);
        let mut packer = Packer::new();
        packer.begin(&def);
        packer.push_f64(-90.0);
        let bytes = packer.end().unwrap();
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 2700);

        let mut packer = Packer::new();
        packer.begin(&def);
        packer.push_f64(7200.5);
        assert!(packer.end().is_ok());
    }

    #[test]
    fn out_of_range_position_is_latched() {
        let def = field(vec![
            Param::new("x", FieldRegistry::POSITION),
            Param::new("y", FieldRegistry::POSITION),
        ]);
        let mut packer = Packer::new();
        packer.begin(&def);
        packer.push_f64(5000.0);
        assert!(packer.had_range_error());
        packer.push_f64(1.0);

        match packer.end() {
            Err(PackError::Range { param, value, .. }) => {
                assert_eq!(param, "x");
                assert_eq!(value, 5000.0);
            }
            other => panic!("expected range error, got {other:?}"),
        }
    }

    #[test]
    fn count_and_type_mismatches() {
        let def = field(vec![
            Param::new("l", ParamType::Uint64),
            Param::new("timestamp", ParamType::INT16),
        ]);

        let mut packer = Packer::new();
        packer.begin(&def);
        packer.push_u64(4);
        assert!(matches!(packer.end(), Err(PackError::Mismatch { .. })));

        let mut packer = Packer::new();
        packer.begin(&def);
        packer.push_f64(4.0);
        packer.push_i64(0);
        let err = packer.end().unwrap_err();
        assert!(!err.is_range());

        let mut packer = Packer::new();
        packer.begin(&def);
        packer.push_u64(4);
        packer.push_i64(0);
        packer.push_i64(0);
        assert!(matches!(packer.end(), Err(PackError::Mismatch { .. })));
    }

    #[test]
    fn unpack_mirrors_declared_layout() {
        let registry = FieldRegistry::smooth_node(0);
        let def = registry.field_by_name("setSmXYH").unwrap();

        let mut packer = Packer::new();
        packer.raw_pack_u16(0xBEEF);
        packer.begin(def);
        packer.push_f64(1.5);
        packer.push_f64(-2.25);
        packer.push_f64(370.0);
        packer.push_i64(-123);
        let bytes = packer.end().unwrap();

        let mut unpacker = Unpacker::new(&bytes);
        assert_eq!(unpacker.raw_unpack_u16().unwrap(), 0xBEEF);
        let values = unpacker.unpack_field(def).unwrap();
        assert_eq!(values[0], PackValue::Float(1.5));
        assert_eq!(values[1], PackValue::Float(-2.2));
        assert_eq!(values[2], PackValue::Float(10.0));
        assert_eq!(values[3], PackValue::Signed(-123));
        assert_eq!(unpacker.remaining(), 0);
    }

    #[test]
    fn truncated_input() {
        let mut unpacker = Unpacker::new(&[1, 2, 3]);
        assert!(unpacker.raw_unpack_u16().is_ok());
        assert!(matches!(
            unpacker.raw_unpack_u32(),
            Err(DecodeError::Truncated { offset: 2, needed: 4 })
        ));
    }
}
