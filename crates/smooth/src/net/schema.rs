use std::collections::HashMap;

use crate::pose::MessageShape;

/// Wire representation of one declared field parameter.
///
/// Scaled integer types store `floor(value * divisor + 0.5)`. When a modulus
/// is present the value is first wrapped into `[0, modulus)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamType {
    Int16 { divisor: u16, modulus: Option<f64> },
    Int32 { divisor: u16, modulus: Option<f64> },
    Uint32,
    Uint64,
    Float32,
    Float64,
}

impl ParamType {
    pub const INT16: Self = Self::Int16 {
        divisor: 1,
        modulus: None,
    };

    pub fn size(&self) -> usize {
        match self {
            Self::Int16 { .. } => 2,
            Self::Int32 { .. } | Self::Uint32 | Self::Float32 => 4,
            Self::Uint64 | Self::Float64 => 8,
        }
    }

    pub fn is_scaled(&self) -> bool {
        match self {
            Self::Int16 { divisor, modulus } | Self::Int32 { divisor, modulus } => {
                *divisor != 1 || modulus.is_some()
            }
            Self::Float32 | Self::Float64 => true,
            Self::Uint32 | Self::Uint64 => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: ParamType,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub number: u16,
    pub params: Vec<Param>,
}

impl FieldDef {
    pub fn payload_len(&self) -> usize {
        self.params.iter().map(|p| p.ty.size()).sum()
    }
}

pub trait FieldSchema {
    fn field_by_name(&self, name: &str) -> Option<&FieldDef>;
    fn field_by_number(&self, number: u16) -> Option<&FieldDef>;
}

#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Vec<FieldDef>,
    by_name: HashMap<String, usize>,
    by_number: HashMap<u16, usize>,
}

impl FieldRegistry {
    pub const POSITION: ParamType = ParamType::Int16 {
        divisor: 10,
        modulus: None,
    };
    pub const ANGLE: ParamType = ParamType::Int16 {
        divisor: 10,
        modulus: Some(360.0),
    };
    pub const LOCATION: ParamType = ParamType::Uint64;
    pub const TIMESTAMP: ParamType = ParamType::INT16;

    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the smooth-node update fields with consecutive numbers
    /// starting at `first_number`, in [`MessageShape::ALL`] order.
    pub fn smooth_node(first_number: u16) -> Self {
        const NAMES: [&str; 6] = ["x", "y", "z", "h", "p", "r"];

        let mut registry = Self::new();
        for (offset, shape) in (0u16..).zip(MessageShape::ALL) {
            let mut params: Vec<Param> = shape
                .carried()
                .indices()
                .map(|i| {
                    let ty = if i < 3 { Self::POSITION } else { Self::ANGLE };
                    Param::new(NAMES[i], ty)
                })
                .collect();
            if shape.carries_location() {
                params.push(Param::new("l", Self::LOCATION));
            }
            params.push(Param::new("timestamp", Self::TIMESTAMP));

            registry.declare(shape.field_name(), first_number + offset, params);
        }
        registry
    }

    pub fn declare(&mut self, name: impl Into<String>, number: u16, params: Vec<Param>) {
        let name = name.into();
        if let Some(&index) = self.by_name.get(&name) {
            self.by_number.remove(&self.fields[index].number);
            self.fields[index] = FieldDef {
                name,
                number,
                params,
            };
            self.by_number.insert(number, index);
            return;
        }

        let index = self.fields.len();
        self.by_name.insert(name.clone(), index);
        self.by_number.insert(number, index);
        self.fields.push(FieldDef {
            name,
            number,
            params,
        });
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldDef> {
        let index = self.by_name.remove(name)?;
        let removed = self.fields.remove(index);
        self.by_number.remove(&removed.number);
        self.reindex();
        Some(removed)
    }

    fn reindex(&mut self) {
        self.by_name.clear();
        self.by_number.clear();
        for (index, field) in self.fields.iter().enumerate() {
            self.by_name.insert(field.name.clone(), index);
            self.by_number.insert(field.number, index);
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldSchema for FieldRegistry {
    fn field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    fn field_by_number(&self, number: u16) -> Option<&FieldDef> {
        self.by_number.get(&number).map(|&i| &self.fields[i])
    }
}
