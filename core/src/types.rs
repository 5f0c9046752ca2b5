//! Static types and per-function variable tables.
//!
//! The language has three scalar types, arrays of each, and `void`. Every type
//! has a small numeric tag; array tags are the scalar tag plus two, which is why
//! the scalar `char` is tagged 6 rather than 3.

use core::fmt;

use hashbrown::HashMap;

/// Maximum number of variable slots a single function may declare.
pub const MAX_VARIABLES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Int,
    Real,
    Char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Scalar(Scalar),
    Array(Scalar),
}

impl Scalar {
    pub fn tag(self) -> u8 {
        match self {
            Scalar::Int => 0,
            Scalar::Real => 1,
            Scalar::Char => 6,
        }
    }

    /// Array element kind as encoded in `NewArray` instructions.
    pub fn kind(self) -> u8 {
        match self {
            Scalar::Int => 0,
            Scalar::Real => 1,
            Scalar::Char => 3,
        }
    }

    pub fn from_kind(kind: u8) -> Option<Scalar> {
        match kind {
            0 => Some(Scalar::Int),
            1 => Some(Scalar::Real),
            3 => Some(Scalar::Char),
            _ => None,
        }
    }
}

impl Type {
    pub const INT: Type = Type::Scalar(Scalar::Int);
    pub const REAL: Type = Type::Scalar(Scalar::Real);
    pub const CHAR: Type = Type::Scalar(Scalar::Char);

    pub fn tag(self) -> u8 {
        match self {
            Type::Void => 4,
            Type::Scalar(scalar) => scalar.tag(),
            Type::Array(scalar) => scalar.kind() + 2,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn element(self) -> Option<Scalar> {
        match self {
            Type::Array(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Whether a slot of type `self` may hold a value of type `value`.
    ///
    /// Integers widen into `char`; nothing else converts implicitly.
    pub fn accepts(self, value: Type) -> bool {
        self == value || (self == Type::CHAR && value == Type::INT)
    }

    /// Whether the `print` intrinsic can output a value of this type.
    pub fn is_printable(self) -> bool {
        matches!(
            self,
            Type::Scalar(Scalar::Int | Scalar::Char) | Type::Array(Scalar::Int | Scalar::Char)
        )
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scalar::Int => "int",
            Scalar::Real => "float",
            Scalar::Char => "char",
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Scalar(scalar) => write!(f, "{}", scalar),
            Type::Array(scalar) => write!(f, "[{}]", scalar),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarsError {
    Duplicate,
    Full,
}

/// Ordered variable slots of one function: parameters first, then locals.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    slots: Vec<Variable>,
    by_name: HashMap<String, u8>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next slot for `name`.
    pub fn declare(&mut self, name: &str, ty: Type) -> Result<u8, VarsError> {
        if self.by_name.contains_key(name) {
            return Err(VarsError::Duplicate);
        }
        let slot: u8 = self
            .slots
            .len()
            .try_into()
            .map_err(|_| VarsError::Full)?;
        self.slots.push(Variable {
            name: name.to_string(),
            ty,
        });
        self.by_name.insert(name.to_string(), slot);
        Ok(slot)
    }

    pub fn lookup(&self, name: &str) -> Option<(u8, Type)> {
        let slot = *self.by_name.get(name)?;
        Some((slot, self.slots[slot as usize].ty))
    }

    pub fn get(&self, slot: u8) -> Option<&Variable> {
        self.slots.get(slot as usize)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every slot declared after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        for var in self.slots.drain(len.min(self.slots.len())..) {
            self.by_name.remove(&var.name);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.slots.iter()
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
