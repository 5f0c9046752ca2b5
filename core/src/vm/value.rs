//! Runtime values and the array arena.

use core::fmt;

use super::error::RuntimeError;
use crate::types::Scalar;

/// Handle to an array in the [`ArrayArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayRef(u32);

impl ArrayRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A value on the operand stack or in a variable slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i32),
    Real(f32),
    Array(ArrayRef),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl Value {
    /// Integer payload, for operands that must be integers (slots, indices,
    /// lengths, statement numbers).
    pub fn as_int(self, what: &'static str) -> Result<i32, RuntimeError> {
        match self {
            Value::Int(value) => Ok(value),
            _ => Err(RuntimeError::InvalidOperand(what)),
        }
    }

    /// The value reinterpreted as a plain integer, as deferred conditions
    /// compare them.
    pub fn raw(self) -> i64 {
        match self {
            Value::Int(value) => value as i64,
            Value::Real(value) => value.to_bits() as i64,
            Value::Array(array) => array.index() as i64,
        }
    }

    /// Integers wrap; any real operand makes the result real.
    pub fn plus(self, other: Value) -> Result<Value, RuntimeError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
            (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a + b)),
            (Value::Real(a), Value::Int(b)) => Ok(Value::Real(a + b as f32)),
            (Value::Int(a), Value::Real(b)) => Ok(Value::Real(a as f32 + b)),
            _ => Err(RuntimeError::InvalidOperand("arithmetic on an array")),
        }
    }

    pub fn minus(self, other: Value) -> Result<Value, RuntimeError> {
        let negated = match other {
            Value::Int(b) => Value::Int(b.wrapping_neg()),
            Value::Real(b) => Value::Real(-b),
            Value::Array(_) => return Err(RuntimeError::InvalidOperand("arithmetic on an array")),
        };
        self.plus(negated)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Real(value) => write!(f, "{:?}", value),
            Value::Array(array) => write!(f, "<array {}>", array.0),
        }
    }
}

// ============================================================================
// Arena
// ============================================================================

/// Number of cells in a freshly allocated array.
pub const INITIAL_ARRAY_LEN: usize = 16;

/// A heap array. Cells are 32 bits wide; real arrays store bit patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub element: Scalar,
    pub cells: Vec<i32>,
}

impl Array {
    fn load(&self, cell: i32) -> Value {
        match self.element {
            Scalar::Real => Value::Real(f32::from_bits(cell as u32)),
            Scalar::Int | Scalar::Char => Value::Int(cell),
        }
    }

    fn store(&self, value: Value) -> Result<i32, RuntimeError> {
        Ok(match (self.element, value) {
            (Scalar::Real, Value::Real(v)) => v.to_bits() as i32,
            (Scalar::Real, Value::Int(v)) => (v as f32).to_bits() as i32,
            (_, Value::Int(v)) => v,
            (_, Value::Real(v)) => v as i32,
            (_, Value::Array(_)) => {
                return Err(RuntimeError::InvalidOperand("array stored in an array"));
            }
        })
    }

    fn offset(&self, index: i32) -> Result<usize, RuntimeError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.cells.len())
            .ok_or(RuntimeError::IndexOutOfBounds {
                index,
                len: self.cells.len(),
            })
    }
}

/// Owner of every array a program allocates.
///
/// Arrays are referenced by [`ArrayRef`] handles held in variable slots.
/// Nothing is freed before the program halts; at that point the VM releases
/// each array exactly once.
#[derive(Debug, Default)]
pub struct ArrayArena {
    arrays: Vec<Option<Array>>,
}

impl ArrayArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, element: Scalar, cells: Vec<i32>) -> ArrayRef {
        let handle = ArrayRef(self.arrays.len() as u32);
        self.arrays.push(Some(Array { element, cells }));
        handle
    }

    pub fn get(&self, array: ArrayRef) -> Result<&Array, RuntimeError> {
        self.arrays
            .get(array.index())
            .and_then(Option::as_ref)
            .ok_or(RuntimeError::NotAnArray)
    }

    fn get_mut(&mut self, array: ArrayRef) -> Result<&mut Array, RuntimeError> {
        self.arrays
            .get_mut(array.index())
            .and_then(Option::as_mut)
            .ok_or(RuntimeError::NotAnArray)
    }

    pub fn read(&self, array: ArrayRef, index: i32) -> Result<Value, RuntimeError> {
        let array = self.get(array)?;
        let offset = array.offset(index)?;
        Ok(array.load(array.cells[offset]))
    }

    pub fn write(&mut self, array: ArrayRef, index: i32, value: Value) -> Result<(), RuntimeError> {
        let array = self.get_mut(array)?;
        let offset = array.offset(index)?;
        let cell = array.store(value)?;
        array.cells[offset] = cell;
        Ok(())
    }

    /// Set the length, zero-filling new cells.
    pub fn resize(&mut self, array: ArrayRef, len: i32) -> Result<(), RuntimeError> {
        let len = usize::try_from(len).map_err(|_| RuntimeError::InvalidLength(len))?;
        self.get_mut(array)?.cells.resize(len, 0);
        Ok(())
    }

    /// Number of arrays not yet released.
    pub fn live(&self) -> usize {
        self.arrays.iter().filter(|a| a.is_some()).count()
    }

    /// Free one array. Returns false if it was already released.
    pub fn release(&mut self, array: ArrayRef) -> bool {
        self.arrays
            .get_mut(array.index())
            .and_then(Option::take)
            .is_some()
    }

    /// Free everything still live and return how many arrays that was.
    pub fn release_all(&mut self) -> usize {
        let live = self.live();
        self.arrays.clear();
        live
    }
}
