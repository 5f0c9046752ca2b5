use core::fmt;

use hashbrown::HashMap;

use crate::types::{Type, Vars};

/// A literal too large for a one-byte immediate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Int(i32),
    Real(f32),
}

impl Constant {
    /// Dedup key: reals compare by bit pattern so `-0.0` and `0.0` stay apart.
    fn key(self) -> (bool, u32) {
        match self {
            Constant::Int(v) => (false, v as u32),
            Constant::Real(v) => (true, v.to_bits()),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Real(v) => write!(f, "{:?}", v),
        }
    }
}

/// Append-only pool of constants, addressed by a one-byte index.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
    index: HashMap<(bool, u32), u8>,
}

impl ConstantPool {
    pub const MAX_ENTRIES: usize = 256;

    /// Add `constant` (or reuse an identical entry) and return its index.
    ///
    /// Returns `None` once the pool is full.
    pub fn add(&mut self, constant: Constant) -> Option<u8> {
        if let Some(&existing) = self.index.get(&constant.key()) {
            return Some(existing);
        }
        let index: u8 = self.entries.len().try_into().ok()?;
        self.entries.push(constant);
        self.index.insert(constant.key(), index);
        Some(index)
    }

    pub fn get(&self, index: u8) -> Option<Constant> {
        self.entries.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.entries.iter()
    }

    /// Forget every entry added after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        for constant in self.entries.drain(len.min(self.entries.len())..) {
            self.index.remove(&constant.key());
        }
    }
}

/// A compiled function.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    /// Offset of the first instruction after the `Fnctn` marker.
    pub offset: usize,
    /// Declared parameter types, in call order. `void` entries take an
    /// argument but bind no slot.
    pub params: Vec<Type>,
    /// Parameters first, then locals in declaration order.
    pub vars: Vars,
    /// `None` while the return type is still being inferred.
    pub ret: Option<Type>,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Functions in declaration order, with a name index.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: Vec<Function>,
    by_name: HashMap<String, usize>,
}

impl FunctionTable {
    /// Add a function, returning its index, or `None` if the name is taken.
    pub fn declare(&mut self, function: Function) -> Option<usize> {
        if self.by_name.contains_key(&function.name) {
            return None;
        }
        let index = self.functions.len();
        self.by_name.insert(function.name.clone(), index);
        self.functions.push(function);
        Some(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn lookup(&self, name: &str) -> Option<&Function> {
        self.index_of(name).map(|i| &self.functions[i])
    }

    pub fn get(&self, index: usize) -> Option<&Function> {
        self.functions.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Function> {
        self.functions.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }
}

/// Output of the compiler and the only thing the VM reads.
#[derive(Debug, Clone, Default)]
pub struct Code {
    pub bytes: Vec<u8>,
    pub functions: FunctionTable,
    pub constants: ConstantPool,
    /// First byte offset of every statement, numbered across the whole program.
    pub lines: Vec<usize>,
}

impl Code {
    pub fn new() -> Self {
        Self::default()
    }
}
