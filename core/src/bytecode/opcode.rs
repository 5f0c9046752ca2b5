//! Opcode bytes shared by the compiler and the VM.
//!
//! # Encoding
//!
//! Every instruction starts with one opcode byte. Operands follow inline:
//!
//! - `u8` operands are single bytes (immediates, slot numbers, pool indices);
//! - string operands are NUL-terminated byte runs and must be scanned.
//!
//! Instructions that take their inputs from the operand stack have no inline
//! operands at all. Stack effect notation: `[..., a, b] -> [..., result]`.

use core::fmt;

/// Which outcome of the comparison makes a deferred condition fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Equal,
    NotEqual,
}

/// What happens to a deferred condition still pending when its function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obligation {
    /// Silently dropped.
    Optional,
    /// Broken: fatal.
    Promise,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // ========================================================================
    // Program structure (0x00 - 0x04)
    // ========================================================================
    /// Stop execution.
    ///
    /// Zero bytes halt instead of running garbage.
    Halt = 0x00,

    /// Greeting text, checked by the gate before anything else runs.
    /// Operand: str
    Beg = 0x01,

    /// Function marker, a no-op at run time.
    /// Operand: str
    Fnctn = 0x02,

    /// Call a function by name. `print` is handled by the VM itself.
    /// Operand: str
    Call = 0x03,

    /// Return from a function call.
    /// Stack: [..., result] -> [..., result]
    Ret = 0x04,

    // ========================================================================
    // Values & variables (0x05 - 0x0A)
    // ========================================================================
    /// Push constant from pool.
    /// Operand: u8 index | Stack: [...] -> [..., value]
    Const = 0x05,

    /// Push an unsigned byte as an integer.
    /// Operand: u8 value | Stack: [...] -> [..., int]
    PushImm = 0x06,

    /// Push a variable.
    /// Operand: u8 slot | Stack: [...] -> [..., value]
    Push = 0x07,

    /// Store into a variable.
    /// Operand: u8 slot | Stack: [..., value] -> [...]
    Pop = 0x08,

    /// Set a variable to a small integer.
    /// Operands: u8 slot, u8 value
    SetVar = 0x09,

    /// Discard the top of the stack.
    /// Stack: [..., value] -> [...]
    Drop = 0x0A,

    // ========================================================================
    // Arithmetic (0x10 - 0x13)
    // ========================================================================
    /// Stack: [..., a] -> [..., a + 1]
    Inc = 0x10,
    /// Stack: [..., a] -> [..., a - 1]
    Dec = 0x11,
    /// Stack: [..., a, b] -> [..., a + b]
    Add = 0x12,
    /// Stack: [..., a, b] -> [..., a - b]
    Sub = 0x13,

    // ========================================================================
    // Arrays (0x20 - 0x24)
    // ========================================================================
    /// Allocate a fresh 16-cell array into a variable.
    /// Operands: u8 slot, u8 element kind
    NewArray = 0x20,

    /// Resize the array held by a variable.
    /// Stack: [..., len, slot] -> [...]
    SetLen = 0x21,

    /// Stack: [..., slot, index, value] -> [...]
    SetIndex = 0x22,

    /// Stack: [..., slot, index] -> [..., cell]
    PushIndex = 0x23,

    /// Stack: [..., slot] -> [..., len]
    PushLen = 0x24,

    /// Read one line from the input into a new character array.
    /// Stack: [...] -> [..., array]
    Input = 0x28,

    // ========================================================================
    // Jumps (0x30 - 0x36)
    // ========================================================================
    /// Jump to the start of a statement, by statement number.
    /// Stack: [..., statement] -> [...]
    Jump = 0x30,

    /// Like `Jump`, pushing a return address first.
    /// Stack: [..., statement] -> [...]
    JumpSub = 0x31,

    /// Jump to an absolute offset.
    /// Operand: u8 offset
    JumpImm = 0x32,

    /// Jump to an absolute offset stored in the constant pool.
    /// Operand: u8 index
    JumpConst = 0x33,

    /// Operand: u8 offset
    JumpSubImm = 0x34,

    /// Operand: u8 index
    JumpSubConst = 0x35,

    /// Return from a `JumpSub*`.
    RetSub = 0x36,

    // ========================================================================
    // Deferred conditions (0x40 - 0x43)
    // ========================================================================
    // All four register a record resuming at the instruction that follows them,
    // then skip that instruction.
    // Stack: [..., left, right, mode] -> [...]
    /// Fires when `left == right`; optional.
    When = 0x40,
    /// Fires when `left != right`; optional.
    WhenNot = 0x41,
    /// Fires when `left == right`; must fire before the function returns.
    Promise = 0x42,
    /// Fires when `left != right`; must fire before the function returns.
    PromiseNot = 0x43,
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        use Opcode::*;
        Some(match byte {
            0x00 => Halt,
            0x01 => Beg,
            0x02 => Fnctn,
            0x03 => Call,
            0x04 => Ret,
            0x05 => Const,
            0x06 => PushImm,
            0x07 => Push,
            0x08 => Pop,
            0x09 => SetVar,
            0x0A => Drop,
            0x10 => Inc,
            0x11 => Dec,
            0x12 => Add,
            0x13 => Sub,
            0x20 => NewArray,
            0x21 => SetLen,
            0x22 => SetIndex,
            0x23 => PushIndex,
            0x24 => PushLen,
            0x28 => Input,
            0x30 => Jump,
            0x31 => JumpSub,
            0x32 => JumpImm,
            0x33 => JumpConst,
            0x34 => JumpSubImm,
            0x35 => JumpSubConst,
            0x36 => RetSub,
            0x40 => When,
            0x41 => WhenNot,
            0x42 => Promise,
            0x43 => PromiseNot,
            _ => return None,
        })
    }

    /// The opcode registering a deferred condition of the given kind.
    pub fn deferral(polarity: Polarity, obligation: Obligation) -> Self {
        match (polarity, obligation) {
            (Polarity::Equal, Obligation::Optional) => Opcode::When,
            (Polarity::NotEqual, Obligation::Optional) => Opcode::WhenNot,
            (Polarity::Equal, Obligation::Promise) => Opcode::Promise,
            (Polarity::NotEqual, Obligation::Promise) => Opcode::PromiseNot,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Halt => "HALT",
            Beg => "BEG",
            Fnctn => "FNCTN",
            Call => "CALL",
            Ret => "RET",
            Const => "CONST",
            PushImm => "PUSHI",
            Push => "PUSH",
            Pop => "POP",
            SetVar => "SETVAR",
            Drop => "DROP",
            Inc => "INC",
            Dec => "DEC",
            Add => "ADD",
            Sub => "SUB",
            NewArray => "NEWARR",
            SetLen => "SETLEN",
            SetIndex => "SETIDX",
            PushIndex => "PUSHIDX",
            PushLen => "PUSHLEN",
            Input => "INPUT",
            Jump => "JMP",
            JumpSub => "JMPS",
            JumpImm => "JMPI",
            JumpConst => "JMPC",
            JumpSubImm => "JMPSI",
            JumpSubConst => "JMPSC",
            RetSub => "RETS",
            When => "WHEN",
            WhenNot => "WHENNOT",
            Promise => "PROMISE",
            PromiseNot => "PROMISENOT",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
