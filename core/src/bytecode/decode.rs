use thiserror::Error;

use super::{Code, Obligation, Opcode, Polarity};

/// One decoded instruction. String operands borrow from the byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    Halt,
    Beg(&'a str),
    Fnctn(&'a str),
    Call(&'a str),
    Ret,
    Const(u8),
    PushImm(u8),
    Push(u8),
    Pop(u8),
    SetVar { slot: u8, value: u8 },
    Drop,
    Inc,
    Dec,
    Add,
    Sub,
    NewArray { slot: u8, kind: u8 },
    SetLen,
    SetIndex,
    PushIndex,
    PushLen,
    Input,
    Jump,
    JumpSub,
    JumpImm(u8),
    JumpConst(u8),
    JumpSubImm(u8),
    JumpSubConst(u8),
    RetSub,
    Defer {
        polarity: Polarity,
        obligation: Obligation,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown instruction {byte:#04x} at offset {offset}")]
    UnknownOpcode { offset: usize, byte: u8 },
    #[error("instruction at offset {offset} is cut short")]
    Truncated { offset: usize },
    #[error("string operand at offset {offset} is not valid UTF-8")]
    InvalidString { offset: usize },
}

impl Code {
    /// Decode the instruction at `offset`, returning it with the offset of the
    /// instruction after it.
    pub fn decode(&self, offset: usize) -> Result<(Instruction<'_>, usize), DecodeError> {
        let bytes = &self.bytes;
        let byte = *bytes.get(offset).ok_or(DecodeError::Truncated { offset })?;
        let op = Opcode::from_byte(byte).ok_or(DecodeError::UnknownOpcode { offset, byte })?;

        let operand = |n: usize| -> Result<u8, DecodeError> {
            bytes
                .get(offset + n)
                .copied()
                .ok_or(DecodeError::Truncated { offset })
        };
        let string = || string_operand(bytes, offset);

        use Instruction as I;
        let decoded = match op {
            Opcode::Halt => (I::Halt, offset + 1),
            Opcode::Beg => {
                let (text, next) = string()?;
                (I::Beg(text), next)
            }
            Opcode::Fnctn => {
                let (name, next) = string()?;
                (I::Fnctn(name), next)
            }
            Opcode::Call => {
                let (name, next) = string()?;
                (I::Call(name), next)
            }
            Opcode::Ret => (I::Ret, offset + 1),
            Opcode::Const => (I::Const(operand(1)?), offset + 2),
            Opcode::PushImm => (I::PushImm(operand(1)?), offset + 2),
            Opcode::Push => (I::Push(operand(1)?), offset + 2),
            Opcode::Pop => (I::Pop(operand(1)?), offset + 2),
            Opcode::SetVar => (
                I::SetVar {
                    slot: operand(1)?,
                    value: operand(2)?,
                },
                offset + 3,
            ),
            Opcode::Drop => (I::Drop, offset + 1),
            Opcode::Inc => (I::Inc, offset + 1),
            Opcode::Dec => (I::Dec, offset + 1),
            Opcode::Add => (I::Add, offset + 1),
            Opcode::Sub => (I::Sub, offset + 1),
            Opcode::NewArray => (
                I::NewArray {
                    slot: operand(1)?,
                    kind: operand(2)?,
                },
                offset + 3,
            ),
            Opcode::SetLen => (I::SetLen, offset + 1),
            Opcode::SetIndex => (I::SetIndex, offset + 1),
            Opcode::PushIndex => (I::PushIndex, offset + 1),
            Opcode::PushLen => (I::PushLen, offset + 1),
            Opcode::Input => (I::Input, offset + 1),
            Opcode::Jump => (I::Jump, offset + 1),
            Opcode::JumpSub => (I::JumpSub, offset + 1),
            Opcode::JumpImm => (I::JumpImm(operand(1)?), offset + 2),
            Opcode::JumpConst => (I::JumpConst(operand(1)?), offset + 2),
            Opcode::JumpSubImm => (I::JumpSubImm(operand(1)?), offset + 2),
            Opcode::JumpSubConst => (I::JumpSubConst(operand(1)?), offset + 2),
            Opcode::RetSub => (I::RetSub, offset + 1),
            Opcode::When => (defer(Polarity::Equal, Obligation::Optional), offset + 1),
            Opcode::WhenNot => (defer(Polarity::NotEqual, Obligation::Optional), offset + 1),
            Opcode::Promise => (defer(Polarity::Equal, Obligation::Promise), offset + 1),
            Opcode::PromiseNot => (defer(Polarity::NotEqual, Obligation::Promise), offset + 1),
        };
        Ok(decoded)
    }
}

/// NUL-terminated string following the opcode at `offset`.
fn string_operand(bytes: &[u8], offset: usize) -> Result<(&str, usize), DecodeError> {
    let start = offset + 1;
    let len = bytes
        .get(start..)
        .and_then(|rest| rest.iter().position(|&b| b == 0))
        .ok_or(DecodeError::Truncated { offset })?;
    let text = core::str::from_utf8(&bytes[start..start + len])
        .map_err(|_| DecodeError::InvalidString { offset })?;
    Ok((text, start + len + 1))
}

fn defer(polarity: Polarity, obligation: Obligation) -> Instruction<'static> {
    Instruction::Defer {
        polarity,
        obligation,
    }
}
