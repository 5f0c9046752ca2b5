//! Human readable listing of compiled code.

use core::fmt;

use super::{Code, Instruction, Obligation, Opcode, Polarity};

impl Code {
    pub fn disassemble(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        let op = |op: Opcode| op.mnemonic();
        match self {
            Halt => f.write_str(op(Opcode::Halt)),
            Beg(text) => write!(f, "{} {:?}", op(Opcode::Beg), text),
            Fnctn(name) => write!(f, "{} {}", op(Opcode::Fnctn), name),
            Call(name) => write!(f, "{} {}", op(Opcode::Call), name),
            Ret => f.write_str(op(Opcode::Ret)),
            Const(index) => write!(f, "{} #{}", op(Opcode::Const), index),
            PushImm(value) => write!(f, "{} {}", op(Opcode::PushImm), value),
            Push(slot) => write!(f, "{} ${}", op(Opcode::Push), slot),
            Pop(slot) => write!(f, "{} ${}", op(Opcode::Pop), slot),
            SetVar { slot, value } => write!(f, "{} ${} {}", op(Opcode::SetVar), slot, value),
            Drop => f.write_str(op(Opcode::Drop)),
            Inc => f.write_str(op(Opcode::Inc)),
            Dec => f.write_str(op(Opcode::Dec)),
            Add => f.write_str(op(Opcode::Add)),
            Sub => f.write_str(op(Opcode::Sub)),
            NewArray { slot, kind } => write!(f, "{} ${} {}", op(Opcode::NewArray), slot, kind),
            SetLen => f.write_str(op(Opcode::SetLen)),
            SetIndex => f.write_str(op(Opcode::SetIndex)),
            PushIndex => f.write_str(op(Opcode::PushIndex)),
            PushLen => f.write_str(op(Opcode::PushLen)),
            Input => f.write_str(op(Opcode::Input)),
            Jump => f.write_str(op(Opcode::Jump)),
            JumpSub => f.write_str(op(Opcode::JumpSub)),
            JumpImm(target) => write!(f, "{} @{}", op(Opcode::JumpImm), target),
            JumpConst(index) => write!(f, "{} #{}", op(Opcode::JumpConst), index),
            JumpSubImm(target) => write!(f, "{} @{}", op(Opcode::JumpSubImm), target),
            JumpSubConst(index) => write!(f, "{} #{}", op(Opcode::JumpSubConst), index),
            RetSub => f.write_str(op(Opcode::RetSub)),
            Defer {
                polarity,
                obligation,
            } => f.write_str(op(Opcode::deferral(*polarity, *obligation))),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.constants.is_empty() {
            writeln!(f, "constants:")?;
            for (i, constant) in self.constants.iter().enumerate() {
                writeln!(f, "  #{:<3} {}", i, constant)?;
            }
        }

        writeln!(f, "functions:")?;
        for function in self.functions.iter() {
            let params: Vec<String> = function.params.iter().map(|t| t.to_string()).collect();
            let ret = function
                .ret
                .map(|t| t.to_string())
                .unwrap_or_else(|| "?".to_string());
            writeln!(
                f,
                "  {:04} {}({}) -> {}, {} vars",
                function.offset,
                function.name,
                params.join(", "),
                ret,
                function.vars.len()
            )?;
        }

        writeln!(f, "code:")?;
        let mut offset = 0;
        while offset < self.bytes.len() {
            let label = self
                .lines
                .iter()
                .position(|&line| line == offset)
                .map(|line| format!("L{}:", line))
                .unwrap_or_default();

            match self.decode(offset) {
                Ok((instruction, next)) => {
                    write!(f, "  {:04} {:>5}  {}", offset, label, instruction)?;
                    if let Some(note) = self.annotate(&instruction) {
                        write!(f, "  ; {}", note)?;
                    }
                    writeln!(f)?;
                    offset = next;
                }
                Err(err) => {
                    writeln!(f, "  {:04} {:>5}  ??? ({})", offset, label, err)?;
                    break;
                }
            }
        }
        Ok(())
    }
}

impl Code {
    /// Resolved pool values and deferral kinds, printed as trailing comments.
    fn annotate(&self, instruction: &Instruction<'_>) -> Option<String> {
        match instruction {
            Instruction::Const(index)
            | Instruction::JumpConst(index)
            | Instruction::JumpSubConst(index) => self.constants.get(*index).map(|c| c.to_string()),
            Instruction::Defer {
                polarity,
                obligation,
            } => {
                let cmp = match polarity {
                    Polarity::Equal => "==",
                    Polarity::NotEqual => "!=",
                };
                let kind = match obligation {
                    Obligation::Optional => "optional",
                    Obligation::Promise => "promise",
                };
                Some(format!("{} {}", kind, cmp))
            }
            _ => None,
        }
    }
}
