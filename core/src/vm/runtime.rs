use std::io::{BufRead, Write};

use tracing::{debug, trace};

use super::error::RuntimeError;
use super::frames::Frames;
use super::stack::Stack;
use super::value::{ArrayArena, ArrayRef, INITIAL_ARRAY_LEN, Value};
use super::when_queue::{Operand, Owner, Poll, When, WhenQueue};
use crate::bytecode::{Code, Constant, Instruction, Opcode};
use crate::compiler::PRINT;
use crate::gate::Gate;
use crate::types::Scalar;

type Result<T> = core::result::Result<T, RuntimeError>;

/// Limits of the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmOptions {
    /// Operand stack capacity.
    pub stack_size: usize,
    /// Return-address stack capacity.
    pub return_stack_size: usize,
    /// Maximum number of active calls, `main` included.
    pub max_depth: usize,
    /// Variable slots per frame.
    pub frame_size: usize,
    /// Bytes kept from each line of input.
    pub input_limit: usize,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            stack_size: 1024,
            return_stack_size: 256,
            max_depth: 16,
            frame_size: 256,
            input_limit: 63,
        }
    }
}

/// What a program left behind when it halted.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Top of the operand stack at halt: the value `main` returned. An array
    /// handle here is no longer valid, since arrays are released on halt.
    pub value: Option<Value>,
    /// Number of distinct arrays released at halt.
    pub arrays_released: usize,
}

/// Stack interpreter for a compiled program.
///
/// Output from `print` and input prompts go to `output`; `input` lines come
/// from `input`.
pub struct Vm<'a, I, O> {
    code: &'a Code,
    options: VmOptions,
    gate: &'a mut dyn Gate,
    input: I,
    output: O,

    pc: usize,
    stack: Stack<Value>,
    returns: Stack<usize>,
    /// Function index of every active call, innermost last.
    calls: Vec<usize>,
    frames: Frames,
    arrays: ArrayArena,
    whens: WhenQueue,
}

impl<'a, I: BufRead, O: Write> Vm<'a, I, O> {
    pub fn new(
        code: &'a Code,
        options: VmOptions,
        gate: &'a mut dyn Gate,
        input: I,
        output: O,
    ) -> Self {
        Self {
            code,
            options,
            gate,
            input,
            output,
            pc: 0,
            stack: Stack::new(options.stack_size),
            returns: Stack::new(options.return_stack_size),
            calls: Vec::new(),
            frames: Frames::new(options.frame_size, options.max_depth),
            arrays: ArrayArena::new(),
            whens: WhenQueue::new(),
        }
    }

    /// Run until `Halt`.
    pub fn run(mut self) -> Result<Outcome> {
        if self.code.bytes.first() != Some(&u8::from(Opcode::Beg)) {
            return Err(RuntimeError::InsufficientlyBegged);
        }

        let code = self.code;
        loop {
            let (instruction, next) = code.decode(self.pc)?;
            trace!(pc = self.pc, %instruction, depth = self.frames.depth(), "exec");
            self.pc = next;
            if instruction == Instruction::Halt {
                break;
            }
            self.execute(instruction)?;
            self.poll()?;
        }
        self.output.flush()?;
        Ok(self.teardown())
    }

    // ========================================================================
    // Stack helpers
    // ========================================================================

    fn push(&mut self, value: Value) -> Result<()> {
        self.stack
            .push(value)
            .map_err(|_| RuntimeError::StackOverflow)
    }

    fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn pop_int(&mut self, what: &'static str) -> Result<i32> {
        self.pop()?.as_int(what)
    }

    fn push_return(&mut self, address: usize) -> Result<()> {
        self.returns
            .push(address)
            .map_err(|_| RuntimeError::ReturnStackOverflow)
    }

    fn pop_return(&mut self) -> Result<usize> {
        self.returns
            .pop()
            .ok_or(RuntimeError::ReturnStackUnderflow)
    }

    fn constant(&self, index: u8) -> Result<Value> {
        match self.code.constants.get(index) {
            Some(Constant::Int(value)) => Ok(Value::Int(value)),
            Some(Constant::Real(value)) => Ok(Value::Real(value)),
            None => Err(RuntimeError::UnknownConstant(index)),
        }
    }

    /// Pop a slot number and return the array held in that slot.
    fn pop_array(&mut self) -> Result<ArrayRef> {
        let slot = self.pop_int("array slot")?;
        let slot = u8::try_from(slot).map_err(|_| RuntimeError::InvalidOperand("array slot"))?;
        match self.frames.get(slot)? {
            Value::Array(array) => Ok(array),
            _ => Err(RuntimeError::NotAnArray),
        }
    }

    fn line_address(&self, line: i32) -> Result<usize> {
        usize::try_from(line)
            .ok()
            .and_then(|line| self.code.lines.get(line).copied())
            .ok_or(RuntimeError::LineOutOfRange(line))
    }

    fn jump_target(&self, index: u8) -> Result<usize> {
        let target = self.constant(index)?.as_int("jump target")?;
        usize::try_from(target).map_err(|_| RuntimeError::InvalidOperand("jump target"))
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn execute(&mut self, instruction: Instruction<'_>) -> Result<()> {
        use Instruction::*;
        match instruction {
            Halt => {}
            Beg(greeting) => {
                self.gate.admit(greeting)?;
                debug!("greeting accepted");
            }
            Fnctn(_) => {}
            Call(name) if name == PRINT => self.print()?,
            Call(name) => self.call(name)?,
            Ret => self.ret()?,

            Const(index) => {
                let value = self.constant(index)?;
                self.push(value)?;
            }
            PushImm(value) => self.push(Value::Int(value as i32))?,
            Push(slot) => {
                let value = self.frames.get(slot)?;
                self.push(value)?;
            }
            Pop(slot) => {
                let value = self.pop()?;
                self.frames.set(slot, value)?;
            }
            SetVar { slot, value } => self.frames.set(slot, Value::Int(value as i32))?,
            Drop => {
                self.pop()?;
            }

            Inc => {
                let value = self.pop()?.plus(Value::Int(1))?;
                self.push(value)?;
            }
            Dec => {
                let value = self.pop()?.minus(Value::Int(1))?;
                self.push(value)?;
            }
            Add => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.push(left.plus(right)?)?;
            }
            Sub => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.push(left.minus(right)?)?;
            }

            NewArray { slot, kind } => {
                let element = Scalar::from_kind(kind)
                    .ok_or(RuntimeError::InvalidOperand("array element kind"))?;
                let array = self.arrays.alloc(element, vec![0; INITIAL_ARRAY_LEN]);
                self.frames.set(slot, Value::Array(array))?;
            }
            SetLen => {
                let array = self.pop_array()?;
                let len = self.pop_int("array length")?;
                self.arrays.resize(array, len)?;
            }
            SetIndex => {
                let value = self.pop()?;
                let index = self.pop_int("array index")?;
                let array = self.pop_array()?;
                self.arrays.write(array, index, value)?;
            }
            PushIndex => {
                let index = self.pop_int("array index")?;
                let array = self.pop_array()?;
                let value = self.arrays.read(array, index)?;
                self.push(value)?;
            }
            PushLen => {
                let array = self.pop_array()?;
                let len = self.arrays.get(array)?.cells.len();
                self.push(Value::Int(len as i32))?;
            }
            Input => self.input()?,

            Jump => {
                let line = self.pop_int("statement number")?;
                self.pc = self.line_address(line)?;
            }
            JumpSub => {
                let line = self.pop_int("statement number")?;
                self.push_return(self.pc)?;
                self.pc = self.line_address(line)?;
            }
            JumpImm(target) => self.pc = target as usize,
            JumpConst(index) => self.pc = self.jump_target(index)?,
            JumpSubImm(target) => {
                self.push_return(self.pc)?;
                self.pc = target as usize;
            }
            JumpSubConst(index) => {
                let target = self.jump_target(index)?;
                self.push_return(self.pc)?;
                self.pc = target;
            }
            RetSub => self.pc = self.pop_return()?,

            Defer {
                polarity,
                obligation,
            } => {
                let mode = self.pop_int("condition mode")?;
                let right = self.pop_int("condition operand")?;
                let left = self.pop_int("condition operand")?;
                let when = When {
                    polarity,
                    obligation,
                    left: Operand::from_mode(left, mode, 1),
                    right: Operand::from_mode(right, mode, 2),
                    resume: self.pc,
                    owner: self.owner().ok_or(RuntimeError::InvalidOperand(
                        "condition outside a function",
                    ))?,
                };
                self.whens.register(when);
                // Skip the park jump; it only runs when the record fires.
                let (_, after_park) = self.code.decode(self.pc)?;
                self.pc = after_park;
            }
        }
        Ok(())
    }

    fn call(&mut self, name: &str) -> Result<()> {
        let functions = &self.code.functions;
        let (index, offset) = functions
            .index_of(name)
            .and_then(|index| functions.get(index).map(|f| (index, f.offset)))
            .ok_or_else(|| RuntimeError::UnknownFunction(name.to_string()))?;

        self.frames.push()?;
        self.push_return(self.pc)?;
        self.calls.push(index);
        debug!(function = name, depth = self.frames.depth(), "call");
        self.pc = offset;
        Ok(())
    }

    fn ret(&mut self) -> Result<()> {
        if let Some(owner) = self.owner() {
            if let Err(broken) = self.whens.settle(owner) {
                let function = self.function_name(broken.owner.function);
                return Err(RuntimeError::BrokenPromise { function });
            }
        }
        let function = self
            .calls
            .pop()
            .map(|index| self.function_name(index))
            .unwrap_or_default();
        self.frames.pop();
        self.pc = self.pop_return()?;
        debug!(function = %function, depth = self.frames.depth(), "return");
        Ok(())
    }

    fn function_name(&self, index: usize) -> String {
        self.code
            .functions
            .get(index)
            .map(|f| f.name.clone())
            .unwrap_or_default()
    }

    /// The `print` intrinsic: write a character or a character array and
    /// leave the value on the stack.
    fn print(&mut self) -> Result<()> {
        let value = self.pop()?;
        match value {
            Value::Int(c) => self.output.write_all(&[c as u8])?,
            Value::Array(array) => {
                let bytes: Vec<u8> = self
                    .arrays
                    .get(array)?
                    .cells
                    .iter()
                    .map(|&c| c as u8)
                    .collect();
                self.output.write_all(&bytes)?;
            }
            Value::Real(_) => return Err(RuntimeError::InvalidOperand("cannot print a real")),
        }
        self.push(value)
    }

    /// Read one line into a new character array.
    fn input(&mut self) -> Result<()> {
        self.output.write_all(b"\n")?;
        self.output.flush()?;

        let mut line = Vec::new();
        self.input.read_until(b'\n', &mut line)?;
        while let Some(b'\n' | b'\r') = line.last() {
            line.pop();
        }
        // The whole line is consumed; bytes past the limit are discarded,
        // not left for the next read.
        let cells = line
            .iter()
            .take(self.options.input_limit)
            .map(|&b| b as i32)
            .collect();
        let array = self.arrays.alloc(Scalar::Char, cells);
        self.push(Value::Array(array))
    }

    // ========================================================================
    // Deferred conditions
    // ========================================================================

    fn owner(&self) -> Option<Owner> {
        self.calls.last().map(|&function| Owner {
            function,
            depth: self.frames.depth(),
        })
    }

    fn poll(&mut self) -> Result<()> {
        let Some(owner) = self.owner() else {
            return Ok(());
        };
        let frames = &self.frames;
        let poll = self.whens.poll(owner, self.pc, |operand| match operand {
            Operand::Value(value) => Ok(value as i64),
            Operand::Slot(slot) => Ok(frames.get(slot)?.raw()),
        })?;
        if let Poll::Resume(resume) = poll {
            self.pc = resume;
        }
        Ok(())
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Release every array once: first those reachable from a variable slot,
    /// then whatever was left unreachable.
    fn teardown(mut self) -> Outcome {
        let value = self.stack.peek().copied();
        let mut swept = 0;
        for slot in self.frames.iter() {
            if let Value::Array(array) = slot {
                if self.arrays.release(array) {
                    swept += 1;
                }
            }
        }
        let unreachable = self.arrays.release_all();
        debug!(
            swept,
            unreachable,
            pending_whens = self.whens.live(),
            "teardown"
        );
        Outcome {
            value,
            arrays_released: swept + unreachable,
        }
    }
}
