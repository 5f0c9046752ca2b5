//! Statement bodies and expressions.

use tracing::trace;

use super::bytecode::{
    BytecodeCompiler, INPUT, Operand, PRINT, PendingCall, PendingJump, Result, check_arguments,
};
use super::error::{CompileError, CompileErrorKind};
use crate::bytecode::{Constant, Opcode};
use crate::lexer::{Span, Token};
use crate::types::{Scalar, Type};

/// One `+` or `-` of a chg-expression or jump offset, with its repeat count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Step {
    pub up: bool,
    pub count: u32,
}

/// Where a `chg` stores its value.
enum Target {
    Var(u8, Type),
    Element { slot: u8, element: Scalar, index: Operand },
    Length(u8),
}

impl BytecodeCompiler {
    // ========================================================================
    // let
    // ========================================================================

    pub(super) fn let_statement(&mut self) -> Result<()> {
        self.expect(Token::Let)?;
        let (name, span) = self.expect_ident()?;
        self.expect(Token::Equals)?;

        let value_span = self.tokens.peek_span();
        match self.tokens.peek().clone() {
            Token::Integer(value) => {
                self.tokens.next();
                let slot = self.declare_var(&name, Type::INT, &span)?;
                self.set_int(slot, value, &value_span)?;
            }
            Token::Real(value) => {
                self.tokens.next();
                let slot = self.declare_var(&name, Type::REAL, &span)?;
                self.push_real(value, &value_span)?;
                self.emit_with(Opcode::Pop, slot);
            }
            Token::Str(text) => {
                self.tokens.next();
                let slot = self.declare_var(&name, Type::Array(Scalar::Char), &span)?;
                self.store_string(slot, &text);
            }
            Token::ShInt | Token::ShChar | Token::ShFloat => self.shorthand(&name, &span)?,
            Token::LBracket => self.array_declaration(&name, &span)?,
            _ => {
                let ty = self.expression()?;
                if ty == Type::Void {
                    return Err(CompileError::new(
                        CompileErrorKind::TypeMismatch {
                            expected: Type::INT,
                            found: Type::Void,
                        },
                        Span::combine(&value_span, &self.tokens.last_span()),
                    ));
                }
                let slot = self.declare_var(&name, ty, &span)?;
                self.emit_with(Opcode::Pop, slot);
            }
        }
        trace!(variable = %name, "let");
        Ok(())
    }

    /// `i`, `c` or `f`, optionally followed by an initial value.
    fn shorthand(&mut self, name: &str, span: &Span) -> Result<()> {
        let scalar = self.parse_scalar()?;
        let ty = Type::Scalar(scalar);
        let slot = self.declare_var(name, ty, span)?;
        let value_span = self.tokens.peek_span();

        match (self.tokens.peek().clone(), scalar) {
            (Token::Integer(value), Scalar::Real) => {
                self.tokens.next();
                self.push_real(value as f32, &value_span)?;
                self.emit_with(Opcode::Pop, slot);
            }
            (Token::Integer(value), _) => {
                self.tokens.next();
                self.set_int(slot, value, &value_span)?;
            }
            (Token::Real(value), Scalar::Real) => {
                self.tokens.next();
                self.push_real(value, &value_span)?;
                self.emit_with(Opcode::Pop, slot);
            }
            (Token::Real(_), _) => {
                return Err(CompileError::new(
                    CompileErrorKind::TypeMismatch {
                        expected: ty,
                        found: Type::REAL,
                    },
                    value_span,
                ));
            }
            (_, Scalar::Real) => {
                self.push_real(0.0, &value_span)?;
                self.emit_with(Opcode::Pop, slot);
            }
            _ => self
                .code
                .bytes
                .extend_from_slice(&[Opcode::SetVar.into(), slot, 0]),
        }
        Ok(())
    }

    /// `[scalar]` or `[scalar N]`.
    fn array_declaration(&mut self, name: &str, span: &Span) -> Result<()> {
        self.expect(Token::LBracket)?;
        let scalar = self.parse_scalar()?;
        let len = match self.tokens.peek().clone() {
            Token::Integer(len) => {
                let len_span = self.tokens.next().span;
                if len < 0 {
                    return Err(CompileError::new(
                        CompileErrorKind::InvalidLength(len),
                        len_span,
                    ));
                }
                Some((len, len_span))
            }
            _ => None,
        };
        self.expect(Token::RBracket)?;

        let slot = self.declare_var(name, Type::Array(scalar), span)?;
        self.code
            .bytes
            .extend_from_slice(&[Opcode::NewArray.into(), slot, scalar.kind()]);
        if let Some((len, len_span)) = len {
            self.push_int(len, &len_span)?;
            self.emit_with(Opcode::PushImm, slot);
            self.emit(Opcode::SetLen);
        }
        Ok(())
    }

    // ========================================================================
    // chg
    // ========================================================================

    pub(super) fn chg_statement(&mut self) -> Result<()> {
        self.expect(Token::Chg)?;
        let target = self.chg_target()?;
        self.expect(Token::Comma)?;

        match target {
            Target::Var(slot, ty) => self.assign(slot, ty),
            Target::Element {
                slot,
                element,
                index,
            } => {
                self.emit_with(Opcode::PushImm, slot);
                self.push_operand(index)?;
                let span = self.tokens.peek_span();
                let value = self.expression()?;
                let span = Span::combine(&span, &self.tokens.last_span());
                self.check_accepts(Type::Scalar(element), value, &span)?;
                self.emit(Opcode::SetIndex);
                Ok(())
            }
            Target::Length(slot) => {
                let span = self.tokens.peek_span();
                let value = self.expression()?;
                let span = Span::combine(&span, &self.tokens.last_span());
                if value != Type::INT {
                    return Err(CompileError::new(
                        CompileErrorKind::TypeMismatch {
                            expected: Type::INT,
                            found: value,
                        },
                        span,
                    ));
                }
                self.emit_with(Opcode::PushImm, slot);
                self.emit(Opcode::SetLen);
                Ok(())
            }
        }
    }

    fn chg_target(&mut self) -> Result<Target> {
        if self.tokens.eat(&Token::Lng) {
            self.expect(Token::Of)?;
            let (name, span) = self.expect_ident()?;
            let (slot, _) = self.array_var(&name, &span)?;
            return Ok(Target::Length(slot));
        }

        let (name, span) = self.expect_ident()?;
        if self.tokens.eat(&Token::At) {
            let (slot, element) = self.array_var(&name, &span)?;
            let index = self.index_operand()?;
            return Ok(Target::Element {
                slot,
                element,
                index,
            });
        }
        let (slot, ty) = self.lookup_var(&name, &span)?;
        Ok(Target::Var(slot, ty))
    }

    /// Right-hand side of `chg name, ...`.
    fn assign(&mut self, slot: u8, ty: Type) -> Result<()> {
        let span = self.tokens.peek_span();
        match self.tokens.peek().clone() {
            Token::Integer(value) => {
                self.tokens.next();
                self.check_accepts(ty, Type::INT, &span)?;
                self.set_int(slot, value, &span)
            }
            Token::Real(value) => {
                self.tokens.next();
                self.check_accepts(ty, Type::REAL, &span)?;
                self.push_real(value, &span)?;
                self.emit_with(Opcode::Pop, slot);
                Ok(())
            }
            Token::Str(text) => {
                self.tokens.next();
                self.check_accepts(ty, Type::Array(Scalar::Char), &span)?;
                self.store_string(slot, &text);
                Ok(())
            }
            Token::Star => {
                self.tokens.next();
                self.chg_expression(slot, ty, slot, ty, &span)
            }
            Token::Ident(seed)
                if matches!(
                    self.tokens.peek_nth(1),
                    Token::Plus | Token::Minus | Token::Times
                ) =>
            {
                self.tokens.next();
                let (seed_slot, seed_ty) = self.lookup_var(&seed, &span)?;
                self.chg_expression(slot, ty, seed_slot, seed_ty, &span)
            }
            _ => {
                let value = self.expression()?;
                let span = Span::combine(&span, &self.tokens.last_span());
                self.check_accepts(ty, value, &span)?;
                self.emit_with(Opcode::Pop, slot);
                Ok(())
            }
        }
    }

    /// `seed + - .x N ...`, stored back into `slot`.
    fn chg_expression(
        &mut self,
        slot: u8,
        ty: Type,
        seed: u8,
        seed_ty: Type,
        span: &Span,
    ) -> Result<()> {
        if seed_ty != ty {
            return Err(CompileError::new(
                CompileErrorKind::TypeMismatch {
                    expected: ty,
                    found: seed_ty,
                },
                span.clone(),
            ));
        }
        if !matches!(ty, Type::Scalar(_)) {
            return Err(CompileError::new(
                CompileErrorKind::TypeMismatch {
                    expected: Type::INT,
                    found: ty,
                },
                span.clone(),
            ));
        }
        let steps = self.steps()?;
        self.emit_with(Opcode::Push, seed);
        self.emit_steps(&steps, span)?;
        self.emit_with(Opcode::Pop, slot);
        Ok(())
    }

    /// A run of `+`, `-` and `.x N`.
    pub(super) fn steps(&mut self) -> Result<Vec<Step>> {
        let mut steps: Vec<Step> = Vec::new();
        loop {
            match self.tokens.peek() {
                Token::Plus => steps.push(Step { up: true, count: 1 }),
                Token::Minus => steps.push(Step {
                    up: false,
                    count: 1,
                }),
                Token::Times => {
                    let times_span = self.tokens.next().span;
                    let count = match self.tokens.peek() {
                        Token::Integer(n) if *n >= 0 => *n as u32,
                        _ => return Err(self.unexpected("repeat count")),
                    };
                    match steps.last_mut() {
                        // `.x 0` still applies the step once.
                        Some(step) => step.count = count.max(1),
                        None => {
                            return Err(CompileError::new(
                                CompileErrorKind::DanglingRepeat,
                                times_span,
                            ));
                        }
                    }
                }
                _ => return Ok(steps),
            }
            self.tokens.next();
        }
    }

    /// Apply steps to the value on top of the stack.
    ///
    /// Consecutive steps in the same direction form a run; short runs become
    /// single `Inc`/`Dec` bytes, long ones a pooled constant and `Add`/`Sub`.
    pub(super) fn emit_steps(&mut self, steps: &[Step], span: &Span) -> Result<()> {
        let mut runs: Vec<(bool, u64)> = Vec::new();
        for step in steps {
            match runs.last_mut() {
                Some((up, total)) if *up == step.up => *total += step.count as u64,
                _ => runs.push((step.up, step.count as u64)),
            }
        }

        for (up, total) in runs {
            if total <= u8::MAX as u64 {
                let op = if up { Opcode::Inc } else { Opcode::Dec };
                for _ in 0..total {
                    self.emit(op);
                }
            } else {
                let value = i32::try_from(total).map_err(|_| {
                    CompileError::new(CompileErrorKind::TooManyConstants, span.clone())
                })?;
                let index = self.add_constant(Constant::Int(value), span)?;
                self.emit_with(Opcode::Const, index);
                self.emit(if up { Opcode::Add } else { Opcode::Sub });
            }
        }
        Ok(())
    }

    // ========================================================================
    // jmp
    // ========================================================================

    pub(super) fn jump(&mut self, line: usize) -> Result<()> {
        let start = self.expect(Token::Jmp)?.span;
        let subroutine = self.tokens.eat(&Token::At);
        self.expect(Token::Under)?;
        let steps = self.steps()?;
        let span = Span::combine(&start, &self.tokens.last_span());

        let offset: i64 = steps
            .iter()
            .map(|s| if s.up { s.count as i64 } else { -(s.count as i64) })
            .sum();
        let target = line as i64 + offset;
        if target < self.first_line as i64 {
            return Err(CompileError::new(
                CompileErrorKind::JumpOutOfRange { target },
                span,
            ));
        }

        if offset <= 0 {
            let address = self.code.lines[target as usize];
            self.jump_to(address, subroutine, &span)?;
        } else {
            self.pending_jumps.push(PendingJump {
                target,
                span: span.clone(),
            });
            let line = i32::try_from(line).map_err(|_| {
                CompileError::new(CompileErrorKind::JumpOutOfRange { target }, span.clone())
            })?;
            self.push_int(line, &span)?;
            self.emit_steps(&steps, &span)?;
            self.emit(if subroutine {
                Opcode::JumpSub
            } else {
                Opcode::Jump
            });
        }
        trace!(line, target, subroutine, "jmp");
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Compile an expression that leaves one value on the stack.
    pub(super) fn expression(&mut self) -> Result<Type> {
        let span = self.tokens.peek_span();
        match self.tokens.peek().clone() {
            Token::Integer(value) => {
                self.tokens.next();
                self.push_int(value, &span)?;
                Ok(Type::INT)
            }
            Token::Real(value) => {
                self.tokens.next();
                self.push_real(value, &span)?;
                Ok(Type::REAL)
            }
            Token::Ident(_) => {
                let (name, span) = self.expect_ident()?;
                if self.tokens.eat(&Token::At) {
                    let (slot, element) = self.array_var(&name, &span)?;
                    let index = self.index_operand()?;
                    self.emit_with(Opcode::PushImm, slot);
                    self.push_operand(index)?;
                    self.emit(Opcode::PushIndex);
                    Ok(Type::Scalar(element))
                } else {
                    let (slot, ty) = self.lookup_var(&name, &span)?;
                    self.emit_with(Opcode::Push, slot);
                    Ok(ty)
                }
            }
            Token::Lng => {
                self.tokens.next();
                self.expect(Token::Of)?;
                let (name, span) = self.expect_ident()?;
                let (slot, _) = self.array_var(&name, &span)?;
                self.emit_with(Opcode::PushImm, slot);
                self.emit(Opcode::PushLen);
                Ok(Type::INT)
            }
            Token::Call => {
                let (name, ret) = self.call()?;
                ret.ok_or_else(|| {
                    CompileError::new(
                        CompileErrorKind::UnknownReturnType(name),
                        Span::combine(&span, &self.tokens.last_span()),
                    )
                })
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `call name in args endin`. Returns the callee name and, when known,
    /// its return type.
    pub(super) fn call(&mut self) -> Result<(String, Option<Type>)> {
        let start = self.expect(Token::Call)?.span;
        let (name, name_span) = self.expect_ident()?;
        self.expect(Token::In)?;

        let mut args = Vec::new();
        if *self.tokens.peek() != Token::EndIn {
            loop {
                args.push(self.argument()?);
                if !self.tokens.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::EndIn)?;
        let span = Span::combine(&start, &self.tokens.last_span());

        let ret = if name == PRINT {
            if args.len() != 1 {
                return Err(CompileError::new(
                    CompileErrorKind::ArgumentCount {
                        function: name,
                        expected: 1,
                        found: args.len(),
                    },
                    span,
                ));
            }
            if !args[0].is_printable() {
                return Err(CompileError::new(
                    CompileErrorKind::NotPrintable(args[0]),
                    span,
                ));
            }
            Some(args[0])
        } else if let Some(function) = self.code.functions.lookup(&name) {
            check_arguments(function, &args, &span)?;
            function.ret
        } else {
            self.pending_calls.push(PendingCall {
                name: name.clone(),
                args,
                span: name_span,
            });
            None
        };

        self.emit_string(Opcode::Call, &name);
        trace!(callee = %name, "call");
        Ok((name, ret))
    }

    fn argument(&mut self) -> Result<Type> {
        if matches!(self.tokens.peek(), Token::Ident(name) if name == INPUT) {
            self.tokens.next();
            self.emit(Opcode::Input);
            return Ok(Type::Array(Scalar::Char));
        }
        self.expression()
    }

    // ========================================================================
    // Operands
    // ========================================================================

    fn array_var(&self, name: &str, span: &Span) -> Result<(u8, Scalar)> {
        let (slot, ty) = self.lookup_var(name, span)?;
        match ty.element() {
            Some(element) => Ok((slot, element)),
            None => Err(CompileError::new(
                CompileErrorKind::NotAnArray(name.to_string()),
                span.clone(),
            )),
        }
    }

    /// Array index: an integer literal or an integer variable.
    fn index_operand(&mut self) -> Result<Operand> {
        let span = self.tokens.peek_span();
        let operand = self.operand()?;
        if let Operand::Var(slot) = operand {
            let ty = self.vars.get(slot).map(|v| v.ty).unwrap_or(Type::Void);
            if !matches!(ty, Type::Scalar(Scalar::Int | Scalar::Char)) {
                return Err(CompileError::new(
                    CompileErrorKind::TypeMismatch {
                        expected: Type::INT,
                        found: ty,
                    },
                    span,
                ));
            }
        }
        Ok(operand)
    }

    fn push_operand(&mut self, operand: Operand) -> Result<()> {
        match operand {
            Operand::Literal(value) => {
                let span = self.tokens.last_span();
                self.push_int(value, &span)
            }
            Operand::Var(slot) => {
                self.emit_with(Opcode::Push, slot);
                Ok(())
            }
        }
    }
}
