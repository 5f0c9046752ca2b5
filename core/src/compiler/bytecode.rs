//! Single-pass bytecode compiler.
//!
//! The compiler reads tokens front to back and emits bytes as it goes; there is
//! no syntax tree. Two places look back at earlier tokens: the return value of a
//! function is stored as a token position and compiled again at the closing
//! `;`, and `catch error` recovery rewinds to the statement that failed.

use tracing::{debug, trace};

use super::error::{CompileError, CompileErrorKind};
use crate::bytecode::{Code, Constant, Function, Obligation, Opcode, Polarity};
use crate::lexer::{Lexeme, Span, Token, TokenStream};
use crate::types::{Scalar, Type, Vars, VarsError};

pub(super) type Result<T> = core::result::Result<T, CompileError>;

/// Name of the intrinsic handled by the VM instead of the function table.
pub const PRINT: &str = "print";
/// Identifier that reads a line of input when used as a call argument.
pub const INPUT: &str = "input";
/// Entry point called by the program prologue.
pub const MAIN: &str = "main";

/// Call to a function declared later in the source, checked at the end.
#[derive(Debug, Clone)]
pub(super) struct PendingCall {
    pub name: String,
    pub args: Vec<Type>,
    pub span: Span,
}

/// Forward `jmp`, checked against the function's last statement.
#[derive(Debug, Clone)]
pub(super) struct PendingJump {
    pub target: i64,
    pub span: Span,
}

/// Operand of a `when` clause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Operand {
    Literal(i32),
    Var(u8),
}

#[derive(Debug, Clone)]
struct WhenClause {
    left: Operand,
    right: Operand,
    polarity: Polarity,
    span: Span,
}

/// Everything a failed statement may have touched.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    bytes: usize,
    constants: usize,
    vars: usize,
    calls: usize,
    jumps: usize,
}

/// Bytecode compiler that turns a token stream into a [`Code`].
pub struct BytecodeCompiler {
    pub(super) tokens: TokenStream,
    pub(super) code: Code,

    /// Pending forward calls, across the whole program.
    pub(super) pending_calls: Vec<PendingCall>,

    // Per-function state, reset by each `fnctn`.
    pub(super) function: usize,
    pub(super) vars: Vars,
    pub(super) first_line: usize,
    pub(super) pending_jumps: Vec<PendingJump>,
}

impl BytecodeCompiler {
    pub fn new(lexemes: Vec<Lexeme>) -> Self {
        Self {
            tokens: TokenStream::new(lexemes),
            code: Code::new(),
            pending_calls: Vec::new(),
            function: 0,
            vars: Vars::new(),
            first_line: 0,
            pending_jumps: Vec::new(),
        }
    }

    /// Lex and compile a whole program.
    pub fn compile(source: &str) -> Result<Code> {
        let lexemes = crate::lexer::lex(source)?;
        let mut compiler = Self::new(lexemes);
        compiler.program()?;
        debug!(
            bytes = compiler.code.bytes.len(),
            functions = compiler.code.functions.len(),
            constants = compiler.code.constants.len(),
            "compiled program"
        );
        Ok(compiler.code)
    }

    // ========================================================================
    // Emission
    // ========================================================================

    pub(super) fn emit(&mut self, op: Opcode) {
        self.code.bytes.push(op.into());
    }

    pub(super) fn emit_with(&mut self, op: Opcode, operand: u8) {
        self.code.bytes.extend_from_slice(&[op.into(), operand]);
    }

    pub(super) fn emit_string(&mut self, op: Opcode, text: &str) {
        self.emit(op);
        self.code.bytes.extend_from_slice(text.as_bytes());
        self.code.bytes.push(0);
    }

    pub(super) fn add_constant(&mut self, constant: Constant, span: &Span) -> Result<u8> {
        self.code
            .constants
            .add(constant)
            .ok_or_else(|| CompileError::new(CompileErrorKind::TooManyConstants, span.clone()))
    }

    /// Push an integer: inline when it fits in a byte, else from the pool.
    pub(super) fn push_int(&mut self, value: i32, span: &Span) -> Result<()> {
        match u8::try_from(value) {
            Ok(byte) => self.emit_with(Opcode::PushImm, byte),
            Err(_) => {
                let index = self.add_constant(Constant::Int(value), span)?;
                self.emit_with(Opcode::Const, index);
            }
        }
        Ok(())
    }

    pub(super) fn push_real(&mut self, value: f32, span: &Span) -> Result<()> {
        let index = self.add_constant(Constant::Real(value), span)?;
        self.emit_with(Opcode::Const, index);
        Ok(())
    }

    /// Store an integer literal into a slot.
    pub(super) fn set_int(&mut self, slot: u8, value: i32, span: &Span) -> Result<()> {
        match u8::try_from(value) {
            Ok(byte) => self
                .code
                .bytes
                .extend_from_slice(&[Opcode::SetVar.into(), slot, byte]),
            Err(_) => {
                self.push_int(value, span)?;
                self.emit_with(Opcode::Pop, slot);
            }
        }
        Ok(())
    }

    /// Jump to an absolute offset, inline when it fits in a byte.
    pub(super) fn jump_to(&mut self, target: usize, subroutine: bool, span: &Span) -> Result<()> {
        let (imm, pooled) = if subroutine {
            (Opcode::JumpSubImm, Opcode::JumpSubConst)
        } else {
            (Opcode::JumpImm, Opcode::JumpConst)
        };
        match u8::try_from(target) {
            Ok(byte) => self.emit_with(imm, byte),
            Err(_) => {
                let value = i32::try_from(target).unwrap_or(i32::MAX);
                let index = self.add_constant(Constant::Int(value), span)?;
                self.emit_with(pooled, index);
            }
        }
        Ok(())
    }

    /// Allocate a character array holding `text` into `slot`.
    pub(super) fn store_string(&mut self, slot: u8, text: &str) {
        let bytes = text.as_bytes();
        let len = bytes.len() as u8;
        self.code
            .bytes
            .extend_from_slice(&[Opcode::NewArray.into(), slot, Scalar::Char.kind()]);
        self.emit_with(Opcode::PushImm, len);
        self.emit_with(Opcode::PushImm, slot);
        self.emit(Opcode::SetLen);
        for (i, &byte) in bytes.iter().enumerate() {
            self.emit_with(Opcode::PushImm, slot);
            self.emit_with(Opcode::PushImm, i as u8);
            self.emit_with(Opcode::PushImm, byte);
            self.emit(Opcode::SetIndex);
        }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    pub(super) fn unexpected(&self, expected: &'static str) -> CompileError {
        CompileError::new(
            CompileErrorKind::UnexpectedToken {
                expected,
                found: self.tokens.peek().clone(),
            },
            self.tokens.peek_span(),
        )
    }

    pub(super) fn expect(&mut self, token: Token) -> Result<Lexeme> {
        if *self.tokens.peek() == token {
            Ok(self.tokens.next())
        } else {
            Err(self.unexpected(token.describe()))
        }
    }

    pub(super) fn expect_ident(&mut self) -> Result<(String, Span)> {
        if let Token::Ident(name) = self.tokens.peek() {
            let name = name.clone();
            let span = self.tokens.next().span;
            Ok((name, span))
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    pub(super) fn lookup_var(&self, name: &str, span: &Span) -> Result<(u8, Type)> {
        self.vars.lookup(name).ok_or_else(|| {
            CompileError::new(
                CompileErrorKind::UndeclaredVariable(name.to_string()),
                span.clone(),
            )
        })
    }

    pub(super) fn declare_var(&mut self, name: &str, ty: Type, span: &Span) -> Result<u8> {
        self.vars.declare(name, ty).map_err(|err| {
            let kind = match err {
                VarsError::Duplicate => CompileErrorKind::DuplicateVariable(name.to_string()),
                VarsError::Full => CompileErrorKind::TooManyVariables(self.function_name()),
            };
            CompileError::new(kind, span.clone())
        })
    }

    fn function_name(&self) -> String {
        self.code
            .functions
            .get(self.function)
            .map(|f| f.name.clone())
            .unwrap_or_default()
    }

    pub(super) fn check_accepts(&self, slot: Type, value: Type, span: &Span) -> Result<()> {
        if slot.accepts(value) {
            Ok(())
        } else {
            Err(CompileError::new(
                CompileErrorKind::TypeMismatch {
                    expected: slot,
                    found: value,
                },
                span.clone(),
            ))
        }
    }

    pub(super) fn parse_scalar(&mut self) -> Result<Scalar> {
        let scalar = match self.tokens.peek() {
            Token::ShInt | Token::Int => Scalar::Int,
            Token::ShChar | Token::Char => Scalar::Char,
            Token::ShFloat | Token::Float => Scalar::Real,
            other => {
                return Err(CompileError::new(
                    CompileErrorKind::UnknownType(other.clone()),
                    self.tokens.peek_span(),
                ));
            }
        };
        self.tokens.next();
        Ok(scalar)
    }

    fn parse_type(&mut self) -> Result<Type> {
        if self.tokens.eat(&Token::Void) {
            return Ok(Type::Void);
        }
        if self.tokens.eat(&Token::LBracket) {
            let scalar = self.parse_scalar()?;
            self.expect(Token::RBracket)?;
            return Ok(Type::Array(scalar));
        }
        Ok(Type::Scalar(self.parse_scalar()?))
    }

    // ========================================================================
    // Program & functions
    // ========================================================================

    fn program(&mut self) -> Result<()> {
        if self.tokens.eat(&Token::Beg) {
            let text = match self.tokens.peek() {
                Token::Str(text) => text.clone(),
                _ => return Err(self.unexpected("string")),
            };
            self.tokens.next();
            self.emit_string(Opcode::Beg, &text);
            self.expect(Token::Semicolon)?;
        }
        self.emit_string(Opcode::Call, MAIN);
        self.emit(Opcode::Halt);

        while !self.tokens.at_end() {
            self.function_declaration()?;
        }
        self.finish()
    }

    fn function_declaration(&mut self) -> Result<()> {
        self.expect(Token::Fnctn)?;
        self.expect(Token::Returns)?;
        let ret_pos = self.tokens.position();
        let ret = self.return_value_type()?;

        self.expect(Token::Nm)?;
        let (name, name_span) = self.expect_ident()?;

        self.expect(Token::Args)?;
        let mut params = Vec::new();
        if !self.tokens.eat(&Token::Void) && matches!(self.tokens.peek(), Token::Ident(_)) {
            loop {
                let (param, span) = self.expect_ident()?;
                self.expect(Token::Colon)?;
                let ty = self.parse_type()?;
                params.push((param, ty, span));
                if !self.tokens.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::Calls)?;

        self.emit_string(Opcode::Fnctn, &name);
        let function = Function {
            name: name.clone(),
            offset: self.code.bytes.len(),
            params: params.iter().map(|(_, ty, _)| *ty).collect(),
            vars: Vars::new(),
            ret,
        };
        if name == PRINT {
            return Err(CompileError::new(
                CompileErrorKind::DuplicateFunction(name),
                name_span,
            ));
        }
        self.function = self.code.functions.declare(function).ok_or_else(|| {
            CompileError::new(
                CompileErrorKind::DuplicateFunction(name.clone()),
                name_span.clone(),
            )
        })?;
        self.vars = Vars::new();
        self.first_line = self.code.lines.len();
        self.pending_jumps.clear();

        let mut slots = Vec::with_capacity(params.len());
        for (param, ty, span) in &params {
            if *ty == Type::Void {
                slots.push(None);
            } else {
                slots.push(Some(self.declare_var(param, *ty, span)?));
            }
        }
        // Arguments arrive in call order, so the last one is on top.
        for slot in slots.into_iter().rev() {
            match slot {
                Some(slot) => self.emit_with(Opcode::Pop, slot),
                None => self.emit(Opcode::Drop),
            }
        }

        if *self.tokens.peek() != Token::Semicolon {
            loop {
                self.statement()?;
                if !self.tokens.eat(&Token::Then) {
                    break;
                }
            }
        }
        self.expect(Token::Semicolon)?;
        let ret = self.return_value(ret_pos, ret)?;
        self.check_forward_jumps()?;

        let vars = core::mem::take(&mut self.vars);
        if let Some(function) = self.code.functions.get_mut(self.function) {
            function.ret = Some(ret);
            function.vars = vars;
        }
        debug!(function = %name, params = params.len(), %ret, "compiled function");
        Ok(())
    }

    /// Parse the token after `returns`. Literals and annotations fix the
    /// return type now; a bare identifier is resolved at the closing `;`.
    fn return_value_type(&mut self) -> Result<Option<Type>> {
        let literal = match self.tokens.peek() {
            Token::Integer(_) => Some(Type::INT),
            Token::Real(_) => Some(Type::REAL),
            Token::Void => Some(Type::Void),
            Token::Ident(_) => None,
            _ => return Err(self.unexpected("return value")),
        };
        self.tokens.next();
        if self.tokens.eat(&Token::Colon) {
            return Ok(Some(self.parse_type()?));
        }
        Ok(literal)
    }

    /// Compile the return value stored at `ret_pos`, followed by `Ret`.
    fn return_value(&mut self, ret_pos: usize, declared: Option<Type>) -> Result<Type> {
        let resume = self.tokens.position();
        self.tokens.seek(ret_pos);
        let lexeme = self.tokens.next();
        let ty = match lexeme.token {
            Token::Integer(value) => {
                self.push_int(value, &lexeme.span)?;
                Type::INT
            }
            Token::Real(value) => {
                self.push_real(value, &lexeme.span)?;
                Type::REAL
            }
            Token::Ident(name) => {
                let (slot, ty) = self.lookup_var(&name, &lexeme.span)?;
                self.emit_with(Opcode::Push, slot);
                ty
            }
            _ => {
                self.emit_with(Opcode::PushImm, 0);
                Type::Void
            }
        };
        if let Some(declared) = declared {
            self.check_accepts(declared, ty, &lexeme.span)?;
        }
        self.emit(Opcode::Ret);
        self.tokens.seek(resume);
        Ok(declared.unwrap_or(ty))
    }

    fn check_forward_jumps(&self) -> Result<()> {
        let last_line = self.code.lines.len() as i64 - 1;
        match self.pending_jumps.iter().find(|j| j.target > last_line) {
            Some(jump) => Err(CompileError::new(
                CompileErrorKind::JumpOutOfRange {
                    target: jump.target,
                },
                jump.span.clone(),
            )),
            None => Ok(()),
        }
    }

    /// Checks that need the whole program: the entry point and forward calls.
    fn finish(&self) -> Result<()> {
        let end = self.tokens.peek_span();
        let main = self.code.functions.lookup(MAIN).ok_or_else(|| {
            CompileError::new(
                CompileErrorKind::UndeclaredFunction(MAIN.to_string()),
                end.clone(),
            )
        })?;
        if main.arity() != 0 {
            return Err(CompileError::new(
                CompileErrorKind::ArgumentCount {
                    function: MAIN.to_string(),
                    expected: 0,
                    found: main.arity(),
                },
                end,
            ));
        }

        for call in &self.pending_calls {
            let function = self.code.functions.lookup(&call.name).ok_or_else(|| {
                CompileError::new(
                    CompileErrorKind::UndeclaredFunction(call.name.clone()),
                    call.span.clone(),
                )
            })?;
            check_arguments(function, &call.args, &call.span)?;
        }
        Ok(())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            bytes: self.code.bytes.len(),
            constants: self.code.constants.len(),
            vars: self.vars.len(),
            calls: self.pending_calls.len(),
            jumps: self.pending_jumps.len(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.code.bytes.truncate(checkpoint.bytes);
        self.code.constants.truncate(checkpoint.constants);
        self.vars.truncate(checkpoint.vars);
        self.pending_calls.truncate(checkpoint.calls);
        self.pending_jumps.truncate(checkpoint.jumps);
    }

    fn statement(&mut self) -> Result<()> {
        let line = self.code.lines.len();
        self.code.lines.push(self.code.bytes.len());
        let start = self.tokens.position();
        let checkpoint = self.checkpoint();
        trace!(line, offset = checkpoint.bytes, "statement");

        match self.statement_body(line) {
            Ok(()) => Ok(()),
            Err(err) => match self.recovery_point(start) {
                Some(boundary) => {
                    debug!(line, error = %err, "error caught");
                    self.rollback(checkpoint);
                    self.tokens.seek(boundary);
                    Ok(())
                }
                None => Err(err),
            },
        }
    }

    /// Position of the statement boundary after `start`, if the statement
    /// ends with `catch error`.
    fn recovery_point(&mut self, start: usize) -> Option<usize> {
        let resume = self.tokens.position();
        self.tokens.seek(start);
        let mut caught = false;
        while !self.tokens.peek().is_statement_boundary() {
            if *self.tokens.peek() == Token::Catch && *self.tokens.peek_nth(1) == Token::Error {
                caught = true;
            }
            self.tokens.next();
        }
        let boundary = self.tokens.position();
        self.tokens.seek(resume);
        caught.then_some(boundary)
    }

    fn statement_body(&mut self, line: usize) -> Result<()> {
        self.simple_statement(line)?;

        let when = if *self.tokens.peek() == Token::When {
            Some(self.when_clause()?)
        } else {
            None
        };
        let caught = if self.tokens.eat(&Token::Catch) {
            self.expect(Token::Error)?;
            true
        } else {
            false
        };

        if let Some(when) = when {
            let obligation = if caught {
                Obligation::Optional
            } else {
                Obligation::Promise
            };
            self.emit_when(when, obligation)?;
        }
        Ok(())
    }

    fn simple_statement(&mut self, line: usize) -> Result<()> {
        match self.tokens.peek() {
            Token::Let => self.let_statement(),
            Token::Chg => self.chg_statement(),
            Token::Call => {
                self.call()?;
                self.emit(Opcode::Drop);
                Ok(())
            }
            Token::Jmp => self.jump(line),
            Token::Return => {
                self.tokens.next();
                self.emit(Opcode::RetSub);
                Ok(())
            }
            token @ (Token::Out | Token::EndOut | Token::Defl | Token::Dot) => Err(
                CompileError::new(CompileErrorKind::Reserved(token.clone()), self.tokens.peek_span()),
            ),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn when_clause(&mut self) -> Result<WhenClause> {
        let start = self.expect(Token::When)?.span;
        let left = self.operand()?;
        self.expect(Token::Is)?;
        let polarity = if self.tokens.eat(&Token::Not) {
            Polarity::NotEqual
        } else {
            Polarity::Equal
        };
        let right = self.operand()?;
        Ok(WhenClause {
            left,
            right,
            polarity,
            span: Span::combine(&start, &self.tokens.last_span()),
        })
    }

    pub(super) fn operand(&mut self) -> Result<Operand> {
        match self.tokens.peek().clone() {
            Token::Integer(value) => {
                self.tokens.next();
                Ok(Operand::Literal(value))
            }
            Token::Ident(_) => {
                let (name, span) = self.expect_ident()?;
                let (slot, _) = self.lookup_var(&name, &span)?;
                Ok(Operand::Var(slot))
            }
            _ => Err(self.unexpected("integer or variable")),
        }
    }

    /// Emit the condition check and the park jump that follows it.
    ///
    /// The `When*` opcode registers a record resuming at the park jump and
    /// skips it, so on the first pass control falls through to the next
    /// statement. When the record fires later, the park jump sends control to
    /// that same next statement.
    fn emit_when(&mut self, when: WhenClause, obligation: Obligation) -> Result<()> {
        let mut mode = 0u8;
        for (bit, operand) in [(1u8, when.left), (2u8, when.right)] {
            match operand {
                Operand::Var(slot) => {
                    mode |= bit;
                    self.emit_with(Opcode::PushImm, slot);
                }
                Operand::Literal(value) => self.push_int(value, &when.span)?,
            }
        }
        self.emit_with(Opcode::PushImm, mode);
        self.emit(Opcode::deferral(when.polarity, obligation));

        let park = self.code.bytes.len();
        let next = park + 2;
        self.jump_to(next, false, &when.span)?;
        trace!(park, next, ?obligation, "emitted deferred condition");
        Ok(())
    }
}

/// Arity and argument types of a call against the callee's declaration.
pub(super) fn check_arguments(function: &Function, args: &[Type], span: &Span) -> Result<()> {
    if function.params.len() != args.len() {
        return Err(CompileError::new(
            CompileErrorKind::ArgumentCount {
                function: function.name.clone(),
                expected: function.params.len(),
                found: args.len(),
            },
            span.clone(),
        ));
    }
    for (&param, &arg) in function.params.iter().zip(args) {
        if param != Type::Void && !param.accepts(arg) {
            return Err(CompileError::new(
                CompileErrorKind::TypeMismatch {
                    expected: param,
                    found: arg,
                },
                span.clone(),
            ));
        }
    }
    Ok(())
}
