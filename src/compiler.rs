//! Single-pass Pratt compiler: parses and emits bytecode in the same walk,
//! with no intermediate AST. Parser-state shape (`previous`/`current`,
//! `had_error`/`panic_mode`) grounded on `hinton-lang-Hinton/src/compiler/mod.rs`;
//! the precedence-climbing dispatch table grounded on
//! `src/compiler/precedence.rs`'s `ParseFn`/`Precedence` pairing, collapsed
//! here to the smaller grammar this language actually has (no bitwise,
//! ternary, range, or exponent operators). Exact precedence names/order and
//! the `errorAt` message format are grounded on `original_source/src/compiler.c`.

use crate::chunk::{Chunk, OpCode, MAX_JUMP};
use crate::errors::CompileErrorKind;
use crate::object::{fnv1a_hash, FunctionObj, Heap, Object, ObjRef, StringObj};
use crate::scanner::{Scanner, Token, TokenType};
use crate::table::Table;
use crate::value::Value;

const LOCALS_MAX: usize = 256;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    /// One level tighter than `self`, for left-associative infix operators.
    fn next(self) -> Precedence {
        use Precedence::*;
        match self {
            None => Assignment,
            Assignment => Or,
            Or => And,
            And => Equality,
            Equality => Comparison,
            Comparison => Term,
            Term => Factor,
            Factor => Unary,
            Unary => Call,
            Call => Primary,
            Primary => Primary,
        }
    }
}

#[derive(Clone, Copy)]
enum ParseFn {
    Grouping,
    Unary,
    Binary,
    Number,
    StringLit,
    Literal,
    Variable,
    And,
    Or,
    Call,
}

struct ParseRule {
    prefix: Option<ParseFn>,
    infix: Option<ParseFn>,
    precedence: Precedence,
}

const fn rule(prefix: Option<ParseFn>, infix: Option<ParseFn>, precedence: Precedence) -> ParseRule {
    ParseRule { prefix, infix, precedence }
}

fn rule_for(tt: TokenType) -> ParseRule {
    use ParseFn::*;
    use Precedence as P;
    use TokenType::*;
    match tt {
        LEFT_PAREN => rule(Some(Grouping), Some(Call), P::Call),
        MINUS => rule(Some(Unary), Some(Binary), P::Term),
        PLUS => rule(None, Some(Binary), P::Term),
        SLASH => rule(None, Some(Binary), P::Factor),
        STAR => rule(None, Some(Binary), P::Factor),
        BANG => rule(Some(Unary), None, P::None),
        BANG_EQUAL => rule(None, Some(Binary), P::Equality),
        EQUAL_EQUAL => rule(None, Some(Binary), P::Equality),
        GREATER => rule(None, Some(Binary), P::Comparison),
        GREATER_EQUAL => rule(None, Some(Binary), P::Comparison),
        LESS => rule(None, Some(Binary), P::Comparison),
        LESS_EQUAL => rule(None, Some(Binary), P::Comparison),
        IDENTIFIER => rule(Some(Variable), None, P::None),
        STRING => rule(Some(StringLit), None, P::None),
        NUMBER => rule(Some(Number), None, P::None),
        AND => rule(None, Some(And), P::And),
        OR => rule(None, Some(Or), P::Or),
        FALSE | NIL | TRUE => rule(Some(Literal), None, P::None),
        _ => rule(None, None, P::None),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    Script,
    Function,
}

struct Local {
    name: String,
    /// `-1` while the initializer of this local is still compiling, so the
    /// local can't resolve a reference to itself (`var a = a;`).
    depth: i32,
}

struct FunctionState {
    function: FunctionObj,
    kind: FunctionKind,
    locals: Vec<Local>,
    scope_depth: i32,
}

pub struct Compiler<'a> {
    scanner: Scanner<'a>,
    previous: Token<'a>,
    current: Token<'a>,
    had_error: bool,
    panic_mode: bool,
    heap: &'a mut Heap,
    intern: &'a mut Table,
    functions: Vec<FunctionState>,
}

/// Compiles `source` into a `<script>` function, or `None` if any compile
/// error was reported. Interns string and identifier constants into `intern`
/// via `heap` as it goes, the way the bytecode it emits expects them already
/// interned when the VM runs it.
pub fn compile(source: &str, heap: &mut Heap, intern: &mut Table) -> Option<ObjRef> {
    let mut compiler = Compiler::new(source, heap, intern);
    compiler.advance();
    while !compiler.check(TokenType::EOF) {
        compiler.declaration();
    }
    let had_error = compiler.had_error;
    let function = compiler.end_compiler();
    if had_error {
        None
    } else {
        Some(compiler.heap.alloc(Object::Function(function)))
    }
}

impl<'a> Compiler<'a> {
    fn new(source: &'a str, heap: &'a mut Heap, intern: &'a mut Table) -> Self {
        let dummy = Token { token_type: TokenType::EOF, lexeme: "", line: 0 };
        Self {
            scanner: Scanner::new(source),
            previous: dummy,
            current: dummy,
            had_error: false,
            panic_mode: false,
            heap,
            intern,
            functions: vec![FunctionState {
                function: FunctionObj { arity: 0, chunk: Chunk::new(), name: None },
                kind: FunctionKind::Script,
                locals: vec![Local { name: String::new(), depth: 0 }],
                scope_depth: 0,
            }],
        }
    }

    fn current(&self) -> &FunctionState {
        self.functions.last().unwrap()
    }

    fn current_mut(&mut self) -> &mut FunctionState {
        self.functions.last_mut().unwrap()
    }

    fn current_chunk(&mut self) -> &mut Chunk {
        &mut self.functions.last_mut().unwrap().function.chunk
    }

    // --- token stream -----------------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.token_type != TokenType::ERR {
                break;
            }
            let message = self.current.lexeme.to_string();
            self.error_at_current(CompileErrorKind::Lexical(message));
        }
    }

    fn check(&self, tt: TokenType) -> bool {
        self.current.token_type == tt
    }

    fn match_token(&mut self, tt: TokenType) -> bool {
        if !self.check(tt) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, tt: TokenType, kind: CompileErrorKind) {
        if self.current.token_type == tt {
            self.advance();
        } else {
            self.error_at_current(kind);
        }
    }

    // --- error reporting ----------------------------------------------------

    fn error(&mut self, kind: CompileErrorKind) {
        self.error_at(self.previous, kind);
    }

    fn error_at_current(&mut self, kind: CompileErrorKind) {
        self.error_at(self.current, kind);
    }

    fn error_at(&mut self, token: Token<'a>, kind: CompileErrorKind) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;

        let location = match token.token_type {
            TokenType::EOF => " at end".to_string(),
            TokenType::ERR => String::new(),
            _ => format!(" at '{}'", token.lexeme),
        };
        eprintln!("[line {}], Error{}: {}", token.line, location, kind);
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.token_type != TokenType::EOF {
            if self.previous.token_type == TokenType::SEMICOLON {
                return;
            }
            match self.current.token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }
            self.advance();
        }
    }

    // --- bytecode emission --------------------------------------------------

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.current_chunk().write_byte(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        let line = self.previous.line;
        self.current_chunk().write_op(op, line);
    }

    fn emit_bytes(&mut self, op: OpCode, byte: u8) {
        self.emit_op(op);
        self.emit_byte(byte);
    }

    fn emit_return(&mut self) {
        self.emit_op(OpCode::OP_NIL);
        self.emit_op(OpCode::OP_RETURN);
    }

    fn emit_constant(&mut self, value: Value) {
        match self.current_chunk().add_constant(value) {
            Ok(idx) => self.emit_bytes(OpCode::OP_CONSTANT, idx),
            Err(_) => self.error(CompileErrorKind::TooManyConstants),
        }
    }

    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        let line = self.previous.line;
        self.current_chunk().write_placeholder(line)
    }

    fn patch_jump(&mut self, at: usize) {
        let chunk = self.current_chunk();
        let distance = chunk.code.len() - at - 2;
        if distance > MAX_JUMP {
            self.error(CompileErrorKind::JumpTooFar);
            return;
        }
        self.current_chunk().patch_u16(at, distance as u16);
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(OpCode::OP_LOOP);
        let distance = self.current_chunk().code.len() - loop_start + 2;
        if distance > MAX_JUMP {
            self.error(CompileErrorKind::LoopBodyTooLarge);
        }
        let bytes = (distance as u16).to_be_bytes();
        self.emit_byte(bytes[0]);
        self.emit_byte(bytes[1]);
    }

    fn end_compiler(&mut self) -> FunctionObj {
        self.emit_return();
        self.functions.pop().unwrap().function
    }

    // --- interning -----------------------------------------------------------

    fn intern_string(&mut self, s: &str) -> ObjRef {
        let hash = fnv1a_hash(s.as_bytes());
        if let Some(existing) = self.intern.find_string(&*self.heap, s.as_bytes(), hash) {
            return existing;
        }
        let r = self.heap.alloc(Object::Str(StringObj { bytes: s.into(), hash }));
        self.intern.set(r, hash, Value::Nil);
        r
    }

    fn identifier_constant(&mut self, name: &str) -> u8 {
        let r = self.intern_string(name);
        match self.current_chunk().add_constant(Value::Object(r)) {
            Ok(idx) => idx,
            Err(_) => {
                self.error(CompileErrorKind::TooManyConstants);
                0
            }
        }
    }

    // --- scopes and locals ----------------------------------------------------

    fn begin_scope(&mut self) {
        self.current_mut().scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.current_mut().scope_depth -= 1;
        loop {
            let should_pop = match self.current().locals.last() {
                Some(local) => local.depth > self.current().scope_depth,
                None => false,
            };
            if !should_pop {
                break;
            }
            self.emit_op(OpCode::OP_POP);
            self.current_mut().locals.pop();
        }
    }

    fn add_local(&mut self, name: String) {
        if self.current().locals.len() >= LOCALS_MAX {
            self.error(CompileErrorKind::TooManyLocals);
            return;
        }
        self.current_mut().locals.push(Local { name, depth: -1 });
    }

    fn declare_variable(&mut self) {
        if self.current().scope_depth == 0 {
            return;
        }
        let name = self.previous.lexeme.to_string();
        let scope_depth = self.current().scope_depth;
        for local in self.current().locals.iter().rev() {
            if local.depth != -1 && local.depth < scope_depth {
                break;
            }
            if local.name == name {
                self.error(CompileErrorKind::DuplicateLocal);
                return;
            }
        }
        self.add_local(name);
    }

    fn mark_initialized(&mut self) {
        if self.current().scope_depth == 0 {
            return;
        }
        let depth = self.current().scope_depth;
        self.current_mut().locals.last_mut().unwrap().depth = depth;
    }

    fn resolve_local(&mut self, name: &str) -> Option<u8> {
        let locals = &self.current().locals;
        let mut found: Option<(usize, i32)> = None;
        for idx in (0..locals.len()).rev() {
            if locals[idx].name == name {
                found = Some((idx, locals[idx].depth));
                break;
            }
        }
        match found {
            Some((idx, depth)) => {
                if depth == -1 {
                    self.error(CompileErrorKind::ReadLocalInOwnInitializer);
                }
                Some(idx as u8)
            }
            None => None,
        }
    }

    fn parse_variable(&mut self, kind: CompileErrorKind) -> u8 {
        self.consume(TokenType::IDENTIFIER, kind);
        self.declare_variable();
        if self.current().scope_depth > 0 {
            return 0;
        }
        let name = self.previous.lexeme;
        self.identifier_constant(name)
    }

    fn define_variable(&mut self, global: u8) {
        if self.current().scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        self.emit_bytes(OpCode::OP_DEFINE_GLOBAL, global);
    }

    fn named_variable(&mut self, name_token: Token<'a>, can_assign: bool) {
        let (get_op, set_op, arg) = if let Some(slot) = self.resolve_local(name_token.lexeme) {
            (OpCode::OP_GET_LOCAL, OpCode::OP_SET_LOCAL, slot)
        } else {
            let idx = self.identifier_constant(name_token.lexeme);
            (OpCode::OP_GET_GLOBAL, OpCode::OP_SET_GLOBAL, idx)
        };

        if can_assign && self.match_token(TokenType::EQUAL) {
            self.expression();
            self.emit_bytes(set_op, arg);
        } else {
            self.emit_bytes(get_op, arg);
        }
    }

    // --- Pratt dispatch ---------------------------------------------------

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let prefix = rule_for(self.previous.token_type).prefix;
        let can_assign = precedence <= Precedence::Assignment;
        match prefix {
            Some(f) => self.call_parse_fn(f, can_assign),
            None => {
                self.error(CompileErrorKind::ExpectExpression);
                return;
            }
        }

        while precedence <= rule_for(self.current.token_type).precedence {
            self.advance();
            if let Some(f) = rule_for(self.previous.token_type).infix {
                self.call_parse_fn(f, can_assign);
            }
        }

        if can_assign && self.match_token(TokenType::EQUAL) {
            self.error(CompileErrorKind::InvalidAssignmentTarget);
        }
    }

    fn call_parse_fn(&mut self, f: ParseFn, can_assign: bool) {
        match f {
            ParseFn::Grouping => self.grouping(),
            ParseFn::Unary => self.unary(),
            ParseFn::Binary => self.binary(),
            ParseFn::Number => self.number(),
            ParseFn::StringLit => self.string_literal(),
            ParseFn::Literal => self.literal(),
            ParseFn::Variable => self.variable(can_assign),
            ParseFn::And => self.and_(),
            ParseFn::Or => self.or_(),
            ParseFn::Call => self.call(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenType::RIGHT_PAREN, CompileErrorKind::ExpectRightParenAfterExpression);
    }

    fn unary(&mut self) {
        let op_type = self.previous.token_type;
        self.parse_precedence(Precedence::Unary);
        match op_type {
            TokenType::BANG => self.emit_op(OpCode::OP_NOT),
            TokenType::MINUS => self.emit_op(OpCode::OP_NEGATE),
            _ => unreachable!(),
        }
    }

    fn binary(&mut self) {
        let op_type = self.previous.token_type;
        let next_prec = rule_for(op_type).precedence.next();
        self.parse_precedence(next_prec);
        match op_type {
            TokenType::PLUS => self.emit_op(OpCode::OP_ADD),
            TokenType::MINUS => self.emit_op(OpCode::OP_SUBTRACT),
            TokenType::STAR => self.emit_op(OpCode::OP_MULTIPLY),
            TokenType::SLASH => self.emit_op(OpCode::OP_DIVIDE),
            TokenType::BANG_EQUAL => self.emit_op(OpCode::OP_NOT_EQUAL),
            TokenType::EQUAL_EQUAL => self.emit_op(OpCode::OP_EQUAL),
            TokenType::GREATER => self.emit_op(OpCode::OP_GREATER),
            TokenType::GREATER_EQUAL => self.emit_op(OpCode::OP_GREATER_EQUAL),
            TokenType::LESS => self.emit_op(OpCode::OP_LESS),
            TokenType::LESS_EQUAL => self.emit_op(OpCode::OP_LESS_EQUAL),
            _ => unreachable!(),
        }
    }

    fn number(&mut self) {
        let value: f64 = self.previous.lexeme.parse().unwrap_or(0.0);
        self.emit_constant(Value::Number(value));
    }

    fn string_literal(&mut self) {
        let lexeme = self.previous.lexeme;
        let contents = &lexeme[1..lexeme.len() - 1];
        let r = self.intern_string(contents);
        self.emit_constant(Value::Object(r));
    }

    fn literal(&mut self) {
        match self.previous.token_type {
            TokenType::FALSE => self.emit_op(OpCode::OP_FALSE),
            TokenType::NIL => self.emit_op(OpCode::OP_NIL),
            TokenType::TRUE => self.emit_op(OpCode::OP_TRUE),
            _ => unreachable!(),
        }
    }

    fn variable(&mut self, can_assign: bool) {
        let name_token = self.previous;
        self.named_variable(name_token, can_assign);
    }

    fn and_(&mut self) {
        let end_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
        self.emit_op(OpCode::OP_POP);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    fn or_(&mut self) {
        let else_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
        let end_jump = self.emit_jump(OpCode::OP_JUMP);
        self.patch_jump(else_jump);
        self.emit_op(OpCode::OP_POP);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn call(&mut self) {
        let argc = self.argument_list();
        self.emit_bytes(OpCode::OP_CALL, argc);
    }

    fn argument_list(&mut self) -> u8 {
        let mut argc: u8 = 0;
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                self.expression();
                if argc == u8::MAX {
                    self.error(CompileErrorKind::TooManyArguments);
                } else {
                    argc += 1;
                }
                if !self.match_token(TokenType::COMMA) {
                    break;
                }
            }
        }
        self.consume(TokenType::RIGHT_PAREN, CompileErrorKind::ExpectRightParenAfterArguments);
        argc
    }

    // --- declarations and statements ----------------------------------------

    fn declaration(&mut self) {
        if self.match_token(TokenType::FUN) {
            self.fun_declaration();
        } else if self.match_token(TokenType::VAR) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn fun_declaration(&mut self) {
        let global = self.parse_variable(CompileErrorKind::ExpectFunctionName);
        self.mark_initialized();
        self.compile_function(FunctionKind::Function);
        self.define_variable(global);
    }

    fn compile_function(&mut self, kind: FunctionKind) {
        let name = self.previous.lexeme.to_string();
        self.functions.push(FunctionState {
            function: FunctionObj { arity: 0, chunk: Chunk::new(), name: Some(name) },
            kind,
            locals: vec![Local { name: String::new(), depth: 0 }],
            scope_depth: 0,
        });
        self.begin_scope();

        self.consume(TokenType::LEFT_PAREN, CompileErrorKind::ExpectLeftParenAfterFunctionName);
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if self.current().function.arity == u8::MAX {
                    self.error_at_current(CompileErrorKind::TooManyParameters);
                } else {
                    self.current_mut().function.arity += 1;
                }
                let param_const = self.parse_variable(CompileErrorKind::ExpectParameterName);
                self.define_variable(param_const);
                if !self.match_token(TokenType::COMMA) {
                    break;
                }
            }
        }
        self.consume(TokenType::RIGHT_PAREN, CompileErrorKind::ExpectRightParenAfterParameters);
        self.consume(TokenType::LEFT_BRACE, CompileErrorKind::ExpectLeftBraceBeforeFunctionBody);
        self.block();

        let function = self.end_compiler();
        let obj_ref = self.heap.alloc(Object::Function(function));
        match self.current_chunk().add_constant(Value::Object(obj_ref)) {
            Ok(idx) => self.emit_bytes(OpCode::OP_CONSTANT, idx),
            Err(_) => self.error(CompileErrorKind::TooManyConstants),
        }
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable(CompileErrorKind::ExpectVariableName);

        if self.match_token(TokenType::EQUAL) {
            self.expression();
        } else {
            self.emit_op(OpCode::OP_NIL);
        }
        self.consume(TokenType::SEMICOLON, CompileErrorKind::ExpectSemicolonAfterVarDecl);
        self.define_variable(global);
    }

    fn statement(&mut self) {
        if self.match_token(TokenType::PRINT) {
            self.print_statement();
        } else if self.match_token(TokenType::IF) {
            self.if_statement();
        } else if self.match_token(TokenType::WHILE) {
            self.while_statement();
        } else if self.match_token(TokenType::FOR) {
            self.for_statement();
        } else if self.match_token(TokenType::RETURN) {
            self.return_statement();
        } else if self.match_token(TokenType::LEFT_BRACE) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn block(&mut self) {
        while !self.check(TokenType::RIGHT_BRACE) && !self.check(TokenType::EOF) {
            self.declaration();
        }
        self.consume(TokenType::RIGHT_BRACE, CompileErrorKind::ExpectRightBraceAfterBlock);
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenType::SEMICOLON, CompileErrorKind::ExpectSemicolonAfterValue);
        self.emit_op(OpCode::OP_PRINT);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenType::SEMICOLON, CompileErrorKind::ExpectSemicolonAfterExpressionStatement);
        self.emit_op(OpCode::OP_POP);
    }

    fn if_statement(&mut self) {
        self.consume(TokenType::LEFT_PAREN, CompileErrorKind::ExpectLeftParenAfterIf);
        self.expression();
        self.consume(TokenType::RIGHT_PAREN, CompileErrorKind::ExpectRightParenAfterCondition);

        let then_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
        self.emit_op(OpCode::OP_POP);
        self.statement();

        let else_jump = self.emit_jump(OpCode::OP_JUMP);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::OP_POP);

        if self.match_token(TokenType::ELSE) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.current_chunk().code.len();
        self.consume(TokenType::LEFT_PAREN, CompileErrorKind::ExpectLeftParenAfterWhile);
        self.expression();
        self.consume(TokenType::RIGHT_PAREN, CompileErrorKind::ExpectRightParenAfterCondition);

        let exit_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
        self.emit_op(OpCode::OP_POP);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::OP_POP);
    }

    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenType::LEFT_PAREN, CompileErrorKind::ExpectLeftParenAfterFor);

        if self.match_token(TokenType::SEMICOLON) {
            // no initializer
        } else if self.match_token(TokenType::VAR) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.current_chunk().code.len();
        let mut exit_jump: Option<usize> = None;
        if !self.match_token(TokenType::SEMICOLON) {
            self.expression();
            self.consume(TokenType::SEMICOLON, CompileErrorKind::ExpectSemicolonAfterLoopCondition);
            exit_jump = Some(self.emit_jump(OpCode::OP_JUMP_IF_FALSE));
            self.emit_op(OpCode::OP_POP);
        }

        if !self.match_token(TokenType::RIGHT_PAREN) {
            let body_jump = self.emit_jump(OpCode::OP_JUMP);
            let increment_start = self.current_chunk().code.len();
            self.expression();
            self.emit_op(OpCode::OP_POP);
            self.consume(TokenType::RIGHT_PAREN, CompileErrorKind::ExpectRightParenAfterForClauses);

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(OpCode::OP_POP);
        }

        self.end_scope();
    }

    fn return_statement(&mut self) {
        if self.current().kind == FunctionKind::Script {
            self.error(CompileErrorKind::ReturnFromTopLevel);
        }

        if self.match_token(TokenType::SEMICOLON) {
            self.emit_return();
        } else {
            self.expression();
            self.consume(TokenType::SEMICOLON, CompileErrorKind::ExpectSemicolonAfterReturnValue);
            self.emit_op(OpCode::OP_RETURN);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_ok(source: &str) -> bool {
        let mut heap = Heap::new();
        let mut intern = Table::new();
        compile(source, &mut heap, &mut intern).is_some()
    }

    #[test]
    fn simple_expression_statement_compiles() {
        assert!(compile_ok("print 1 + 2 * 3;"));
    }

    #[test]
    fn self_referencing_local_initializer_is_an_error() {
        assert!(!compile_ok("{ var a = a; }"));
    }

    #[test]
    fn return_at_top_level_is_an_error() {
        assert!(!compile_ok("return 1;"));
    }

    #[test]
    fn undefined_syntax_reports_compile_error() {
        assert!(!compile_ok("var;"));
    }

    #[test]
    fn too_many_locals_is_a_compile_error() {
        let mut source = String::from("{\n");
        for i in 0..257 {
            source.push_str(&format!("var v{i} = {i};\n"));
        }
        source.push_str("}\n");
        assert!(!compile_ok(&source));
    }

    #[test]
    fn function_declarations_and_calls_compile() {
        assert!(compile_ok("fun add(a, b) { return a + b; } print add(1, 2);"));
    }
}
