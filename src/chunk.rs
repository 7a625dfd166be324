//! A function's compiled body: the byte-code stream, a parallel line table
//! for error reporting, and a constant pool. Shape grounded on
//! `hinton-lang-Hinton/src/chunk/mod.rs`; the opcode set is the spec's §4.3
//! bytecode contract, named in the teacher's `OP_SNAKE_CASE` convention
//! (`src/chunk/op_codes.rs`).

use num_derive::FromPrimitive;

use crate::value::Value;

/// Constant pool indices and jump-patch slots are single bytes / big-endian
/// shorts respectively — these are the hard caps the compiler enforces.
pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;
pub const MAX_JUMP: usize = u16::MAX as usize;

#[allow(non_camel_case_types)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    OP_CONSTANT,
    OP_NIL,
    OP_TRUE,
    OP_FALSE,
    OP_POP,
    OP_GET_LOCAL,
    OP_SET_LOCAL,
    OP_GET_GLOBAL,
    OP_DEFINE_GLOBAL,
    OP_SET_GLOBAL,
    OP_EQUAL,
    OP_NOT_EQUAL,
    OP_GREATER,
    OP_GREATER_EQUAL,
    OP_LESS,
    OP_LESS_EQUAL,
    OP_ADD,
    OP_SUBTRACT,
    OP_MULTIPLY,
    OP_DIVIDE,
    OP_NOT,
    OP_NEGATE,
    OP_PRINT,
    OP_JUMP,
    OP_JUMP_IF_FALSE,
    OP_LOOP,
    OP_CALL,
    OP_RETURN,
}

impl OpCode {
    pub fn from_byte(byte: u8) -> Option<OpCode> {
        num_traits::FromPrimitive::from_u8(byte)
    }
}

/// Raised when the compiler tries to exceed one of the chunk's fixed-size
/// limits (constant pool, jump distance).
#[derive(Debug, PartialEq, Eq)]
pub enum ChunkError {
    TooManyConstants,
    JumpTooFar,
}

#[derive(Default)]
pub struct Chunk {
    pub code: Vec<u8>,
    /// One source line per byte in `code` — parallel and equal length by
    /// invariant, used only for error reporting, never read at dispatch
    /// speed.
    pub lines: Vec<u32>,
    pub constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op as u8, line);
    }

    /// Writes a big-endian `u16` placeholder (`0xff 0xff`) and returns the
    /// index of its first byte, for later patching by [`patch_u16`].
    pub fn write_placeholder(&mut self, line: u32) -> usize {
        self.write_byte(0xff, line);
        self.write_byte(0xff, line);
        self.code.len() - 2
    }

    pub fn patch_u16(&mut self, at: usize, value: u16) {
        let bytes = value.to_be_bytes();
        self.code[at] = bytes[0];
        self.code[at + 1] = bytes[1];
    }

    pub fn read_u16(&self, at: usize) -> u16 {
        u16::from_be_bytes([self.code[at], self.code[at + 1]])
    }

    pub fn add_constant(&mut self, value: Value) -> Result<u8, ChunkError> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(ChunkError::TooManyConstants);
        }
        self.constants.push(value);
        Ok((self.constants.len() - 1) as u8)
    }

    pub fn line_at(&self, offset: usize) -> u32 {
        self.lines.get(offset).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_lines_stay_parallel() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::OP_NIL, 1);
        chunk.write_op(OpCode::OP_RETURN, 1);
        assert_eq!(chunk.code.len(), chunk.lines.len());
    }

    #[test]
    fn jump_patch_round_trips() {
        let mut chunk = Chunk::new();
        let at = chunk.write_placeholder(1);
        chunk.patch_u16(at, 42);
        assert_eq!(chunk.read_u16(at), 42);
    }

    #[test]
    fn constant_pool_caps_at_256() {
        let mut chunk = Chunk::new();
        for _ in 0..MAX_CONSTANTS {
            assert!(chunk.add_constant(Value::Nil).is_ok());
        }
        assert_eq!(chunk.add_constant(Value::Nil), Err(ChunkError::TooManyConstants));
    }

    #[test]
    fn opcode_round_trips_through_u8() {
        assert_eq!(OpCode::from_byte(OpCode::OP_RETURN as u8), Some(OpCode::OP_RETURN));
    }
}
