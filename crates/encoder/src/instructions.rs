use alloc::vec::Vec;

use crate::{ValType, leb};

/// The `end` opcode terminating blocks, function bodies and constant expressions
pub const END: u8 = 0x0B;

/// Immediate of memory instructions
///
/// `align` is the log2 of the access alignment in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemArg {
    pub align: u32,
    pub offset: u32,
}

impl MemArg {
    pub const fn new(align: u32, offset: u32) -> Self {
        Self { align, offset }
    }
}

/// Result type of a structured control instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockType {
    #[default]
    Empty,
    Value(ValType),
}

/// A single instruction together with its immediates
///
/// This covers the MVP subset needed for straight-line integer code, locals,
/// calls and linear memory access.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html>
#[derive(Debug, Clone, Copy, PartialEq)]
#[rustfmt::skip]
pub enum Instruction {
    // Control Instructions
    Unreachable, Nop,
    Block(BlockType), Loop(BlockType), If(BlockType), Else, End,
    Br(u32), BrIf(u32), Return, Call(u32),

    // Parametric Instructions
    Drop, Select,

    // Variable Instructions
    LocalGet(u32), LocalSet(u32), LocalTee(u32),

    // Memory Instructions
    I32Load(MemArg), I64Load(MemArg), I32Store(MemArg), I64Store(MemArg),
    MemorySize, MemoryGrow,

    // Numeric Instructions
    I32Const(i32), I64Const(i64), F32Const(f32), F64Const(f64),
    I32Eqz, I32Eq, I32Ne, I32LtS, I32LtU, I32GtS, I32GtU, I32LeS, I32GeS,
    I32Add, I32Sub, I32Mul, I32DivS, I32DivU, I32RemS, I32RemU, I32And, I32Or, I32Xor,
    I64Eqz, I64Add, I64Sub, I64Mul,
}

impl Instruction {
    /// Append the opcode and its immediates to `buf`
    pub fn encode(&self, buf: &mut Vec<u8>) {
        use Instruction::*;

        match *self {
            Block(ty) => block(buf, 0x02, ty),
            Loop(ty) => block(buf, 0x03, ty),
            If(ty) => block(buf, 0x04, ty),
            Br(depth) => indexed(buf, 0x0C, depth),
            BrIf(depth) => indexed(buf, 0x0D, depth),
            Call(func) => indexed(buf, 0x10, func),

            LocalGet(idx) => indexed(buf, 0x20, idx),
            LocalSet(idx) => indexed(buf, 0x21, idx),
            LocalTee(idx) => indexed(buf, 0x22, idx),

            I32Load(arg) => memory(buf, 0x28, arg),
            I64Load(arg) => memory(buf, 0x29, arg),
            I32Store(arg) => memory(buf, 0x36, arg),
            I64Store(arg) => memory(buf, 0x37, arg),
            // the trailing zero is the memory index
            MemorySize => buf.extend_from_slice(&[0x3F, 0x00]),
            MemoryGrow => buf.extend_from_slice(&[0x40, 0x00]),

            I32Const(value) => {
                buf.push(0x41);
                leb::write_signed(buf, i64::from(value));
            }
            I64Const(value) => {
                buf.push(0x42);
                leb::write_signed(buf, value);
            }
            F32Const(value) => {
                buf.push(0x43);
                buf.extend_from_slice(&value.to_le_bytes());
            }
            F64Const(value) => {
                buf.push(0x44);
                buf.extend_from_slice(&value.to_le_bytes());
            }

            simple => buf.push(simple.simple_opcode()),
        }
    }

    /// Opcode of instructions without immediates
    fn simple_opcode(self) -> u8 {
        use Instruction::*;

        match self {
            Unreachable => 0x00,
            Nop => 0x01,
            Else => 0x05,
            End => END,
            Return => 0x0F,
            Drop => 0x1A,
            Select => 0x1B,

            I32Eqz => 0x45,
            I32Eq => 0x46,
            I32Ne => 0x47,
            I32LtS => 0x48,
            I32LtU => 0x49,
            I32GtS => 0x4A,
            I32GtU => 0x4B,
            I32LeS => 0x4C,
            I32GeS => 0x4E,
            I64Eqz => 0x50,

            I32Add => 0x6A,
            I32Sub => 0x6B,
            I32Mul => 0x6C,
            I32DivS => 0x6D,
            I32DivU => 0x6E,
            I32RemS => 0x6F,
            I32RemU => 0x70,
            I32And => 0x71,
            I32Or => 0x72,
            I32Xor => 0x73,
            I64Add => 0x7C,
            I64Sub => 0x7D,
            I64Mul => 0x7E,

            other => unreachable!("{other:?} carries immediates"),
        }
    }
}

fn block(buf: &mut Vec<u8>, opcode: u8, ty: BlockType) {
    buf.push(opcode);
    match ty {
        BlockType::Empty => buf.push(0x40),
        BlockType::Value(ty) => buf.push(ty.to_byte()),
    }
}

fn indexed(buf: &mut Vec<u8>, opcode: u8, index: u32) {
    buf.push(opcode);
    leb::write_unsigned(buf, u64::from(index));
}

fn memory(buf: &mut Vec<u8>, opcode: u8, arg: MemArg) {
    buf.push(opcode);
    leb::write_unsigned(buf, u64::from(arg.align));
    leb::write_unsigned(buf, u64::from(arg.offset));
}

/// Encode an instruction sequence into a fresh buffer
pub fn encode_instructions<'a>(instructions: impl IntoIterator<Item = &'a Instruction>) -> Vec<u8> {
    let mut buf = Vec::new();
    instructions.into_iter().for_each(|instr| instr.encode(&mut buf));
    buf
}
