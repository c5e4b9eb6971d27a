//! Typed builders for the sections this crate can emit.
//!
//! Every vector-shaped payload starts with its encoded entry count, so an empty
//! section encodes to a single `0x00` payload byte.

use alloc::{string::String, vec::Vec};

use crate::section::{SectionEncoder, SectionId};
use crate::{END, ExternalKind, FuncType, Instruction, MemoryType, Result, ValType, encode_instructions, leb};

fn write_vec<T>(
    buf: &mut Vec<u8>,
    items: &[T],
    what: &'static str,
    mut f: impl FnMut(&mut Vec<u8>, &T) -> Result<()>,
) -> Result<()> {
    leb::write_len(buf, items.len(), what)?;
    items.iter().try_for_each(|item| f(buf, item))
}

/// Function signatures, referenced by index from the import and function sections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSection {
    pub types: Vec<FuncType>,
}

impl SectionEncoder for TypeSection {
    const ID: SectionId = SectionId::Type;

    fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_vec(buf, &self.types, "type section", |buf, ty| ty.encode(buf))
    }
}

/// A function imported from the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub type_index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSection {
    pub imports: Vec<Import>,
}

impl SectionEncoder for ImportSection {
    const ID: SectionId = SectionId::Import;

    fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_vec(buf, &self.imports, "import section", |buf, import| {
            leb::write_name(buf, &import.module)?;
            leb::write_name(buf, &import.name)?;
            buf.push(ExternalKind::Func as u8);
            leb::write_unsigned(buf, u64::from(import.type_index));
            Ok(())
        })
    }
}

/// Type index of every function defined in the module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionSection {
    pub type_indices: Vec<u32>,
}

impl SectionEncoder for FunctionSection {
    const ID: SectionId = SectionId::Function;

    fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_vec(buf, &self.type_indices, "function section", |buf, idx| {
            leb::write_unsigned(buf, u64::from(*idx));
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySection {
    pub memories: Vec<MemoryType>,
}

impl SectionEncoder for MemorySection {
    const ID: SectionId = SectionId::Memory;

    fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_vec(buf, &self.memories, "memory section", |buf, mem| {
            mem.encode(buf);
            Ok(())
        })
    }
}

/// A name bound to an index in one of the module's index spaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub kind: ExternalKind,
    pub index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSection {
    pub exports: Vec<Export>,
}

impl SectionEncoder for ExportSection {
    const ID: SectionId = SectionId::Export;

    fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_vec(buf, &self.exports, "export section", |buf, export| {
            leb::write_name(buf, &export.name)?;
            buf.push(export.kind as u8);
            leb::write_unsigned(buf, u64::from(export.index));
            Ok(())
        })
    }
}

/// The function run on instantiation
///
/// Unlike the other sections this is a single index, not a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartSection {
    pub func_index: u32,
}

impl SectionEncoder for StartSection {
    const ID: SectionId = SectionId::Start;

    fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()> {
        leb::write_unsigned(buf, u64::from(self.func_index));
        Ok(())
    }
}

/// A function body
///
/// The closing `end` is added during encoding and must not be part of `instructions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Function {
    /// Local declarations as `(count, type)` runs, excluding parameters
    pub locals: Vec<(u32, ValType)>,
    pub instructions: Vec<Instruction>,
}

impl Function {
    /// A body without additional locals
    pub fn new(instructions: impl IntoIterator<Item = Instruction>) -> Self {
        Self { locals: Vec::new(), instructions: instructions.into_iter().collect() }
    }

    /// Declare `count` additional locals of type `ty`
    pub fn with_locals(mut self, count: u32, ty: ValType) -> Self {
        self.locals.push((count, ty));
        self
    }

    /// Append the body, prefixed with its byte size
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut body = Vec::new();
        write_vec(&mut body, &self.locals, "local declarations", |body, (count, ty)| {
            leb::write_unsigned(body, u64::from(*count));
            body.push(ty.to_byte());
            Ok(())
        })?;
        body.extend(encode_instructions(&self.instructions));
        body.push(END);

        leb::write_len(buf, body.len(), "function body")?;
        buf.extend_from_slice(&body);
        Ok(())
    }
}

/// One body per defined function, in function section order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeSection {
    pub bodies: Vec<Function>,
}

impl SectionEncoder for CodeSection {
    const ID: SectionId = SectionId::Code;

    fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_vec(buf, &self.bodies, "code section", |buf, body| body.encode(buf))
    }
}

/// An active data segment for memory 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSegment {
    /// Byte offset the data is copied to during instantiation
    pub offset: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSection {
    pub segments: Vec<DataSegment>,
}

impl SectionEncoder for DataSection {
    const ID: SectionId = SectionId::Data;

    fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_vec(buf, &self.segments, "data section", |buf, segment| {
            // flags: active, memory 0
            buf.push(0x00);
            // the offset expression is an i32 even though the offset itself is unsigned
            Instruction::I32Const(segment.offset as i32).encode(buf);
            buf.push(END);
            leb::write_len(buf, segment.data.len(), "data segment")?;
            buf.extend_from_slice(&segment.data);
            Ok(())
        })
    }
}

/// A named section ignored by engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSection {
    pub name: String,
    pub data: Vec<u8>,
}

impl SectionEncoder for CustomSection {
    const ID: SectionId = SectionId::Custom;

    fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()> {
        leb::write_name(buf, &self.name)?;
        buf.extend_from_slice(&self.data);
        Ok(())
    }
}
