use alloc::{boxed::Box, vec::Vec};

use crate::{Result, leb};

/// A WebAssembly value type.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#value-types>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValType {
    /// A 32-bit integer.
    I32 = 0x7F,
    /// A 64-bit integer.
    I64 = 0x7E,
    /// A 32-bit float.
    F32 = 0x7D,
    /// A 64-bit float.
    F64 = 0x7C,
}

impl ValType {
    /// The single byte this type is encoded as
    pub const fn to_byte(self) -> u8 {
        self as u8
    }
}

/// A function signature.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#function-types>
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncType {
    /// Parameter types, in positional order.
    pub params: Box<[ValType]>,
    /// Result types.
    pub results: Box<[ValType]>,
}

impl FuncType {
    pub(crate) const FORM: u8 = 0x60;

    /// Create a new function type
    pub fn new(params: &[ValType], results: &[ValType]) -> Self {
        Self { params: params.into(), results: results.into() }
    }

    /// Create a function type without parameters or results
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.push(Self::FORM);
        write_types(buf, &self.params)?;
        write_types(buf, &self.results)
    }
}

fn write_types(buf: &mut Vec<u8>, types: &[ValType]) -> Result<()> {
    leb::write_len(buf, types.len(), "value type vector")?;
    buf.extend(types.iter().map(|ty| ty.to_byte()));
    Ok(())
}

/// Limits of a linear memory, in 64KiB pages.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#memory-types>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryType {
    /// Initial number of pages.
    pub min: u32,
    /// Optional maximum number of pages.
    pub max: Option<u32>,
}

impl MemoryType {
    /// A memory with `min` initial pages and no maximum
    pub const fn new(min: u32) -> Self {
        Self { min, max: None }
    }

    /// A memory bounded by `min` and `max` pages
    pub const fn bounded(min: u32, max: u32) -> Self {
        Self { min, max: Some(max) }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        match self.max {
            None => {
                buf.push(0x00);
                leb::write_unsigned(buf, u64::from(self.min));
            }
            Some(max) => {
                buf.push(0x01);
                leb::write_unsigned(buf, u64::from(self.min));
                leb::write_unsigned(buf, u64::from(max));
            }
        }
    }
}

/// The kind of an export.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#export-section>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExternalKind {
    /// A function.
    Func = 0x00,
    /// A table.
    Table = 0x01,
    /// A linear memory.
    Memory = 0x02,
    /// A global.
    Global = 0x03,
}
