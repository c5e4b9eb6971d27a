use alloc::string::String;
use core::fmt::Display;

/// Errors that can occur while encoding a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A negative value was passed where an unsigned integer is required
    NegativeValue(i64),

    /// A count or length does not fit the format's 32-bit limit
    LengthOverflow {
        /// What was being measured
        what: &'static str,
        /// The offending length
        len: usize,
    },

    /// A function import was added after a function had already been defined
    ///
    /// Imported functions occupy the lowest function indices, so this would
    /// shift every index handed out before.
    ImportAfterDefinition {
        /// The import module name
        module: String,
        /// The import field name
        name: String,
    },

    /// The same export name was used twice
    DuplicateExport(String),

    /// An export or start entry references a function that does not exist
    UnknownFunction(u32),

    /// An export or data segment references a memory that does not exist
    UnknownMemory(u32),

    /// A function type declares more than one result
    UnsupportedMultiValue {
        /// The number of declared results
        results: usize,
    },
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NegativeValue(value) => write!(f, "cannot encode negative value {value} as unsigned"),
            Self::LengthOverflow { what, len } => write!(f, "{what} length {len} exceeds u32::MAX"),
            Self::ImportAfterDefinition { module, name } => {
                write!(f, "function import {module}.{name} added after a function was defined")
            }
            Self::DuplicateExport(name) => write!(f, "duplicate export name: {name}"),
            Self::UnknownFunction(index) => write!(f, "unknown function: index={index}"),
            Self::UnknownMemory(index) => write!(f, "unknown memory: index={index}"),
            Self::UnsupportedMultiValue { results } => {
                write!(f, "unsupported feature: multi-value ({results} results)")
            }
        }
    }
}

impl core::error::Error for EncodeError {}

/// A wrapper around [`core::result::Result`] for encoder operations
pub type Result<T, E = EncodeError> = core::result::Result<T, E>;
