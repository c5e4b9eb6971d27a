use std::fmt::Display;

use wasmwright_encoder::{EncodeError, ValType};

use crate::HostError;

/// Errors that can occur while building, loading or invoking a module
///
/// Every stage reports its own variants and nothing is retried: a malformed
/// module is a deterministic defect, so the first error ends the run.
#[derive(Debug)]
pub enum Error {
    /// The module could not be encoded
    Encoding(EncodeError),

    /// The engine rejected the module bytes (bad preamble, malformed section, type or index mismatch)
    Structural {
        /// Description of the problem
        message: String,
        /// Byte offset into the module where it was detected
        offset: usize,
    },

    /// A declared import could not be linked
    Link(LinkError),

    /// No function is exported under this name
    ExportNotFound(String),

    /// The number of arguments does not match the export's parameter count
    ArityMismatch {
        /// The export name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Number of arguments passed
        actual: usize,
    },

    /// An argument's type does not match the declared parameter type
    ArgumentType {
        /// The export name
        name: String,
        /// Position of the argument
        index: usize,
        /// Declared parameter type
        expected: ValType,
        /// Type of the passed value
        actual: ValType,
    },

    /// A host function failed
    Host(HostError),

    /// A WebAssembly feature outside of the supported subset was encountered
    UnsupportedFeature(String),

    /// The execution engine reported an error, e.g. a trap
    Engine(tinywasm::Error),
}

/// Errors that can occur when linking a module against a [`crate::HostImports`] table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// No host function is registered under this name pair
    UnknownImport {
        /// The module name
        module: String,
        /// The field name
        name: String,
    },

    /// A host function is registered, but its kind or signature does not match the import
    IncompatibleImportType {
        /// The module name
        module: String,
        /// The field name
        name: String,
    },
}

impl LinkError {
    /// Get the message of the linking error
    pub fn message(&self) -> &'static str {
        match self {
            Self::UnknownImport { .. } => "unknown import",
            Self::IncompatibleImportType { .. } => "incompatible import type",
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoding(err) => write!(f, "encoding error: {err}"),
            Self::Structural { message, offset } => {
                write!(f, "malformed module: {message} at offset {offset}")
            }
            Self::Link(err) => write!(f, "linking error: {err}"),
            Self::ExportNotFound(name) => write!(f, "export not found: {name}"),
            Self::ArityMismatch { name, expected, actual } => {
                write!(f, "arity mismatch calling {name}: expected {expected} arguments, got {actual}")
            }
            Self::ArgumentType { name, index, expected, actual } => {
                write!(f, "argument {index} of {name} has type {actual:?}, expected {expected:?}")
            }
            Self::Host(err) => write!(f, "host function error: {err}"),
            Self::UnsupportedFeature(feature) => write!(f, "unsupported feature: {feature}"),
            Self::Engine(err) => write!(f, "engine error: {err}"),
        }
    }
}

impl Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownImport { module, name } | Self::IncompatibleImportType { module, name } => {
                write!(f, "{}: {module}.{name}", self.message())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encoding(err) => Some(err),
            Self::Link(err) => Some(err),
            Self::Host(err) => Some(err),
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for LinkError {}

impl From<EncodeError> for Error {
    fn from(value: EncodeError) -> Self {
        Self::Encoding(value)
    }
}

impl From<LinkError> for Error {
    fn from(value: LinkError) -> Self {
        Self::Link(value)
    }
}

impl From<HostError> for Error {
    fn from(value: HostError) -> Self {
        Self::Host(value)
    }
}

impl From<wasmparser::BinaryReaderError> for Error {
    fn from(value: wasmparser::BinaryReaderError) -> Self {
        Self::Structural { message: value.message().to_string(), offset: value.offset() }
    }
}

impl From<tinywasm::Error> for Error {
    fn from(value: tinywasm::Error) -> Self {
        use tinywasm::LinkingError;

        match value {
            tinywasm::Error::Linker(LinkingError::UnknownImport { module, name }) => {
                Self::Link(LinkError::UnknownImport { module, name })
            }
            tinywasm::Error::Linker(LinkingError::IncompatibleImportType { module, name }) => {
                Self::Link(LinkError::IncompatibleImportType { module, name })
            }
            tinywasm::Error::ParseError(err) => Self::Structural { message: err.to_string(), offset: 0 },
            other => Self::Engine(other),
        }
    }
}

/// A wrapper around [`std::result::Result`] for wasmwright operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
