//! The contract between assembled module bytes and whatever executes them.
//!
//! [`TinywasmEngine`] is the bundled implementation.

use wasmwright_encoder::FuncType;

use crate::{HostImports, Result, Value};

mod interpreter;
mod reader;

pub use interpreter::{CompiledModule, TinywasmEngine, TinywasmInstance};

/// Compiles module bytes and instantiates them against a host import table
pub trait Engine {
    /// A validated, not yet instantiated module
    type Module;

    /// A live module instance
    type Instance: Instance;

    /// Validate and compile module bytes
    ///
    /// Fails with [`crate::Error::Structural`] if the bytes are not a well-formed module.
    fn compile(&self, bytes: Vec<u8>) -> Result<Self::Module>;

    /// Link every import of `module` against `imports` and instantiate it
    ///
    /// A start function runs before this returns.
    /// Fails with [`crate::Error::Link`] if an import can't be resolved.
    fn instantiate(&self, module: Self::Module, imports: &HostImports) -> Result<Self::Instance>;
}

/// An instantiated module
pub trait Instance {
    /// The signature of the function exported as `name`, if there is one
    fn export_type(&self, name: &str) -> Option<&FuncType>;

    /// Call the function exported as `name`
    ///
    /// Arguments are not checked here, see [`crate::invoke`].
    fn call(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>>;
}

impl<I: Instance + ?Sized> Instance for Box<I> {
    fn export_type(&self, name: &str) -> Option<&FuncType> {
        (**self).export_type(name)
    }

    fn call(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        (**self).call(name, args)
    }
}
