//! The build, compile, instantiate and invoke stages as consuming typestates.
//!
//! Each transition takes its input by value, so a stage that failed leaves
//! nothing behind that could be used by accident.
//!
//! ```
//! use wasmwright::encoder::{FuncType, Function, Instruction, ModuleBuilder, ValType};
//! use wasmwright::{HostImports, TinywasmEngine, Value, pipeline::Assembled};
//!
//! let mut builder = ModuleBuilder::new();
//! let ten = builder.func(FuncType::new(&[], &[ValType::I32]), Function::new([Instruction::I32Const(10)]));
//! builder.export_func("ten", ten);
//!
//! let engine = TinywasmEngine::new();
//! let mut instance = Assembled::from_builder(&builder)?.compile(&engine)?.instantiate(&HostImports::new())?;
//! assert_eq!(instance.invoke("ten", &[])?, vec![Value::I32(10)]);
//! # Ok::<(), wasmwright::Error>(())
//! ```

use std::fmt::Debug;

use wasmwright_encoder::ModuleBuilder;

use crate::log::debug;
use crate::{Engine, HostImports, Result, Value};

/// Encoded module bytes, ready to be compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    bytes: Vec<u8>,
}

impl Assembled {
    /// Wrap already encoded module bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Encode the module described by `builder`
    pub fn from_builder(builder: &ModuleBuilder) -> Result<Self> {
        Ok(Self::new(builder.build()?))
    }

    /// The encoded module
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hand the bytes to `engine` for validation and compilation
    pub fn compile<E: Engine>(self, engine: &E) -> Result<Compiled<'_, E>> {
        debug!("compiling {} bytes", self.bytes.len());
        Ok(Compiled { engine, module: engine.compile(self.bytes)? })
    }
}

impl From<Vec<u8>> for Assembled {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// A compiled module, bound to the engine that compiled it
pub struct Compiled<'e, E: Engine> {
    engine: &'e E,
    module: E::Module,
}

impl<E: Engine> Debug for Compiled<'_, E>
where
    E::Module: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiled").field("module", &self.module).finish()
    }
}

impl<'e, E: Engine> Compiled<'e, E> {
    /// The engine's compiled module
    pub fn module(&self) -> &E::Module {
        &self.module
    }

    /// Link the module against `imports` and instantiate it, running its start function
    pub fn instantiate(self, imports: &HostImports) -> Result<Instantiated<E>> {
        debug!("instantiating with {} host imports", imports.len());
        Ok(Instantiated { instance: self.engine.instantiate(self.module, imports)? })
    }
}

/// A live instance whose exports can be invoked
pub struct Instantiated<E: Engine> {
    instance: E::Instance,
}

impl<E: Engine> Debug for Instantiated<E>
where
    E::Instance: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instantiated").field("instance", &self.instance).finish()
    }
}

impl<E: Engine> Instantiated<E> {
    /// Call an exported function, see [`crate::invoke`]
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        crate::invoke(&mut self.instance, name, args)
    }

    /// The engine's instance
    pub fn instance(&self) -> &E::Instance {
        &self.instance
    }

    /// Leave the pipeline and keep the engine's instance
    pub fn into_instance(self) -> E::Instance {
        self.instance
    }
}

/// Build, compile, instantiate and invoke `name` in one go
pub fn run<E: Engine>(
    builder: &ModuleBuilder,
    engine: &E,
    imports: &HostImports,
    name: &str,
    args: &[Value],
) -> Result<Vec<Value>> {
    Assembled::from_builder(builder)?.compile(engine)?.instantiate(imports)?.invoke(name, args)
}
