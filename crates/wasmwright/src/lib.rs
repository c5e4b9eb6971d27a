#![forbid(unsafe_code)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_assignments, unused_variables))
))]
#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

//! Build WebAssembly modules byte by byte, link host functions into them and call their exports.
//!
//! Modules are encoded with [`encoder`], compiled and instantiated by an [`Engine`],
//! and called through [`invoke`]. The [`pipeline`] module chains these stages as
//! consuming typestates.
//!
//! ## Features
//! - **`log`** (default)\
//!   Enables logging using the `log` crate.
//!
//! ## Example
//! ```
//! use wasmwright::encoder::{FuncType, Function, Instruction, ModuleBuilder, ValType};
//! use wasmwright::{HostImports, TinywasmEngine, Value, pipeline};
//!
//! let mut builder = ModuleBuilder::new();
//! let add = builder.func(
//!     FuncType::new(&[], &[ValType::I32]),
//!     Function::new([Instruction::I32Const(5), Instruction::I32Const(5), Instruction::I32Add]),
//! );
//! builder.export_func("abc", add);
//!
//! let results = pipeline::run(&builder, &TinywasmEngine::new(), &HostImports::new(), "abc", &[])?;
//! assert_eq!(results, vec![Value::I32(10)]);
//! # Ok::<(), wasmwright::Error>(())
//! ```

// log for logging (optional).
#[cfg(feature = "log")]
#[allow(clippy::single_component_path_imports, unused_imports)]
use log;

#[cfg(not(feature = "log"))]
#[allow(unused_imports, unused_macros)]
pub(crate) mod log {
    macro_rules! trace    ( ($($tt:tt)*) => {{}} );
    macro_rules! debug    ( ($($tt:tt)*) => {{}} );
    macro_rules! info     ( ($($tt:tt)*) => {{}} );
    // `warn` on its own would clash with the built-in lint attribute
    macro_rules! log_warn ( ($($tt:tt)*) => {{}} );
    pub(crate) use debug;
    pub(crate) use info;
    pub(crate) use log_warn as warn;
    pub(crate) use trace;
}

mod error;
pub use error::*;

mod imports;
pub use imports::*;

mod value;
pub use value::*;

mod invoke;
pub use invoke::invoke;

pub mod engine;
pub use engine::{Engine, Instance, TinywasmEngine};

pub mod pipeline;

/// Re-export of [`wasmwright_encoder`]
pub use wasmwright_encoder as encoder;
