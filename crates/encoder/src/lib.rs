#![no_std]
#![forbid(unsafe_code)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_assignments, unused_variables))
))]
#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

//! Byte-exact encoding of WebAssembly binary modules.
//!
//! The crate is split into three layers:
//! - [`leb`]: variable-length integers used for every count, index and length field
//! - [`section`] and [`sections`]: tagged, length-prefixed section blocks
//! - [`module`]: the preamble, [`assemble`] and the higher level [`ModuleBuilder`]
//!
//! ```
//! use wasmwright_encoder::{FuncType, Function, Instruction, ModuleBuilder, ValType};
//!
//! let mut builder = ModuleBuilder::new();
//! let add = builder.func(
//!     FuncType::new(&[], &[ValType::I32]),
//!     Function::new([Instruction::I32Const(5), Instruction::I32Const(5), Instruction::I32Add]),
//! );
//! builder.export_func("abc", add);
//!
//! let bytes = builder.build().unwrap();
//! assert_eq!(&bytes[..4], b"\0asm");
//! ```

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

// log for logging (optional).
#[cfg(feature = "log")]
#[allow(clippy::single_component_path_imports, unused_imports)]
use log;

#[cfg(not(feature = "log"))]
#[allow(unused_imports, unused_macros)]
pub(crate) mod log {
    macro_rules! trace    ( ($($tt:tt)*) => {{}} );
    macro_rules! debug    ( ($($tt:tt)*) => {{}} );
    // `warn` on its own would clash with the built-in lint attribute
    macro_rules! log_warn ( ($($tt:tt)*) => {{}} );
    pub(crate) use debug;
    pub(crate) use log_warn as warn;
    pub(crate) use trace;
}

mod error;
mod instructions;
pub mod leb;
pub mod module;
pub mod section;
pub mod sections;
mod types;

pub use error::*;
pub use instructions::*;
pub use module::{MAGIC, ModuleBuilder, PREAMBLE, VERSION, assemble};
pub use section::{Section, SectionEncoder, SectionId, build_section};
pub use sections::Function;
pub use types::*;
