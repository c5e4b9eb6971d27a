use std::{
    collections::BTreeMap,
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};

use tinywasm::types::WasmValue;
use tinywasm::{Extern, FuncContext, Imports, ModuleInstance, Store};
use wasmwright_encoder::{FuncType, ValType};

use super::reader::ModuleReader;
use crate::log::{debug, info, trace};
use crate::{Engine, Error, HostError, HostFunc, HostImports, Instance, Result, Value};

/// Most recent host function failure, kept so it can be reported as [`Error::Host`]
/// instead of the engine's generic error.
type HostFailure = Arc<Mutex<Option<HostError>>>;

/// An [`Engine`] backed by the `tinywasm` interpreter
///
/// Every instance gets its own [`Store`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TinywasmEngine {}

impl TinywasmEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A module validated and parsed by [`TinywasmEngine::compile`]
pub struct CompiledModule {
    module: tinywasm::Module,
    exports: BTreeMap<String, FuncType>,
}

impl Debug for CompiledModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledModule").field("exports", &self.exports).finish()
    }
}

impl CompiledModule {
    /// Signatures of the exported functions
    pub fn exports(&self) -> &BTreeMap<String, FuncType> {
        &self.exports
    }
}

/// A module instance created by [`TinywasmEngine::instantiate`]
pub struct TinywasmInstance {
    store: Store,
    instance: ModuleInstance,
    exports: BTreeMap<String, FuncType>,
    failure: HostFailure,
}

impl Debug for TinywasmInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TinywasmInstance").field("exports", &self.exports).finish()
    }
}

impl Engine for TinywasmEngine {
    type Module = CompiledModule;
    type Instance = TinywasmInstance;

    fn compile(&self, bytes: Vec<u8>) -> Result<CompiledModule> {
        debug!("compiling module ({} bytes)", bytes.len());
        let exports = ModuleReader::read(&bytes)?;
        let module = tinywasm::Module::parse_bytes(&bytes)?;
        Ok(CompiledModule { module, exports })
    }

    fn instantiate(&self, module: CompiledModule, imports: &HostImports) -> Result<TinywasmInstance> {
        let failure = HostFailure::default();
        let mut linked = Imports::new();
        for (module_name, name, func) in imports.iter() {
            trace!("defining host import {module_name}.{name}");
            linked.define(module_name, name, host_extern(func, failure.clone()))?;
        }

        let mut store = Store::default();
        let instance =
            module.module.instantiate(&mut store, Some(linked)).map_err(|err| surface(&failure, err))?;

        info!("instantiated module with {} exported functions", module.exports.len());
        Ok(TinywasmInstance { store, instance, exports: module.exports, failure })
    }
}

impl Instance for TinywasmInstance {
    fn export_type(&self, name: &str) -> Option<&FuncType> {
        self.exports.get(name)
    }

    fn call(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        let func = self.instance.exported_func_untyped(&self.store, name)?;
        let args = args.iter().copied().map(into_wasm_value).collect::<Vec<_>>();

        trace!("calling {name} with {args:?}");
        let results = func.call(&mut self.store, &args).map_err(|err| surface(&self.failure, err))?;
        results.iter().map(from_wasm_value).collect()
    }
}

/// Wrap a [`HostFunc`] so the interpreter can call it
fn host_extern(func: &HostFunc, failure: HostFailure) -> Extern {
    let ty = tinywasm::types::FuncType {
        params: func.ty().params.iter().copied().map(into_wasm_type).collect(),
        results: func.ty().results.iter().copied().map(into_wasm_type).collect(),
    };

    let func = func.clone();
    Extern::func(&ty, move |_: FuncContext<'_>, args: &[WasmValue]| -> tinywasm::Result<Vec<WasmValue>> {
        let args = args
            .iter()
            .map(from_wasm_value)
            .collect::<Result<Vec<_>>>()
            .map_err(|err| tinywasm::Error::Other(err.to_string()))?;

        match func.call(&args) {
            Ok(results) => Ok(results.into_iter().map(into_wasm_value).collect()),
            Err(err) => {
                let message = err.to_string();
                failure.lock().unwrap_or_else(PoisonError::into_inner).replace(err);
                Err(tinywasm::Error::Other(message))
            }
        }
    })
}

/// Prefer a recorded host failure over the engine error it caused
fn surface(failure: &HostFailure, err: tinywasm::Error) -> Error {
    match failure.lock().unwrap_or_else(PoisonError::into_inner).take() {
        Some(host) => Error::Host(host),
        None => err.into(),
    }
}

fn into_wasm_type(ty: ValType) -> tinywasm::types::ValType {
    match ty {
        ValType::I32 => tinywasm::types::ValType::I32,
        ValType::I64 => tinywasm::types::ValType::I64,
        ValType::F32 => tinywasm::types::ValType::F32,
        ValType::F64 => tinywasm::types::ValType::F64,
    }
}

fn into_wasm_value(value: Value) -> WasmValue {
    match value {
        Value::I32(v) => WasmValue::I32(v),
        Value::I64(v) => WasmValue::I64(v),
        Value::F32(v) => WasmValue::F32(v),
        Value::F64(v) => WasmValue::F64(v),
    }
}

fn from_wasm_value(value: &WasmValue) -> Result<Value> {
    match value {
        WasmValue::I32(v) => Ok(Value::I32(*v)),
        WasmValue::I64(v) => Ok(Value::I64(*v)),
        WasmValue::F32(v) => Ok(Value::F32(*v)),
        WasmValue::F64(v) => Ok(Value::F64(*v)),
        other => Err(Error::UnsupportedFeature(format!("value {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinkError;

    fn compile(wat: &str) -> Result<CompiledModule> {
        TinywasmEngine::new().compile(wat::parse_str(wat).unwrap())
    }

    #[test]
    fn calls_an_export() -> Result<()> {
        let engine = TinywasmEngine::new();
        let module = compile(r#"(module (func (export "abc") (result i32) i32.const 5 i32.const 5 i32.add))"#)?;
        let mut instance = engine.instantiate(module, &HostImports::new())?;

        assert_eq!(instance.export_type("abc"), Some(&FuncType::new(&[], &[ValType::I32])));
        assert_eq!(instance.call("abc", &[])?, vec![Value::I32(10)]);
        Ok(())
    }

    #[test]
    fn unresolved_import() -> Result<()> {
        let module = compile(r#"(module (import "core" "write" (func (param i32))))"#)?;
        let err = TinywasmEngine::new().instantiate(module, &HostImports::new()).unwrap_err();

        match err {
            Error::Link(LinkError::UnknownImport { module, name }) => {
                assert_eq!((module.as_str(), name.as_str()), ("core", "write"));
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn host_failures_are_reported_as_host_errors() -> Result<()> {
        let module = compile(
            r#"(module
                (import "core" "fail" (func $fail (param i32)))
                (func (export "run") i32.const 1 call $fail))"#,
        )?;

        let mut imports = HostImports::new();
        imports.register("core", "fail", HostFunc::typed(|_: i32| -> std::result::Result<(), HostError> {
            Err(HostError::new("refused"))
        }));

        let mut instance = TinywasmEngine::new().instantiate(module, &imports)?;
        let err = instance.call("run", &[]).unwrap_err();
        assert!(matches!(&err, Error::Host(host) if host.message() == "refused"), "{err}");
        Ok(())
    }

    #[test]
    fn value_conversions() {
        for value in [Value::I32(-1), Value::I64(i64::MAX), Value::F32(1.5), Value::F64(-0.25)] {
            assert_eq!(from_wasm_value(&into_wasm_value(value)).unwrap(), value);
        }
    }
}
