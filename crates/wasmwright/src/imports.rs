use std::{collections::BTreeMap, fmt::Debug, fmt::Display, sync::Arc};

use wasmwright_encoder::FuncType;

use crate::{FromValues, IntoValues, ValTypes, Value};

type HostCallback = dyn Fn(&[Value]) -> Result<Vec<Value>, HostError> + Send + Sync;

/// An error returned by a host function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    message: String,
}

impl HostError {
    /// Create a host error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// The message passed to [`HostError::new`]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HostError {}

/// A host function handed to a module as an import
///
/// Cloning is cheap and keeps pointing at the same callable.
#[derive(Clone)]
pub struct HostFunc {
    ty: FuncType,
    func: Arc<HostCallback>,
}

impl Debug for HostFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFunc").field("ty", &self.ty).field("func", &"...").finish()
    }
}

impl HostFunc {
    /// Create a host function working on untyped values
    ///
    /// Arguments are checked against `ty` before `func` runs, results after it returns.
    pub fn new(ty: FuncType, func: impl Fn(&[Value]) -> Result<Vec<Value>, HostError> + Send + Sync + 'static) -> Self {
        Self { ty, func: Arc::new(func) }
    }

    /// Create a host function from a closure over Rust types
    ///
    /// The signature is derived from `P` and `R`, which can be `i32`, `i64`, `f32`,
    /// `f64` or tuples of them (`()` for none).
    pub fn typed<P, R>(func: impl Fn(P) -> Result<R, HostError> + Send + Sync + 'static) -> Self
    where
        P: FromValues + ValTypes,
        R: IntoValues + ValTypes,
    {
        let ty = FuncType { params: P::val_types(), results: R::val_types() };
        let inner = move |args: &[Value]| -> Result<Vec<Value>, HostError> {
            let args = P::from_values(args)?;
            Ok(func(args)?.into_values())
        };

        Self { ty, func: Arc::new(inner) }
    }

    /// The declared signature
    pub fn ty(&self) -> &FuncType {
        &self.ty
    }

    /// Call the function, checking arguments and results against its signature
    pub fn call(&self, args: &[Value]) -> Result<Vec<Value>, HostError> {
        check_types("argument", &self.ty.params, args)?;
        let results = (self.func)(args)?;
        check_types("result", &self.ty.results, &results)?;
        Ok(results)
    }

    /// Whether both handles refer to the same callable
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

fn check_types(what: &str, expected: &[wasmwright_encoder::ValType], values: &[Value]) -> Result<(), HostError> {
    if expected.len() != values.len() {
        return Err(HostError::new(format!("expected {} {what}s, got {}", expected.len(), values.len())));
    }

    for (i, (ty, value)) in expected.iter().zip(values).enumerate() {
        if *ty != value.val_type() {
            return Err(HostError::new(format!("{what} {i} type mismatch: expected {ty:?}, got {value:?}")));
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
/// Name of an import
pub struct ExternName {
    module: String,
    name: String,
}

impl ExternName {
    fn new(module: &str, name: &str) -> Self {
        Self { module: module.to_string(), name: name.to_string() }
    }
}

/// Host functions available to modules, keyed by `(module, name)`
///
/// The table is filled before compilation and only read during instantiation.
#[derive(Debug, Default, Clone)]
pub struct HostImports {
    values: BTreeMap<ExternName, HostFunc>,
}

impl HostImports {
    /// Create a new empty import table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host function, replacing any function previously registered under the same name pair
    pub fn register(&mut self, module: &str, name: &str, func: HostFunc) -> &mut Self {
        if self.values.insert(ExternName::new(module, name), func).is_some() {
            crate::log::debug!("replaced host import {module}.{name}");
        }
        self
    }

    /// Look up the function registered under `(module, name)`
    pub fn resolve(&self, module: &str, name: &str) -> Option<&HostFunc> {
        self.values.get(&ExternName::new(module, name))
    }

    /// All registered functions as `(module, name, func)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &HostFunc)> {
        self.values.iter().map(|(key, func)| (key.module.as_str(), key.name.as_str(), func))
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no function is registered
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
