use crate::log::debug;
use crate::{Error, Instance, Result, Value};

/// Call the function exported as `name` with positional arguments
///
/// The export must exist and `args` must match its parameters in number and type,
/// otherwise this fails with [`Error::ExportNotFound`], [`Error::ArityMismatch`] or
/// [`Error::ArgumentType`] without calling into the instance.
/// The results are returned as produced by the function.
pub fn invoke<I: Instance + ?Sized>(instance: &mut I, name: &str, args: &[Value]) -> Result<Vec<Value>> {
    let ty = instance.export_type(name).ok_or_else(|| Error::ExportNotFound(name.to_string()))?;

    if ty.params.len() != args.len() {
        return Err(Error::ArityMismatch { name: name.to_string(), expected: ty.params.len(), actual: args.len() });
    }

    for (index, (expected, arg)) in ty.params.iter().zip(args).enumerate() {
        if *expected != arg.val_type() {
            return Err(Error::ArgumentType {
                name: name.to_string(),
                index,
                expected: *expected,
                actual: arg.val_type(),
            });
        }
    }

    debug!("invoking {name}");
    instance.call(name, args)
}
