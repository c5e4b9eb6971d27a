use std::collections::BTreeMap;

use wasmparser::{Payload, ValidPayload, Validator};
use wasmwright_encoder::{FuncType, ValType};

use crate::log::debug;
use crate::{Error, Result};

/// Validates a module and collects the signatures of its exported functions
#[derive(Debug, Default)]
pub(crate) struct ModuleReader {
    version: Option<u16>,
    exported_funcs: Vec<(String, u32)>,
    exports: BTreeMap<String, FuncType>,
    end_reached: bool,
}

impl ModuleReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Validate `wasm` and return the signature of every exported function
    pub(crate) fn read(wasm: &[u8]) -> Result<BTreeMap<String, FuncType>> {
        let mut validator = Validator::new();
        let mut reader = Self::new();

        for payload in wasmparser::Parser::new(0).parse_all(wasm) {
            reader.process_payload(payload?, &mut validator)?;
        }

        if !reader.end_reached {
            return Err(Error::Structural { message: "end of module not reached".into(), offset: wasm.len() });
        }

        debug!("validated module (version {:?}, {} exported functions)", reader.version, reader.exports.len());
        Ok(reader.exports)
    }

    fn process_payload(&mut self, payload: Payload<'_>, validator: &mut Validator) -> Result<()> {
        match validator.payload(&payload)? {
            ValidPayload::Func(func, body) => {
                let mut func_validator = func.into_validator(Default::default());
                func_validator.validate(&body)?;
            }
            ValidPayload::End(types) => {
                debug!("reached end of module");
                let types = types.as_ref();
                for (name, index) in self.exported_funcs.drain(..) {
                    let ty = types[types.core_function_at(index)].unwrap_func();
                    let params = ty.params().iter().map(convert_val_type).collect::<Result<Vec<_>>>()?;
                    let results = ty.results().iter().map(convert_val_type).collect::<Result<Vec<_>>>()?;
                    self.exports.insert(name, FuncType::new(&params, &results));
                }
                self.end_reached = true;
            }
            _ => {}
        }

        match payload {
            Payload::Version { num, encoding, .. } => {
                if !matches!(encoding, wasmparser::Encoding::Module) {
                    return Err(Error::UnsupportedFeature(format!("{encoding:?} encoding")));
                }
                self.version = Some(num);
            }
            Payload::ExportSection(reader) => {
                debug!("found export section");
                for export in reader {
                    let export = export?;
                    if export.kind == wasmparser::ExternalKind::Func {
                        self.exported_funcs.push((export.name.to_string(), export.index));
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }
}

fn convert_val_type(ty: &wasmparser::ValType) -> Result<ValType> {
    match ty {
        wasmparser::ValType::I32 => Ok(ValType::I32),
        wasmparser::ValType::I64 => Ok(ValType::I64),
        wasmparser::ValType::F32 => Ok(ValType::F32),
        wasmparser::ValType::F64 => Ok(ValType::F64),
        other => Err(Error::UnsupportedFeature(format!("value type {other:?}"))),
    }
}
