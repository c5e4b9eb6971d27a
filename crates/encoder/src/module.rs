//! Module preamble and assembly.
//!
//! See <https://webassembly.github.io/spec/core/binary/modules.html#binary-module>

use alloc::{collections::BTreeSet, string::String, string::ToString, vec::Vec};

use crate::log::{debug, trace, warn};
use crate::section::{Section, SectionEncoder};
use crate::sections::*;
use crate::{EncodeError, ExternalKind, FuncType, MemoryType, Result};

/// `\0asm`
pub const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// Binary format version 1
pub const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// The fixed first 8 bytes of every module
pub const PREAMBLE: [u8; 8] = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];

/// Concatenate the preamble and `sections` in the given order
///
/// No reordering or deduplication happens here. Sections that violate the
/// mandated order are passed through (and logged); use [`ModuleBuilder`] to get
/// the order right by construction.
pub fn assemble(sections: &[Section]) -> Result<Vec<u8>> {
    let len = PREAMBLE.len() + sections.iter().map(Section::encoded_len).sum::<usize>();
    let mut bytes = Vec::with_capacity(len);
    bytes.extend_from_slice(&PREAMBLE);

    let mut last = None;
    for section in sections {
        if let Some(order) = section.id.order() {
            if last.is_some_and(|last| order <= last) {
                warn!("section {:?} is out of order or repeated", section.id);
            }
            last = Some(order);
        }

        trace!("writing {:?} section ({} bytes)", section.id, section.payload.len());
        section.encode(&mut bytes)?;
    }

    Ok(bytes)
}

/// Builds a module from typed entries and emits its sections in canonical order
///
/// Indices returned by [`ModuleBuilder::import_func`] and [`ModuleBuilder::func`]
/// share the function index space: imports come first, so all function imports
/// have to be added before the first function is defined.
#[derive(Debug, Clone, Default)]
pub struct ModuleBuilder {
    types: TypeSection,
    imports: ImportSection,
    functions: FunctionSection,
    memories: MemorySection,
    exports: ExportSection,
    start: Option<StartSection>,
    code: CodeSection,
    data: DataSection,
    custom: Vec<CustomSection>,
}

impl ModuleBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function type, returning its index
    ///
    /// Identical signatures share one entry.
    pub fn add_type(&mut self, ty: FuncType) -> u32 {
        if let Some(idx) = self.types.types.iter().position(|existing| *existing == ty) {
            return idx as u32;
        }

        self.types.types.push(ty);
        (self.types.types.len() - 1) as u32
    }

    /// Import a host function, returning its function index
    pub fn import_func(&mut self, module: &str, name: &str, ty: FuncType) -> Result<u32> {
        if !self.code.bodies.is_empty() {
            return Err(EncodeError::ImportAfterDefinition { module: module.to_string(), name: name.to_string() });
        }

        let type_index = self.add_type(ty);
        self.imports.imports.push(Import { module: module.to_string(), name: name.to_string(), type_index });
        Ok(self.func_import_count() - 1)
    }

    /// Define a function, returning its function index
    pub fn func(&mut self, ty: FuncType, body: Function) -> u32 {
        let type_index = self.add_type(ty);
        self.functions.type_indices.push(type_index);
        self.code.bodies.push(body);
        self.func_import_count() + self.code.bodies.len() as u32 - 1
    }

    /// Export a function under `name`
    pub fn export_func(&mut self, name: impl Into<String>, func_index: u32) -> &mut Self {
        self.export(name.into(), ExternalKind::Func, func_index)
    }

    /// Add a linear memory, returning its index
    pub fn memory(&mut self, ty: MemoryType) -> u32 {
        self.memories.memories.push(ty);
        (self.memories.memories.len() - 1) as u32
    }

    /// Export a memory under `name`
    pub fn export_memory(&mut self, name: impl Into<String>, mem_index: u32) -> &mut Self {
        self.export(name.into(), ExternalKind::Memory, mem_index)
    }

    /// Run `func_index` on instantiation
    pub fn start(&mut self, func_index: u32) -> &mut Self {
        self.start = Some(StartSection { func_index });
        self
    }

    /// Copy `data` into memory 0 at `offset` on instantiation
    pub fn data(&mut self, offset: u32, data: impl Into<Vec<u8>>) -> &mut Self {
        self.data.segments.push(DataSegment { offset, data: data.into() });
        self
    }

    /// Attach a custom section
    pub fn custom(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> &mut Self {
        self.custom.push(CustomSection { name: name.into(), data: data.into() });
        self
    }

    fn export(&mut self, name: String, kind: ExternalKind, index: u32) -> &mut Self {
        self.exports.exports.push(Export { name, kind, index });
        self
    }

    fn func_import_count(&self) -> u32 {
        self.imports.imports.len() as u32
    }

    fn func_count(&self) -> u32 {
        self.func_import_count() + self.functions.type_indices.len() as u32
    }

    fn check(&self) -> Result<()> {
        if let Some(ty) = self.types.types.iter().find(|ty| ty.results.len() > 1) {
            return Err(EncodeError::UnsupportedMultiValue { results: ty.results.len() });
        }

        let mut names = BTreeSet::new();
        for export in &self.exports.exports {
            if !names.insert(export.name.as_str()) {
                return Err(EncodeError::DuplicateExport(export.name.clone()));
            }

            match export.kind {
                ExternalKind::Func if export.index >= self.func_count() => {
                    return Err(EncodeError::UnknownFunction(export.index));
                }
                ExternalKind::Memory if export.index as usize >= self.memories.memories.len() => {
                    return Err(EncodeError::UnknownMemory(export.index));
                }
                _ => {}
            }
        }

        if let Some(start) = self.start
            && start.func_index >= self.func_count()
        {
            return Err(EncodeError::UnknownFunction(start.func_index));
        }

        if !self.data.segments.is_empty() && self.memories.memories.is_empty() {
            return Err(EncodeError::UnknownMemory(0));
        }

        Ok(())
    }

    /// The sections of this module in canonical order, empty ones left out
    pub fn sections(&self) -> Result<Vec<Section>> {
        self.check()?;

        let mut sections = Vec::new();
        if !self.types.types.is_empty() {
            sections.push(self.types.to_section()?);
        }
        if !self.imports.imports.is_empty() {
            sections.push(self.imports.to_section()?);
        }
        if !self.functions.type_indices.is_empty() {
            sections.push(self.functions.to_section()?);
        }
        if !self.memories.memories.is_empty() {
            sections.push(self.memories.to_section()?);
        }
        if !self.exports.exports.is_empty() {
            sections.push(self.exports.to_section()?);
        }
        if let Some(start) = &self.start {
            sections.push(start.to_section()?);
        }
        if !self.code.bodies.is_empty() {
            sections.push(self.code.to_section()?);
        }
        if !self.data.segments.is_empty() {
            sections.push(self.data.to_section()?);
        }
        for custom in &self.custom {
            sections.push(custom.to_section()?);
        }

        Ok(sections)
    }

    /// Encode the whole module
    pub fn build(&self) -> Result<Vec<u8>> {
        let sections = self.sections()?;
        let bytes = assemble(&sections)?;
        debug!("assembled module: {} sections, {} bytes", sections.len(), bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Instruction::*, SectionId, ValType, build_section};
    use alloc::vec;

    fn add_module() -> ModuleBuilder {
        let mut builder = ModuleBuilder::new();
        let func = builder.func(FuncType::new(&[], &[ValType::I32]), Function::new([I32Const(5), I32Const(5), I32Add]));
        builder.export_func("abc", func);
        builder
    }

    #[test]
    fn preamble_comes_first() {
        let bytes = assemble(&[build_section(SectionId::Type, vec![0])]).unwrap();
        assert_eq!(bytes[..8], PREAMBLE);
        assert_eq!(&bytes[..4], &MAGIC);
        assert_eq!(&bytes[4..8], &VERSION);

        assert_eq!(assemble(&[]).unwrap(), PREAMBLE.to_vec());
    }

    #[test]
    fn assemble_keeps_given_order() {
        let code = build_section(SectionId::Code, vec![0]);
        let types = build_section(SectionId::Type, vec![0]);
        let bytes = assemble(&[code.clone(), types.clone(), code]).unwrap();
        assert_eq!(&bytes[8..], &[10, 1, 0, 1, 1, 0, 10, 1, 0]);
    }

    #[test]
    fn add_module_is_byte_exact() {
        #[rustfmt::skip]
        let expected = vec![
            0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
            1, 5, 1, 0x60, 0, 1, 0x7F,
            3, 2, 1, 0,
            7, 7, 1, 3, 97, 98, 99, 0, 0,
            10, 9, 1, 7, 0, 0x41, 5, 0x41, 5, 0x6A, 0x0B,
        ];

        assert_eq!(add_module().build().unwrap(), expected);
    }

    #[test]
    fn sections_are_emitted_in_canonical_order() {
        let mut builder = ModuleBuilder::new();
        builder.custom("meta", vec![1]);
        builder.data(0, b"x".to_vec());
        let print = builder.import_func("core", "write", FuncType::new(&[ValType::I32], &[])).unwrap();
        let main = builder.func(FuncType::empty(), Function::new([I32Const(0), Call(print)]));
        builder.start(main);
        let mem = builder.memory(MemoryType::new(1));
        builder.export_memory("memory", mem);

        let ids = builder.sections().unwrap().iter().map(|s| s.id).collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![
                SectionId::Type,
                SectionId::Import,
                SectionId::Function,
                SectionId::Memory,
                SectionId::Export,
                SectionId::Start,
                SectionId::Code,
                SectionId::Data,
                SectionId::Custom,
            ]
        );
    }

    #[test]
    fn indices_follow_imports() {
        let mut builder = ModuleBuilder::new();
        let ty = FuncType::new(&[ValType::I32], &[]);
        assert_eq!(builder.import_func("env", "a", ty.clone()).unwrap(), 0);
        assert_eq!(builder.import_func("env", "b", ty.clone()).unwrap(), 1);
        assert_eq!(builder.func(ty.clone(), Function::default()), 2);
        assert_eq!(builder.func(FuncType::empty(), Function::default()), 3);

        // one shared signature plus the empty one
        assert_eq!(builder.types.types.len(), 2);
        assert_eq!(builder.functions.type_indices, vec![0, 1]);
    }

    #[test]
    fn import_after_definition_is_rejected() {
        let mut builder = add_module();
        let err = builder.import_func("env", "late", FuncType::empty()).unwrap_err();
        assert_eq!(err, EncodeError::ImportAfterDefinition { module: "env".to_string(), name: "late".to_string() });
    }

    #[test]
    fn invalid_modules_are_rejected() {
        let mut builder = add_module();
        builder.export_func("abc", 0);
        assert_eq!(builder.build(), Err(EncodeError::DuplicateExport("abc".to_string())));

        let mut builder = add_module();
        builder.export_func("nope", 1);
        assert_eq!(builder.build(), Err(EncodeError::UnknownFunction(1)));

        let mut builder = add_module();
        builder.export_memory("memory", 0);
        assert_eq!(builder.build(), Err(EncodeError::UnknownMemory(0)));

        let mut builder = add_module();
        builder.data(0, vec![1]);
        assert_eq!(builder.build(), Err(EncodeError::UnknownMemory(0)));

        let mut builder = add_module();
        builder.start(7);
        assert_eq!(builder.build(), Err(EncodeError::UnknownFunction(7)));

        let mut builder = ModuleBuilder::new();
        builder.func(FuncType::new(&[], &[ValType::I32, ValType::I32]), Function::default());
        assert_eq!(builder.build(), Err(EncodeError::UnsupportedMultiValue { results: 2 }));
    }
}
