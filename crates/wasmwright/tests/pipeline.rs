use std::sync::{Arc, Mutex};

use eyre::Result;
use wasmwright::encoder::{
    BlockType, FuncType, Function, Instruction::*, MemArg, MemoryType, ModuleBuilder, SectionId, ValType, assemble,
    build_section,
};
use wasmwright::pipeline::{Assembled, run};
use wasmwright::{Error, HostError, HostFunc, HostImports, LinkError, TinywasmEngine, Value};

fn add_module() -> ModuleBuilder {
    let mut builder = ModuleBuilder::new();
    let func = builder.func(FuncType::new(&[], &[ValType::I32]), Function::new([I32Const(5), I32Const(5), I32Add]));
    builder.export_func("abc", func);
    builder
}

/// Imports `core.write`, calls it from the start function with the offset of a data segment
/// and exports `load` and `max`
fn greeter_module() -> Result<ModuleBuilder> {
    let mut builder = ModuleBuilder::new();
    let write = builder.import_func("core", "write", FuncType::new(&[ValType::I32], &[ValType::I32]))?;
    let memory = builder.memory(MemoryType::new(1));

    let main = builder.func(FuncType::empty(), Function::new([I32Const(8), Call(write), Drop]));
    let load = builder.func(
        FuncType::new(&[ValType::I32], &[ValType::I32]),
        Function::new([LocalGet(0), I32Load(MemArg::new(2, 0))]),
    );
    let max = builder.func(
        FuncType::new(&[ValType::I32, ValType::I32], &[ValType::I32]),
        Function::new([
            LocalGet(0),
            LocalGet(1),
            I32GtS,
            If(BlockType::Value(ValType::I32)),
            LocalGet(0),
            Else,
            LocalGet(1),
            End,
        ]),
    );

    builder.export_memory("memory", memory);
    builder.export_func("load", load).export_func("max", max);
    builder.start(main);
    builder.data(8, b"Hello, World!\n".to_vec());
    Ok(builder)
}

fn recording_write(calls: Arc<Mutex<Vec<i32>>>) -> HostFunc {
    HostFunc::typed(move |offset: i32| {
        calls.lock().unwrap().push(offset);
        Ok(14)
    })
}

#[test]
fn add_returns_ten() -> Result<()> {
    let _ = pretty_env_logger::try_init();

    let results = run(&add_module(), &TinywasmEngine::new(), &HostImports::new(), "abc", &[])?;
    assert_eq!(results, vec![Value::I32(10)]);
    Ok(())
}

#[test]
fn hand_assembled_bytes_run() -> Result<()> {
    let sections = [
        build_section(SectionId::Type, vec![1, 0x60, 0, 1, 0x7F]),
        build_section(SectionId::Function, vec![1, 0]),
        build_section(SectionId::Export, vec![1, 3, b'a', b'b', b'c', 0, 0]),
        build_section(SectionId::Code, vec![1, 7, 0, 0x41, 5, 0x41, 5, 0x6A, 0x0B]),
    ];

    let engine = TinywasmEngine::new();
    let mut instance = Assembled::new(assemble(&sections)?).compile(&engine)?.instantiate(&HostImports::new())?;
    assert_eq!(instance.invoke("abc", &[])?, vec![Value::I32(10)]);
    Ok(())
}

#[test]
fn start_function_calls_the_host() -> Result<()> {
    let _ = pretty_env_logger::try_init();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut imports = HostImports::new();
    imports.register("core", "write", recording_write(calls.clone()));

    let engine = TinywasmEngine::new();
    let mut instance = Assembled::from_builder(&greeter_module()?)?.compile(&engine)?.instantiate(&imports)?;
    assert_eq!(*calls.lock().unwrap(), vec![8]);

    // "Hell" read back from the data segment
    assert_eq!(instance.invoke("load", &[Value::I32(8)])?, vec![Value::I32(i32::from_le_bytes(*b"Hell"))]);
    assert_eq!(instance.invoke("max", &[Value::I32(-4), Value::I32(3)])?, vec![Value::I32(3)]);
    assert_eq!(instance.invoke("max", &[Value::I32(9), Value::I32(3)])?, vec![Value::I32(9)]);

    // invoking does not rerun the start function
    assert_eq!(calls.lock().unwrap().len(), 1);
    Ok(())
}

#[test]
fn failing_start_function_reports_the_host_error() -> Result<()> {
    let mut builder = ModuleBuilder::new();
    let fail = builder.import_func("core", "fail", FuncType::new(&[ValType::I32], &[]))?;
    let main = builder.func(FuncType::empty(), Function::new([I32Const(1), Call(fail)]));
    builder.start(main);

    let mut imports = HostImports::new();
    let failing = HostFunc::typed(|_: i32| -> Result<(), HostError> { Err(HostError::new("boom")) });
    imports.register("core", "fail", failing);

    let engine = TinywasmEngine::new();
    let err = Assembled::from_builder(&builder)?.compile(&engine)?.instantiate(&imports).unwrap_err();
    match err {
        Error::Host(host) => assert_eq!(host.message(), "boom"),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn missing_import_fails_to_link() -> Result<()> {
    let engine = TinywasmEngine::new();
    let compiled = Assembled::from_builder(&greeter_module()?)?.compile(&engine)?;

    let mut imports = HostImports::new();
    imports.register("core", "read", recording_write(Arc::default()));

    let err = compiled.instantiate(&imports).unwrap_err();
    match err {
        Error::Link(LinkError::UnknownImport { module, name }) => {
            assert_eq!(module, "core");
            assert_eq!(name, "write");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn mistyped_import_fails_to_link() -> Result<()> {
    let engine = TinywasmEngine::new();
    let compiled = Assembled::from_builder(&greeter_module()?)?.compile(&engine)?;

    let mut imports = HostImports::new();
    imports.register("core", "write", HostFunc::typed(|_: i64| Ok(())));

    let err = compiled.instantiate(&imports).unwrap_err();
    assert!(matches!(err, Error::Link(LinkError::IncompatibleImportType { .. })), "{err}");
    Ok(())
}

#[test]
fn unknown_export() -> Result<()> {
    let err = run(&add_module(), &TinywasmEngine::new(), &HostImports::new(), "add", &[]).unwrap_err();
    assert!(matches!(&err, Error::ExportNotFound(name) if name == "add"), "{err}");
    Ok(())
}

#[test]
fn wrong_argument_count() -> Result<()> {
    let err = run(&add_module(), &TinywasmEngine::new(), &HostImports::new(), "abc", &[Value::I32(1)]).unwrap_err();
    assert!(matches!(err, Error::ArityMismatch { expected: 0, actual: 1, .. }), "{err}");
    Ok(())
}

#[test]
fn wrong_argument_type() -> Result<()> {
    let mut imports = HostImports::new();
    imports.register("core", "write", recording_write(Arc::default()));

    let engine = TinywasmEngine::new();
    let mut instance = Assembled::from_builder(&greeter_module()?)?.compile(&engine)?.instantiate(&imports)?;
    let err = instance.invoke("max", &[Value::I32(1), Value::I64(2)]).unwrap_err();
    assert!(matches!(err, Error::ArgumentType { index: 1, expected: ValType::I32, actual: ValType::I64, .. }), "{err}");
    Ok(())
}

#[test]
fn bad_magic_is_structural() -> Result<()> {
    let mut bytes = add_module().build()?;
    bytes[3] = b'n';

    let err = Assembled::new(bytes).compile(&TinywasmEngine::new()).unwrap_err();
    assert!(matches!(err, Error::Structural { offset: 0, .. }), "{err}");
    Ok(())
}

#[test]
fn misordered_sections_are_structural() -> Result<()> {
    let mut sections = add_module().sections()?;
    sections.swap(0, 1);

    let err = Assembled::new(assemble(&sections)?).compile(&TinywasmEngine::new()).unwrap_err();
    assert!(matches!(err, Error::Structural { .. }), "{err}");
    Ok(())
}

#[test]
fn out_of_range_call_is_structural() -> Result<()> {
    let mut builder = ModuleBuilder::new();
    let func = builder.func(FuncType::empty(), Function::new([Call(7)]));
    builder.export_func("f", func);

    let err = Assembled::from_builder(&builder)?.compile(&TinywasmEngine::new()).unwrap_err();
    assert!(matches!(err, Error::Structural { .. }), "{err}");
    Ok(())
}
