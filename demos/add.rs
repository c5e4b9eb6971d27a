use eyre::Result;
use wasmwright::encoder::{FuncType, Function, Instruction::*, MemoryType, ModuleBuilder, ValType};
use wasmwright::pipeline::Assembled;
use wasmwright::{HostFunc, HostImports, TinywasmEngine, Value};

/// Builds a module that adds two constants, reports a greeting through a host
/// import from its start function, and prints the result of calling `abc`.
///
/// Run with `RUST_LOG=debug cargo run --example add` to follow the stages.
fn main() -> Result<()> {
    pretty_env_logger::init();

    let mut builder = ModuleBuilder::new();
    let write = builder.import_func("core", "write", FuncType::new(&[ValType::I32, ValType::I32], &[]))?;
    builder.memory(MemoryType::new(1));

    let greeting = b"Hello, World!\n";
    let start = builder.func(
        FuncType::empty(),
        Function::new([I32Const(8), I32Const(greeting.len() as i32), Call(write)]),
    );
    let abc = builder.func(FuncType::new(&[], &[ValType::I32]), Function::new([I32Const(5), I32Const(5), I32Add]));

    builder.start(start).export_func("abc", abc).data(8, greeting.to_vec());

    let mut imports = HostImports::new();
    imports.register(
        "core",
        "write",
        HostFunc::typed(|(offset, len): (i32, i32)| {
            println!("module wrote {len} bytes at offset {offset}");
            Ok(())
        }),
    );

    let assembled = Assembled::from_builder(&builder)?;
    println!("assembled {} bytes: {:02x?}", assembled.bytes().len(), assembled.bytes());

    let engine = TinywasmEngine::new();
    let mut instance = assembled.compile(&engine)?.instantiate(&imports)?;
    let results = instance.invoke("abc", &[])?;

    assert_eq!(results, vec![Value::I32(10)]);
    println!("abc() = {results:?}");
    Ok(())
}
