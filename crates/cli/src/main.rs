//! Runs a JSON script of host calls against a tracing ONNC kernel and
//! reports what each kernel was handed.

mod script;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use sandcall_ir::check_call;
use sandcall_rt::{
    onnc::{self, TraceEvent, TraceRuntime},
    HostFuncs, Imports, ModuleInstance, Status, Store, Value, ValueStack,
};

use crate::script::Script;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON call script to run
    script: Option<PathBuf>,

    /// Fill every kernel output with this value
    #[arg(long)]
    fill: Option<f32>,

    /// Type-check every call in the script without running any
    #[arg(long)]
    check: bool,

    /// List the registered host functions and their signatures
    #[arg(short, long)]
    list: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    colog::default_builder().filter_level(level).init();

    let runtime = Arc::new(match args.fill {
        Some(value) => TraceRuntime::with_fill(value),
        None => TraceRuntime::new(),
    });
    let mut imports = Imports::new();
    onnc::link(&mut imports, runtime.clone())?;
    let funcs = imports.build();

    if args.list {
        for (modname, name, func) in funcs.iter() {
            println!("{modname}/{name}{}", func.typedef());
        }
    }

    let Some(path) = args.script else {
        return Ok(());
    };
    let script = Script::load(&path)?;
    if args.check {
        return check(&script, &funcs);
    }
    run(&script, &funcs, &runtime)
}

fn check(script: &Script, funcs: &HostFuncs) -> anyhow::Result<()> {
    let mut failures = 0;
    for call in &script.calls {
        let Some(typedef) = funcs.typedef(&call.module, &call.name) else {
            failures += 1;
            println!("{}/{}: unknown import", call.module, call.name);
            continue;
        };

        let kinds: Vec<_> = call.args.iter().map(|arg| Value::from(*arg).kind()).collect();
        // leftover operands would stay on the stack after the call
        let result = if kinds.len() > typedef.input_arity() {
            Err(anyhow::anyhow!(
                "{} arguments left over",
                kinds.len() - typedef.input_arity()
            ))
        } else {
            check_call(typedef, &kinds).map_err(anyhow::Error::from)
        };

        match result {
            Ok(()) => println!("{}/{}{typedef}: ok", call.module, call.name),
            Err(e) => {
                failures += 1;
                println!("{}/{}{typedef}: {e}", call.module, call.name);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} calls do not type-check", script.calls.len());
    }
    Ok(())
}

fn run(script: &Script, funcs: &HostFuncs, runtime: &TraceRuntime) -> anyhow::Result<()> {
    let mut store = Store::new();
    let addr = store.insert(script.memory()?);
    let instance = ModuleInstance::new().with_memory(addr);

    let mut failures = 0;
    for call in &script.calls {
        let mut stack = ValueStack::new();
        for arg in &call.args {
            stack.push(*arg);
        }

        let result = funcs.call(&call.module, &call.name, &mut stack, &mut store, &instance);
        let status = Status::of(&result);
        match &result {
            Ok(_) => println!("{}/{}: {status}", call.module, call.name),
            Err(e) => {
                failures += 1;
                println!("{}/{}: {status} ({e})", call.module, call.name);
            }
        }

        let base = store.memory(addr)?.as_slice().as_ptr() as usize;
        for event in runtime.take_events() {
            println!("  {}", relative_to(event, base));
        }
    }

    let memory = store.memory(addr)?;
    for dump in &script.dump {
        let bytes = memory.read(dump.offset, dump.count.saturating_mul(4))?;
        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|xs| f32::from_le_bytes([xs[0], xs[1], xs[2], xs[3]]))
            .collect();
        println!("{:#x}: {values:?}", dump.offset);
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} calls failed", script.calls.len());
    }
    Ok(())
}

/// Rewrites native addresses as offsets into the sandbox memory.
fn relative_to(mut event: TraceEvent, base: usize) -> TraceEvent {
    event.context = event.context.wrapping_sub(base);
    for tensor in event.tensors.iter_mut() {
        tensor.addr = tensor.addr.wrapping_sub(base);
    }
    event
}
