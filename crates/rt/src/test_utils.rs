#![allow(dead_code)]

use std::sync::Arc;

use crate::{
    error::HostError,
    function::Results,
    imports::{HostFuncs, Imports},
    instance::ModuleInstance,
    memory::MemoryRegion,
    onnc::{self, TraceRuntime},
    stack::ValueStack,
    store::{MemAddr, Store},
    value::Value,
};

/// A store holding a single fixed-size memory, plus an instance whose
/// memory 0 points at it.
pub(crate) struct Sandbox {
    pub(crate) store: Store,
    pub(crate) instance: ModuleInstance,
    pub(crate) addr: MemAddr,
}

impl Sandbox {
    pub(crate) fn new(len: usize) -> Self {
        let mut store = Store::new();
        let addr = store.insert(MemoryRegion::with_len(len));
        Self {
            store,
            instance: ModuleInstance::new().with_memory(addr),
            addr,
        }
    }

    pub(crate) fn memory(&self) -> &MemoryRegion {
        self.store.memory(self.addr).expect("sandbox memory")
    }

    pub(crate) fn memory_mut(&mut self) -> &mut MemoryRegion {
        self.store.memory_mut(self.addr).expect("sandbox memory")
    }

    pub(crate) fn base(&self) -> usize {
        self.memory().as_slice().as_ptr() as usize
    }

    pub(crate) fn write_f32s(&mut self, offset: u32, values: &[f32]) -> anyhow::Result<()> {
        let bytes: Vec<u8> = values.iter().flat_map(|xs| xs.to_le_bytes()).collect();
        Ok(self.memory_mut().write(offset, &bytes)?)
    }

    pub(crate) fn write_i32s(&mut self, offset: u32, values: &[i32]) -> anyhow::Result<()> {
        let bytes: Vec<u8> = values.iter().flat_map(|xs| xs.to_le_bytes()).collect();
        Ok(self.memory_mut().write(offset, &bytes)?)
    }

    pub(crate) fn write_str(&mut self, offset: u32, value: &str) -> anyhow::Result<()> {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        Ok(self.memory_mut().write(offset, &bytes)?)
    }

    pub(crate) fn read_f32s(&self, offset: u32, count: usize) -> anyhow::Result<Vec<f32>> {
        let bytes = self.memory().read(offset, count * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|xs| f32::from_le_bytes([xs[0], xs[1], xs[2], xs[3]]))
            .collect())
    }

    /// Pushes `declared` onto a fresh operand stack and calls through the
    /// table, as an interpreter would.
    pub(crate) fn call(
        &mut self,
        funcs: &HostFuncs,
        name: &str,
        declared: &[Value],
    ) -> Result<Results, HostError> {
        let mut stack = ValueStack::new();
        for value in declared {
            stack.push(*value);
        }
        funcs.call(onnc::MODULE, name, &mut stack, &mut self.store, &self.instance)
    }
}

pub(crate) fn onnc_funcs(runtime: &Arc<TraceRuntime>) -> HostFuncs {
    let mut imports = Imports::new();
    onnc::link(&mut imports, runtime.clone()).expect("could not link onnc");
    imports.build()
}

pub(crate) fn i32s(values: &[i32]) -> Vec<Value> {
    values.iter().copied().map(Value::I32).collect()
}
