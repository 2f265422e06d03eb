use sandcall_ir::MemIdx;
use smallvec::SmallVec;

use crate::{error::HostError, store::MemAddr};

/// The slice of a module instance the host boundary cares about: which store
/// addresses its memory indices resolve to.
#[derive(Debug, Default, Clone)]
pub struct ModuleInstance {
    memaddrs: SmallVec<[MemAddr; 1]>,
}

impl ModuleInstance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory(mut self, addr: MemAddr) -> Self {
        self.memaddrs.push(addr);
        self
    }

    pub fn push_memory(&mut self, addr: MemAddr) -> MemIdx {
        let idx = MemIdx(self.memaddrs.len() as u32);
        self.memaddrs.push(addr);
        idx
    }

    pub fn memaddr(&self, idx: MemIdx) -> Result<MemAddr, HostError> {
        self.memaddrs
            .get(idx.0 as usize)
            .copied()
            .ok_or(HostError::MemoryNotFound(idx))
    }
}
