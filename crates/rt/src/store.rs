use sandcall_ir::MemType;

use crate::{error::HostError, memory::MemoryRegion};

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemAddr(pub u32);

impl std::fmt::Display for MemAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owns the linear memories of one or more module instances. Instances only
/// ever hold addresses into a store.
#[derive(Debug, Default)]
pub struct Store {
    memories: Vec<MemoryRegion>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_memory(&mut self, ty: MemType) -> MemAddr {
        self.insert(MemoryRegion::new(ty.0))
    }

    pub fn insert(&mut self, memory: MemoryRegion) -> MemAddr {
        let addr = MemAddr(self.memories.len() as u32);
        self.memories.push(memory);
        addr
    }

    pub fn memory_count(&self) -> usize {
        self.memories.len()
    }

    pub fn memory(&self, addr: MemAddr) -> Result<&MemoryRegion, HostError> {
        self.memories
            .get(addr.0 as usize)
            .ok_or(HostError::InvalidStoreAddress(addr))
    }

    pub fn memory_mut(&mut self, addr: MemAddr) -> Result<&mut MemoryRegion, HostError> {
        self.memories
            .get_mut(addr.0 as usize)
            .ok_or(HostError::InvalidStoreAddress(addr))
    }
}

#[cfg(test)]
mod test {
    use sandcall_ir::Limits;

    use super::*;

    #[test]
    fn addresses_are_dense() -> anyhow::Result<()> {
        let mut store = Store::new();
        let a = store.alloc_memory(MemType(Limits::Min(1)));
        let b = store.insert(MemoryRegion::with_len(1024));

        assert_eq!(a, MemAddr(0));
        assert_eq!(b, MemAddr(1));
        assert_eq!(store.memory(b)?.len(), 1024);
        assert_eq!(
            store.memory_mut(MemAddr(2)).unwrap_err(),
            HostError::InvalidStoreAddress(MemAddr(2))
        );
        Ok(())
    }
}
