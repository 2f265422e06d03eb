use sandcall_ir::{MemIdx, ValType};
use thiserror::Error;

use crate::store::MemAddr;

/// Flat result code handed back to the interpreter. Anything other than
/// `Success` traps the calling sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    ArityError,
    TypeMismatch,
    MemoryNotFound,
    InvalidStoreAddress,
    MemoryAccessOutOfBounds,
    UnknownImport,
}

impl Status {
    pub fn of<T>(result: &Result<T, HostError>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(e) => e.status(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::Success => "success",
            Status::ArityError => "arity error",
            Status::TypeMismatch => "type mismatch",
            Status::MemoryNotFound => "memory not found",
            Status::InvalidStoreAddress => "invalid store address",
            Status::MemoryAccessOutOfBounds => "out of bounds memory access",
            Status::UnknownImport => "unknown import",
        })
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum HostError {
    #[error("wrong number of arguments (expected {expected}, got {received})")]
    Arity { expected: usize, received: usize },

    #[error("type mismatch at param {index}: expected {expected}, got {received}")]
    TypeMismatch {
        index: usize,
        expected: ValType,
        received: ValType,
    },

    #[error("module instance has no memory at index {0}")]
    MemoryNotFound(MemIdx),

    #[error("store has no memory at address {0}")]
    InvalidStoreAddress(MemAddr),

    #[error("out of bounds memory access (offset={offset}, len={len}, size={size})")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    #[error("{what} at offset {offset} describes an unrepresentable extent")]
    InvalidExtent { offset: u32, what: &'static str },

    #[error("no such host function {module}/{name}")]
    NoSuchFunction { module: String, name: String },
}

impl HostError {
    pub fn status(&self) -> Status {
        match self {
            HostError::Arity { .. } => Status::ArityError,
            HostError::TypeMismatch { .. } => Status::TypeMismatch,
            HostError::MemoryNotFound(_) => Status::MemoryNotFound,
            HostError::InvalidStoreAddress(_) => Status::InvalidStoreAddress,
            HostError::OutOfBounds { .. } | HostError::InvalidExtent { .. } => {
                Status::MemoryAccessOutOfBounds
            }
            HostError::NoSuchFunction { .. } => Status::UnknownImport,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extents_report_as_bounds_errors() {
        let err = HostError::InvalidExtent {
            offset: 12,
            what: "dims",
        };
        assert_eq!(err.status(), Status::MemoryAccessOutOfBounds);
        assert_eq!(Status::of::<()>(&Err(err)), Status::MemoryAccessOutOfBounds);
        assert_eq!(Status::of(&Ok(())), Status::Success);
    }

    #[test]
    fn messages() {
        let err = HostError::OutOfBounds {
            offset: 1020,
            len: 16,
            size: 1024,
        };
        assert_eq!(
            err.to_string(),
            "out of bounds memory access (offset=1020, len=16, size=1024)"
        );
    }
}
