mod error;
mod function;
mod imports;
mod instance;
pub(crate) mod intern_map;
mod memory;
pub mod onnc;
mod stack;
mod store;
mod value;

pub use error::{HostError, Status};
pub use function::{Args, HostFunc, NativeCall, Results};
pub use imports::{HostFuncs, Imports};
pub use instance::ModuleInstance;
pub use memory::{Element, MemoryRegion, MemoryView, Region, Tensor};
pub use stack::{ArgVec, ValueStack};
pub use store::{MemAddr, Store};
pub use value::Value;

#[cfg(test)]
mod test_utils;
