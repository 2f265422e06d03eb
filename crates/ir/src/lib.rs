mod defs;
pub mod typechecker;

pub use defs::*;
pub use typechecker::{check_call, TypeError};
