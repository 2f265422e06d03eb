//! `ONNC_RUNTIME_relu_float`: context, then X and Y as `(data, rank, dims)`
//! triples, in the same order natively.

use std::sync::Arc;

use sandcall_ir::{Type, ValType::*};

use super::OnncRuntime;
use crate::function::HostFunc;

pub(super) const NAME: &str = "ONNC_RUNTIME_relu_float";

pub(super) fn typedef() -> Type {
    Type::new([I32; 7], [])
}

pub(super) fn host_func(runtime: Arc<dyn OnncRuntime>) -> HostFunc {
    HostFunc::new(NAME, typedef(), move |args, memory, _| {
        let context = memory.opaque(args.ptr(0)?)?;
        let x = memory.tensor::<f32>(args.ptr(1)?, args.u32(2)?, args.ptr(3)?)?;
        let y = memory.tensor::<f32>(args.ptr(4)?, args.u32(5)?, args.ptr(6)?)?;

        // SAFETY: every region above was bounds-checked against its full
        // extent and borrows the memory exclusively for this call.
        unsafe {
            runtime.relu_float(
                context,
                x.data.as_ptr(),
                x.ndim,
                x.dims.as_ptr(),
                y.data.as_mut_ptr(),
                y.ndim,
                y.dims.as_ptr(),
            );
        }
        Ok(())
    })
}
