//! `ONNC_RUNTIME_averagepool_float`
//!
//! | declared | meaning                | native                   |
//! |----------|------------------------|--------------------------|
//! | 0        | runtime context        | `void *`                 |
//! | 1, 2, 3  | X data, rank, dims     | `const float *`, `int32_t`, `const int32_t *` |
//! | 4, 5, 6  | Y data, rank, dims     | `float *`, `int32_t`, `const int32_t *` |
//! | 7        | auto_pad               | `const char *`           |
//! | 8        | count_include_pad      | `int32_t`                |
//! | 9, 10    | kernel_shape, count    | `int32_t *`, `int32_t`   |
//! | 11, 12   | pads, count            | `int32_t *`, `int32_t`   |
//! | 13, 14   | strides, count         | `int32_t *`, `int32_t`   |

use std::sync::Arc;

use sandcall_ir::{Type, ValType::*};

use super::OnncRuntime;
use crate::function::HostFunc;

pub(super) const NAME: &str = "ONNC_RUNTIME_averagepool_float";

pub(super) fn typedef() -> Type {
    Type::new([I32; 15], [])
}

pub(super) fn host_func(runtime: Arc<dyn OnncRuntime>) -> HostFunc {
    HostFunc::new(NAME, typedef(), move |args, memory, _| {
        let context = memory.opaque(args.ptr(0)?)?;
        let x = memory.tensor::<f32>(args.ptr(1)?, args.u32(2)?, args.ptr(3)?)?;
        let y = memory.tensor::<f32>(args.ptr(4)?, args.u32(5)?, args.ptr(6)?)?;
        let auto_pad = memory.cstr(args.ptr(7)?)?;
        let count_include_pad = args.i32(8)?;
        let kernel_shape = memory.array::<i32>(args.ptr(9)?, args.u32(10)? as usize)?;
        let pads = memory.array::<i32>(args.ptr(11)?, args.u32(12)? as usize)?;
        let strides = memory.array::<i32>(args.ptr(13)?, args.u32(14)? as usize)?;

        // SAFETY: every region above was bounds-checked against its full
        // extent and borrows the memory exclusively for this call.
        unsafe {
            runtime.averagepool_float(
                context,
                x.data.as_ptr(),
                x.ndim,
                x.dims.as_ptr(),
                y.data.as_mut_ptr(),
                y.ndim,
                y.dims.as_ptr(),
                auto_pad.as_c_str_ptr(),
                count_include_pad,
                kernel_shape.as_mut_ptr(),
                args.i32(10)?,
                pads.as_mut_ptr(),
                args.i32(12)?,
                strides.as_mut_ptr(),
                args.i32(14)?,
            );
        }
        Ok(())
    })
}
