//! `ONNC_RUNTIME_maxpool_float`
//!
//! | declared | meaning                  | native                                  |
//! |----------|--------------------------|-----------------------------------------|
//! | 0        | runtime context          | `void *`                                |
//! | 1, 2, 3  | X data, rank, dims       | `const float *`, `int32_t`, `const int32_t *` |
//! | 4, 5, 6  | Y data, rank, dims       | `float *`, `int32_t`, `const int32_t *` |
//! | 7, 8, 9  | Indices data, rank, dims | `float *`, `int32_t`, `const int32_t *` |
//! | 10       | auto_pad                 | `const char *`                          |
//! | 11, 12   | kernel_shape, count      | `int32_t *`, `int32_t`                  |
//! | 13, 14   | pads, count              | `int32_t *`, `int32_t`                  |
//! | 15       | storage_order            | `int32_t`                               |
//! | 16, 17   | strides, count           | `int32_t *`, `int32_t`                  |

use std::sync::Arc;

use sandcall_ir::{Type, ValType::*};

use super::OnncRuntime;
use crate::function::HostFunc;

pub(super) const NAME: &str = "ONNC_RUNTIME_maxpool_float";

pub(super) fn typedef() -> Type {
    Type::new([I32; 18], [])
}

pub(super) fn host_func(runtime: Arc<dyn OnncRuntime>) -> HostFunc {
    HostFunc::new(NAME, typedef(), move |args, memory, _| {
        let context = memory.opaque(args.ptr(0)?)?;
        let x = memory.tensor::<f32>(args.ptr(1)?, args.u32(2)?, args.ptr(3)?)?;
        let y = memory.tensor::<f32>(args.ptr(4)?, args.u32(5)?, args.ptr(6)?)?;
        let indices = memory.tensor::<f32>(args.ptr(7)?, args.u32(8)?, args.ptr(9)?)?;
        let auto_pad = memory.cstr(args.ptr(10)?)?;
        let kernel_shape = memory.array::<i32>(args.ptr(11)?, args.u32(12)? as usize)?;
        let pads = memory.array::<i32>(args.ptr(13)?, args.u32(14)? as usize)?;
        let storage_order = args.i32(15)?;
        let strides = memory.array::<i32>(args.ptr(16)?, args.u32(17)? as usize)?;

        // SAFETY: every region above was bounds-checked against its full
        // extent and borrows the memory exclusively for this call.
        unsafe {
            runtime.maxpool_float(
                context,
                x.data.as_ptr(),
                x.ndim,
                x.dims.as_ptr(),
                y.data.as_mut_ptr(),
                y.ndim,
                y.dims.as_ptr(),
                indices.data.as_mut_ptr(),
                indices.ndim,
                indices.dims.as_ptr(),
                auto_pad.as_c_str_ptr(),
                kernel_shape.as_mut_ptr(),
                args.i32(12)?,
                pads.as_mut_ptr(),
                args.i32(14)?,
                storage_order,
                strides.as_mut_ptr(),
                args.i32(17)?,
            );
        }
        Ok(())
    })
}
