//! `ONNC_RUNTIME_gemm_float`
//!
//! | declared   | meaning             | native                                        |
//! |------------|---------------------|-----------------------------------------------|
//! | 0          | runtime context     | `void *`                                      |
//! | 1, 2, 3    | A data, rank, dims  | `const float *`, `int32_t`, `const int32_t *` |
//! | 4, 5, 6    | B data, rank, dims  | `const float *`, `int32_t`, `const int32_t *` |
//! | 7, 8, 9    | C data, rank, dims  | `const float *`, `int32_t`, `const int32_t *` |
//! | 10, 11, 12 | Y data, rank, dims  | `float *`, `int32_t`, `const int32_t *`       |
//! | 13, 14     | alpha, beta (`f32`) | `float`, `float`                              |
//! | 15, 16     | transA, transB      | `int32_t`, `int32_t`                          |

use std::sync::Arc;

use sandcall_ir::{Type, ValType::*};

use super::OnncRuntime;
use crate::function::HostFunc;

pub(super) const NAME: &str = "ONNC_RUNTIME_gemm_float";

pub(super) fn typedef() -> Type {
    Type::new(
        [
            I32, I32, I32, I32, I32, I32, I32, I32, I32, I32, I32, I32, I32, F32, F32, I32, I32,
        ],
        [],
    )
}

pub(super) fn host_func(runtime: Arc<dyn OnncRuntime>) -> HostFunc {
    HostFunc::new(NAME, typedef(), move |args, memory, _| {
        let context = memory.opaque(args.ptr(0)?)?;
        let a = memory.tensor::<f32>(args.ptr(1)?, args.u32(2)?, args.ptr(3)?)?;
        let b = memory.tensor::<f32>(args.ptr(4)?, args.u32(5)?, args.ptr(6)?)?;
        let c = memory.tensor::<f32>(args.ptr(7)?, args.u32(8)?, args.ptr(9)?)?;
        let y = memory.tensor::<f32>(args.ptr(10)?, args.u32(11)?, args.ptr(12)?)?;
        let alpha = args.f32(13)?;
        let beta = args.f32(14)?;
        let trans_a = args.i32(15)?;
        let trans_b = args.i32(16)?;

        // SAFETY: all four tensors were checked against their dims.
        unsafe {
            runtime.gemm_float(
                context,
                a.data.as_ptr(),
                a.ndim,
                a.dims.as_ptr(),
                b.data.as_ptr(),
                b.ndim,
                b.dims.as_ptr(),
                c.data.as_ptr(),
                c.ndim,
                c.dims.as_ptr(),
                y.data.as_mut_ptr(),
                y.ndim,
                y.dims.as_ptr(),
                alpha,
                beta,
                trans_a,
                trans_b,
            );
        }
        Ok(())
    })
}
