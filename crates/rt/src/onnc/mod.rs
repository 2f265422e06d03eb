//! Host functions backed by the ONNC runtime kernels.
//!
//! Every operator is exported under [`MODULE`] with only `i32`/`f32`
//! parameters and no results; outputs are written through output pointers.
//! Each submodule documents how its declared parameters map onto the native
//! kernel's parameter list.
//!
//! Tensors arrive as `(data, ndim, dims)` triples. Before a kernel runs, the
//! dims array is checked for `ndim` entries and the data for the product of
//! those dims, so a kernel never receives a pointer whose extent runs past
//! the end of memory.

use std::{
    ffi::{c_char, c_void},
    sync::Arc,
};

use crate::imports::Imports;

mod averagepool;
mod gemm;
mod maxpool;
mod relu;
mod trace;

pub use trace::{Attr, TraceEvent, TraceRuntime, TracedTensor};

pub const MODULE: &str = "onnc_wasm";

/// The native kernels, in their own parameter order.
///
/// # Safety
///
/// Callers guarantee every data pointer is valid for the element count given
/// by its dims, every dims/array pointer for its rank/count, and every
/// string pointer up to and including its NUL terminator. Pointers may
/// alias one another.
#[allow(clippy::too_many_arguments)]
pub trait OnncRuntime: Send + Sync {
    unsafe fn averagepool_float(
        &self,
        context: *mut c_void,
        input_x: *const f32,
        input_x_ndim: i32,
        input_x_dims: *const i32,
        output_y: *mut f32,
        output_y_ndim: i32,
        output_y_dims: *const i32,
        auto_pad: *const c_char,
        count_include_pad: i32,
        kernel_shape: *mut i32,
        number_of_kernel_shape: i32,
        pads: *mut i32,
        number_of_pads: i32,
        strides: *mut i32,
        number_of_strides: i32,
    );

    unsafe fn gemm_float(
        &self,
        context: *mut c_void,
        input_a: *const f32,
        input_a_ndim: i32,
        input_a_dims: *const i32,
        input_b: *const f32,
        input_b_ndim: i32,
        input_b_dims: *const i32,
        input_c: *const f32,
        input_c_ndim: i32,
        input_c_dims: *const i32,
        output_y: *mut f32,
        output_y_ndim: i32,
        output_y_dims: *const i32,
        alpha: f32,
        beta: f32,
        trans_a: i32,
        trans_b: i32,
    );

    unsafe fn maxpool_float(
        &self,
        context: *mut c_void,
        input_x: *const f32,
        input_x_ndim: i32,
        input_x_dims: *const i32,
        output_y: *mut f32,
        output_y_ndim: i32,
        output_y_dims: *const i32,
        output_indices: *mut f32,
        output_indices_ndim: i32,
        output_indices_dims: *const i32,
        auto_pad: *const c_char,
        kernel_shape: *mut i32,
        number_of_kernel_shape: i32,
        pads: *mut i32,
        number_of_pads: i32,
        storage_order: i32,
        strides: *mut i32,
        number_of_strides: i32,
    );

    unsafe fn relu_float(
        &self,
        context: *mut c_void,
        input_x: *const f32,
        input_x_ndim: i32,
        input_x_dims: *const i32,
        output_y: *mut f32,
        output_y_ndim: i32,
        output_y_dims: *const i32,
    );
}

pub type AveragePoolFloatFn = unsafe extern "C" fn(
    *mut c_void,
    *const f32,
    i32,
    *const i32,
    *mut f32,
    i32,
    *const i32,
    *const c_char,
    i32,
    *mut i32,
    i32,
    *mut i32,
    i32,
    *mut i32,
    i32,
);

pub type GemmFloatFn = unsafe extern "C" fn(
    *mut c_void,
    *const f32,
    i32,
    *const i32,
    *const f32,
    i32,
    *const i32,
    *const f32,
    i32,
    *const i32,
    *mut f32,
    i32,
    *const i32,
    f32,
    f32,
    i32,
    i32,
);

pub type MaxPoolFloatFn = unsafe extern "C" fn(
    *mut c_void,
    *const f32,
    i32,
    *const i32,
    *mut f32,
    i32,
    *const i32,
    *mut f32,
    i32,
    *const i32,
    *const c_char,
    *mut i32,
    i32,
    *mut i32,
    i32,
    i32,
    *mut i32,
    i32,
);

pub type ReluFloatFn =
    unsafe extern "C" fn(*mut c_void, *const f32, i32, *const i32, *mut f32, i32, *const i32);

/// Kernel entry points resolved from a native ONNC runtime library
/// (`ONNC_RUNTIME_averagepool_float` and friends).
#[derive(Debug, Clone, Copy)]
pub struct OnncSymbols {
    pub averagepool_float: AveragePoolFloatFn,
    pub gemm_float: GemmFloatFn,
    pub maxpool_float: MaxPoolFloatFn,
    pub relu_float: ReluFloatFn,
}

#[allow(clippy::too_many_arguments)]
impl OnncRuntime for OnncSymbols {
    unsafe fn averagepool_float(
        &self,
        context: *mut c_void,
        input_x: *const f32,
        input_x_ndim: i32,
        input_x_dims: *const i32,
        output_y: *mut f32,
        output_y_ndim: i32,
        output_y_dims: *const i32,
        auto_pad: *const c_char,
        count_include_pad: i32,
        kernel_shape: *mut i32,
        number_of_kernel_shape: i32,
        pads: *mut i32,
        number_of_pads: i32,
        strides: *mut i32,
        number_of_strides: i32,
    ) {
        (self.averagepool_float)(
            context,
            input_x,
            input_x_ndim,
            input_x_dims,
            output_y,
            output_y_ndim,
            output_y_dims,
            auto_pad,
            count_include_pad,
            kernel_shape,
            number_of_kernel_shape,
            pads,
            number_of_pads,
            strides,
            number_of_strides,
        )
    }

    unsafe fn gemm_float(
        &self,
        context: *mut c_void,
        input_a: *const f32,
        input_a_ndim: i32,
        input_a_dims: *const i32,
        input_b: *const f32,
        input_b_ndim: i32,
        input_b_dims: *const i32,
        input_c: *const f32,
        input_c_ndim: i32,
        input_c_dims: *const i32,
        output_y: *mut f32,
        output_y_ndim: i32,
        output_y_dims: *const i32,
        alpha: f32,
        beta: f32,
        trans_a: i32,
        trans_b: i32,
    ) {
        (self.gemm_float)(
            context,
            input_a,
            input_a_ndim,
            input_a_dims,
            input_b,
            input_b_ndim,
            input_b_dims,
            input_c,
            input_c_ndim,
            input_c_dims,
            output_y,
            output_y_ndim,
            output_y_dims,
            alpha,
            beta,
            trans_a,
            trans_b,
        )
    }

    unsafe fn maxpool_float(
        &self,
        context: *mut c_void,
        input_x: *const f32,
        input_x_ndim: i32,
        input_x_dims: *const i32,
        output_y: *mut f32,
        output_y_ndim: i32,
        output_y_dims: *const i32,
        output_indices: *mut f32,
        output_indices_ndim: i32,
        output_indices_dims: *const i32,
        auto_pad: *const c_char,
        kernel_shape: *mut i32,
        number_of_kernel_shape: i32,
        pads: *mut i32,
        number_of_pads: i32,
        storage_order: i32,
        strides: *mut i32,
        number_of_strides: i32,
    ) {
        (self.maxpool_float)(
            context,
            input_x,
            input_x_ndim,
            input_x_dims,
            output_y,
            output_y_ndim,
            output_y_dims,
            output_indices,
            output_indices_ndim,
            output_indices_dims,
            auto_pad,
            kernel_shape,
            number_of_kernel_shape,
            pads,
            number_of_pads,
            storage_order,
            strides,
            number_of_strides,
        )
    }

    unsafe fn relu_float(
        &self,
        context: *mut c_void,
        input_x: *const f32,
        input_x_ndim: i32,
        input_x_dims: *const i32,
        output_y: *mut f32,
        output_y_ndim: i32,
        output_y_dims: *const i32,
    ) {
        (self.relu_float)(
            context,
            input_x,
            input_x_ndim,
            input_x_dims,
            output_y,
            output_y_ndim,
            output_y_dims,
        )
    }
}

/// Links every ONNC operator into `imports` under [`MODULE`].
pub fn link(imports: &mut Imports, runtime: Arc<dyn OnncRuntime>) -> anyhow::Result<()> {
    imports.link(MODULE, averagepool::host_func(runtime.clone()))?;
    imports.link(MODULE, gemm::host_func(runtime.clone()))?;
    imports.link(MODULE, maxpool::host_func(runtime.clone()))?;
    imports.link(MODULE, relu::host_func(runtime))?;
    Ok(())
}
