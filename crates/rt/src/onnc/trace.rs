use std::{
    ffi::{c_char, c_void, CStr},
    sync::Mutex,
};

use super::OnncRuntime;

#[derive(Debug, Clone, PartialEq)]
pub struct TracedTensor {
    pub role: &'static str,
    pub addr: usize,
    pub shape: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Int(i32),
    Float(f32),
    Ints(Vec<i32>),
    Str(String),
}

impl std::fmt::Display for Attr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attr::Int(xs) => write!(f, "{xs}"),
            Attr::Float(xs) => write!(f, "{xs}"),
            Attr::Ints(xs) => write!(f, "{xs:?}"),
            Attr::Str(xs) => write!(f, "{xs:?}"),
        }
    }
}

/// One kernel invocation as the native side saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub op: &'static str,
    pub context: usize,
    pub tensors: Vec<TracedTensor>,
    pub attrs: Vec<(&'static str, Attr)>,
}

impl TraceEvent {
    fn new(op: &'static str, context: *mut c_void) -> Self {
        Self {
            op,
            context: context as usize,
            tensors: vec![],
            attrs: vec![],
        }
    }

    pub fn tensor(&self, role: &str) -> Option<&TracedTensor> {
        self.tensors.iter().find(|xs| xs.role == role)
    }

    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs
            .iter()
            .find_map(|(key, value)| (*key == name).then_some(value))
    }
}

impl std::fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ctx={:#x}", self.op, self.context)?;
        for tensor in &self.tensors {
            write!(f, " {}={:?}@{:#x}", tensor.role, tensor.shape, tensor.addr)?;
        }
        for (key, value) in &self.attrs {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// A stand-in kernel library that records what it was handed and, if asked,
/// fills each `Y` output with a constant. It computes nothing.
#[derive(Debug, Default)]
pub struct TraceRuntime {
    fill: Option<f32>,
    events: Mutex<Vec<TraceEvent>>,
}

impl TraceRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill(value: f32) -> Self {
        Self {
            fill: Some(value),
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn take_events(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn record(&self, event: TraceEvent) {
        log::info!("{event}");
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    /// # Safety
    /// `dims` must be valid for `ndim` reads and `data` for the product of
    /// those dims.
    unsafe fn tensor(
        &self,
        role: &'static str,
        data: *const f32,
        ndim: i32,
        dims: *const i32,
    ) -> TracedTensor {
        TracedTensor {
            role,
            addr: data as usize,
            shape: ints(dims, ndim),
        }
    }

    /// # Safety
    /// As for [`TraceRuntime::tensor`].
    unsafe fn output(&self, data: *mut f32, ndim: i32, dims: *const i32) -> TracedTensor {
        let tensor = self.tensor("Y", data, ndim, dims);
        if let Some(value) = self.fill {
            let count: usize = tensor.shape.iter().map(|dim| *dim as usize).product();
            for idx in 0..count {
                data.add(idx).write_unaligned(value);
            }
        }
        tensor
    }
}

unsafe fn ints(ptr: *const i32, count: i32) -> Vec<i32> {
    (0..count.max(0) as usize)
        .map(|idx| ptr.add(idx).read_unaligned())
        .collect()
}

unsafe fn string(ptr: *const c_char) -> String {
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

#[allow(clippy::too_many_arguments)]
impl OnncRuntime for TraceRuntime {
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
        let mut event = TraceEvent::new("averagepool_float", context);
        event
            .tensors
            .push(self.tensor("X", input_x, input_x_ndim, input_x_dims));
        event
            .tensors
            .push(self.output(output_y, output_y_ndim, output_y_dims));
        event.attrs = vec![
            ("auto_pad", Attr::Str(string(auto_pad))),
            ("count_include_pad", Attr::Int(count_include_pad)),
            ("kernel_shape", Attr::Ints(ints(kernel_shape, number_of_kernel_shape))),
            ("pads", Attr::Ints(ints(pads, number_of_pads))),
            ("strides", Attr::Ints(ints(strides, number_of_strides))),
        ];
        self.record(event);
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
        let mut event = TraceEvent::new("gemm_float", context);
        event.tensors = vec![
            self.tensor("A", input_a, input_a_ndim, input_a_dims),
            self.tensor("B", input_b, input_b_ndim, input_b_dims),
            self.tensor("C", input_c, input_c_ndim, input_c_dims),
            self.output(output_y, output_y_ndim, output_y_dims),
        ];
        event.attrs = vec![
            ("alpha", Attr::Float(alpha)),
            ("beta", Attr::Float(beta)),
            ("transA", Attr::Int(trans_a)),
            ("transB", Attr::Int(trans_b)),
        ];
        self.record(event);
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
        let mut event = TraceEvent::new("maxpool_float", context);
        event.tensors = vec![
            self.tensor("X", input_x, input_x_ndim, input_x_dims),
            self.output(output_y, output_y_ndim, output_y_dims),
            self.tensor(
                "Indices",
                output_indices,
                output_indices_ndim,
                output_indices_dims,
            ),
        ];
        event.attrs = vec![
            ("auto_pad", Attr::Str(string(auto_pad))),
            ("kernel_shape", Attr::Ints(ints(kernel_shape, number_of_kernel_shape))),
            ("pads", Attr::Ints(ints(pads, number_of_pads))),
            ("storage_order", Attr::Int(storage_order)),
            ("strides", Attr::Ints(ints(strides, number_of_strides))),
        ];
        self.record(event);
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
        let mut event = TraceEvent::new("relu_float", context);
        event.tensors = vec![
            self.tensor("X", input_x, input_x_ndim, input_x_dims),
            self.output(output_y, output_y_ndim, output_y_dims),
        ];
        self.record(event);
    }
}
