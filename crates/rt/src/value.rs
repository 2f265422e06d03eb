use sandcall_ir::ValType;

#[derive(Clone, Copy, Debug)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl PartialEq for Value {
    // bitwise for floats, so NaN payloads survive a stack round trip.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::I32(l0), Self::I32(r0)) => l0 == r0,
            (Self::I64(l0), Self::I64(r0)) => l0 == r0,
            (Self::F32(l0), Self::F32(r0)) => l0.to_bits() == r0.to_bits(),
            (Self::F64(l0), Self::F64(r0)) => l0.to_bits() == r0.to_bits(),
            _ => false,
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValType {
        match self {
            Value::I32(_) => ValType::I32,
            Value::I64(_) => ValType::I64,
            Value::F32(_) => ValType::F32,
            Value::F64(_) => ValType::F64,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(xs) => Some(*xs),
            _ => None,
        }
    }

    /// The i32 payload reinterpreted as unsigned; this is how offsets,
    /// ranks and counts cross the boundary.
    pub fn as_u32(&self) -> Option<u32> {
        self.as_i32().map(|xs| xs as u32)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(xs) => Some(*xs),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(xs) => Some(*xs),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(xs) => Some(*xs),
            _ => None,
        }
    }

    // i64's are not valid candidates for memory offsets until mem64 lands.
    pub fn as_mem_offset(&self) -> Option<u32> {
        self.as_u32()
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::I32(value as i32)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}
