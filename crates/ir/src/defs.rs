pub const PAGE_SHIFT: usize = 16;
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

// wasm32 addresses cap linear memory at 4GiB.
pub const MAX_PAGES: u32 = 1 << (32 - PAGE_SHIFT);

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ValType {
    I32,
    I64,
    F32,
    F64,
}

impl std::fmt::Display for ValType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValType::I32 => f.write_str("i32"),
            ValType::F32 => f.write_str("f32"),
            ValType::I64 => f.write_str("i64"),
            ValType::F64 => f.write_str("f64"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct ResultType(pub Box<[ValType]>);

impl ResultType {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValType> {
        self.0.iter()
    }
}

impl<const N: usize> From<[ValType; N]> for ResultType {
    fn from(value: [ValType; N]) -> Self {
        Self(value.into())
    }
}

impl From<Vec<ValType>> for ResultType {
    fn from(value: Vec<ValType>) -> Self {
        Self(value.into_boxed_slice())
    }
}

/// A function signature: parameters, then results.
#[derive(Debug, PartialEq, Clone)]
pub struct Type(pub ResultType, pub ResultType);

impl Type {
    pub fn new(params: impl Into<ResultType>, results: impl Into<ResultType>) -> Self {
        Self(params.into(), results.into())
    }

    pub fn params(&self) -> &[ValType] {
        &self.0 .0
    }

    pub fn results(&self) -> &[ValType] {
        &self.1 .0
    }

    pub fn input_arity(&self) -> usize {
        self.0 .0.len()
    }

    pub fn output_arity(&self) -> usize {
        self.1 .0.len()
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        for (idx, param) in self.params().iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            std::fmt::Display::fmt(param, f)?;
        }
        f.write_str(") -> (")?;
        for (idx, result) in self.results().iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            std::fmt::Display::fmt(result, f)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Limits {
    Min(u32),
    Range(u32, u32),
}

impl Limits {
    pub fn min(&self) -> u32 {
        *match self {
            Limits::Min(min) => min,
            Limits::Range(min, _) => min,
        }
    }

    pub fn max(&self) -> Option<u32> {
        match self {
            Limits::Min(_) => None,
            Limits::Range(_, max) => Some(*max),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct MemType(pub Limits);

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct MemIdx(pub u32);

impl std::fmt::Display for MemIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
