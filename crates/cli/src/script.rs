use std::path::Path;

use sandcall_ir::Limits;
use sandcall_rt::{onnc, MemoryRegion, Value};
use serde::Deserialize;

/// A batch of host calls against one freshly built memory.
///
/// ```json
/// {
///   "memory": { "bytes": 1024 },
///   "data": [
///     { "offset": 0, "type": "f32", "value": [-1.0, 2.0, -3.0, 4.0] },
///     { "offset": 512, "type": "i32", "value": [4, 4] }
///   ],
///   "calls": [
///     {
///       "name": "ONNC_RUNTIME_relu_float",
///       "args": [
///         { "type": "i32", "value": 0 },
///         ...
///       ]
///     }
///   ],
///   "dump": [{ "offset": 64, "count": 4 }]
/// }
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct Script {
    pub memory: MemorySize,
    #[serde(default)]
    pub data: Vec<Data>,
    #[serde(default)]
    pub calls: Vec<Call>,
    #[serde(default)]
    pub dump: Vec<Dump>,
}

impl Script {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(data.as_str())?)
    }

    /// Allocates the memory and writes every data segment into it.
    pub fn memory(&self) -> anyhow::Result<MemoryRegion> {
        let mut memory = match self.memory {
            MemorySize::Bytes(len) => MemoryRegion::with_len(len),
            MemorySize::Pages(pages) => MemoryRegion::new(Limits::Min(pages)),
        };

        for segment in &self.data {
            let bytes: Vec<u8> = match &segment.kind {
                DataKind::F32(xs) => xs.iter().flat_map(|x| x.to_le_bytes()).collect(),
                DataKind::I32(xs) => xs.iter().flat_map(|x| x.to_le_bytes()).collect(),
                DataKind::Str(xs) => xs.bytes().chain([0]).collect(),
            };
            memory.write(segment.offset, &bytes)?;
        }
        Ok(memory)
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum MemorySize {
    Bytes(usize),
    Pages(u32),
}

#[derive(Deserialize, Debug, Clone)]
pub struct Data {
    pub offset: u32,
    #[serde(flatten)]
    pub kind: DataKind,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DataKind {
    F32(Vec<f32>),
    I32(Vec<i32>),
    /// Written with a trailing NUL.
    Str(String),
}

#[derive(Deserialize, Debug, Clone)]
pub struct Call {
    #[serde(default = "default_module")]
    pub module: String,
    pub name: String,
    /// In declaration order; pushed first to last.
    pub args: Vec<Arg>,
}

fn default_module() -> String {
    onnc::MODULE.to_string()
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Arg {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl From<Arg> for Value {
    fn from(arg: Arg) -> Self {
        match arg {
            Arg::I32(xs) => Value::I32(xs),
            Arg::I64(xs) => Value::I64(xs),
            Arg::F32(xs) => Value::F32(xs),
            Arg::F64(xs) => Value::F64(xs),
        }
    }
}

/// `count` f32s to print after all calls have run.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct Dump {
    pub offset: u32,
    pub count: usize,
}

#[cfg(test)]
mod test {
    use super::*;

    const RELU: &str = r#"{
        "memory": { "bytes": 1024 },
        "data": [
            { "offset": 0, "type": "f32", "value": [-1.0, 2.0, -3.0, 4.0] },
            { "offset": 512, "type": "i32", "value": [4, 4] },
            { "offset": 600, "type": "str", "value": "NOTSET" }
        ],
        "calls": [
            {
                "name": "ONNC_RUNTIME_relu_float",
                "args": [
                    { "type": "i32", "value": 0 },
                    { "type": "i32", "value": 0 },
                    { "type": "i32", "value": 1 },
                    { "type": "i32", "value": 512 },
                    { "type": "i32", "value": 64 },
                    { "type": "i32", "value": 1 },
                    { "type": "i32", "value": 516 }
                ]
            }
        ],
        "dump": [{ "offset": 64, "count": 4 }]
    }"#;

    #[test]
    fn parses_scripts() -> anyhow::Result<()> {
        let script: Script = serde_json::from_str(RELU)?;
        assert_eq!(script.calls.len(), 1);
        assert_eq!(script.calls[0].module, onnc::MODULE);
        assert_eq!(Value::from(script.calls[0].args[3]), Value::I32(512));
        assert_eq!(script.dump[0].count, 4);

        let memory = script.memory()?;
        assert_eq!(memory.len(), 1024);
        assert_eq!(memory.read(0, 4)?, &(-1.0f32).to_le_bytes());
        assert_eq!(memory.read(516, 4)?, &4i32.to_le_bytes());
        assert_eq!(memory.read(600, 7)?, b"NOTSET\0");
        Ok(())
    }

    #[test]
    fn pages_and_bad_segments() -> anyhow::Result<()> {
        let script: Script = serde_json::from_str(r#"{ "memory": { "pages": 1 } }"#)?;
        assert_eq!(script.memory()?.len(), 65536);

        let script: Script = serde_json::from_str(
            r#"{
                "memory": { "bytes": 8 },
                "data": [{ "offset": 4, "type": "i32", "value": [1, 2] }]
            }"#,
        )?;
        assert!(script.memory().is_err());
        Ok(())
    }
}
