use sandcall_ir::ValType;
use smallvec::SmallVec;

use crate::{error::HostError, value::Value};

pub type ArgVec = SmallVec<[Value; 20]>;

/// The interpreter's operand stack, as far as host calls see it.
#[derive(Debug, Default, Clone)]
pub struct ValueStack {
    values: SmallVec<[Value; 32]>,
}

impl ValueStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    /// Kinds from the bottom of the stack to the top; what the type checker
    /// sees at a call site.
    pub fn kinds(&self) -> impl Iterator<Item = ValType> + '_ {
        self.values.iter().map(Value::kind)
    }

    /// Pops `count` call arguments. The result is in pop order: the last
    /// declared parameter comes first.
    pub fn pop_args(&mut self, count: usize) -> Result<ArgVec, HostError> {
        if self.values.len() < count {
            return Err(HostError::Arity {
                expected: count,
                received: self.values.len(),
            });
        }

        let start = self.values.len() - count;
        Ok(self.values.drain(start..).rev().collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pop_args_yields_top_first() -> anyhow::Result<()> {
        let mut stack = ValueStack::new();
        stack.push(99i64);
        stack.push(1i32);
        stack.push(2.0f32);
        stack.push(3i32);

        let args = stack.pop_args(3)?;
        assert_eq!(args.as_slice(), &[Value::I32(3), Value::F32(2.0), Value::I32(1)]);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.peek(), Some(&Value::I64(99)));
        Ok(())
    }

    #[test]
    fn short_stack_is_an_arity_error() {
        let mut stack = ValueStack::new();
        stack.push(1i32);
        assert_eq!(
            stack.pop_args(2).unwrap_err(),
            HostError::Arity {
                expected: 2,
                received: 1
            }
        );
        // nothing was consumed
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn kinds_bottom_to_top() {
        let mut stack = ValueStack::new();
        stack.push(1i32);
        stack.push(1.0f64);
        assert_eq!(
            stack.kinds().collect::<Vec<_>>(),
            vec![ValType::I32, ValType::F64]
        );
    }
}
