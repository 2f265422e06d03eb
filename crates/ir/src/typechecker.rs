use thiserror::Error;

use crate::{Type, ValType};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TypeError {
    #[error("type mismatch: expected {expected}, got {received} (param {param})")]
    TypeMismatch {
        param: usize,
        received: ValType,
        expected: ValType,
    },

    #[error("type mismatch: call needs {needed} operands, stack holds {available}")]
    StackUnderflow { needed: usize, available: usize },
}

/// Operand-stack model used to validate call sites against a host function
/// signature before any call is emitted.
#[derive(Default, Debug, Clone)]
pub struct TypeChecker {
    vals: Vec<ValType>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }

    pub fn push_val(&mut self, val: ValType) {
        self.vals.push(val);
    }

    fn pop_val(&mut self, param: usize, expected: ValType) -> Result<ValType, TypeError> {
        let available = self.vals.len();
        let actual = self.vals.pop().ok_or(TypeError::StackUnderflow {
            needed: param + 1,
            available,
        })?;

        if expected != actual {
            return Err(TypeError::TypeMismatch {
                param,
                received: actual,
                expected,
            });
        }
        Ok(actual)
    }

    /// Pops the parameters of `ty` (last parameter first) and pushes its
    /// results.
    pub fn call(&mut self, ty: &Type) -> Result<(), TypeError> {
        let params = ty.params();
        if self.vals.len() < params.len() {
            return Err(TypeError::StackUnderflow {
                needed: params.len(),
                available: self.vals.len(),
            });
        }

        for (param, expected) in params.iter().enumerate().rev() {
            self.pop_val(param, *expected)?;
        }

        for result in ty.results() {
            self.push_val(*result);
        }
        Ok(())
    }
}

/// Checks that the top of `operands` (bottom to top) can feed a call to `ty`.
pub fn check_call(ty: &Type, operands: &[ValType]) -> Result<(), TypeError> {
    let mut checker = TypeChecker::new();
    for operand in operands {
        checker.push_val(*operand);
    }
    checker.call(ty)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ValType::*;

    #[test]
    fn accepts_matching_operands() -> Result<(), TypeError> {
        let ty = Type::new([I32, F32, I32], []);
        check_call(&ty, &[I32, F32, I32])?;

        // extra operands below the call are left alone
        check_call(&ty, &[F64, I32, F32, I32])?;
        Ok(())
    }

    #[test]
    fn rejects_swapped_kinds() {
        let ty = Type::new([I32, F32], []);
        let err = check_call(&ty, &[F32, I32]).unwrap_err();
        assert_eq!(
            err,
            TypeError::TypeMismatch {
                param: 1,
                received: I32,
                expected: F32,
            }
        );
    }

    #[test]
    fn rejects_short_stack() {
        let ty = Type::new([I32; 15], []);
        let err = check_call(&ty, &[I32; 14]).unwrap_err();
        assert_eq!(
            err,
            TypeError::StackUnderflow {
                needed: 15,
                available: 14
            }
        );
    }

    #[test]
    fn results_replace_params() -> Result<(), TypeError> {
        let mut checker = TypeChecker::new();
        checker.push_val(F64);
        checker.push_val(I32);
        checker.push_val(F32);
        checker.call(&Type::new([I32, F32], [I64]))?;
        assert_eq!(checker.len(), 2);

        // the i64 result now sits on top
        let err = checker.call(&Type::new([F64, F64], [])).unwrap_err();
        assert_eq!(
            err,
            TypeError::TypeMismatch {
                param: 1,
                received: I64,
                expected: F64,
            }
        );
        Ok(())
    }
}
