use std::sync::Arc;

use sandcall_ir::{MemIdx, Type, ValType};
use smallvec::SmallVec;

use crate::{
    error::HostError,
    instance::ModuleInstance,
    memory::MemoryView,
    stack::ArgVec,
    store::Store,
    value::Value,
};

pub type Results = SmallVec<[Value; 1]>;

/// Maps declared arguments onto a native routine. Runs with exclusive access
/// to the caller's default memory.
pub type NativeCall =
    Arc<dyn Fn(&Args, &MemoryView<'_>, &mut [Value]) -> Result<(), HostError> + Send + Sync>;

/// Call arguments in declaration order, kind-checked against a signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    values: ArgVec,
}

impl Args {
    /// Rebuilds declaration order from arguments as they come off the
    /// operand stack (last declared parameter first).
    pub fn from_stack_order(received: &[Value], ty: &Type) -> Result<Self, HostError> {
        let params = ty.params();
        if received.len() != params.len() {
            return Err(HostError::Arity {
                expected: params.len(),
                received: received.len(),
            });
        }

        let values: ArgVec = received.iter().rev().copied().collect();
        for (index, (value, expected)) in values.iter().zip(params.iter()).enumerate() {
            if value.kind() != *expected {
                return Err(HostError::TypeMismatch {
                    index,
                    expected: *expected,
                    received: value.kind(),
                });
            }
        }

        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        self.values.as_slice()
    }

    fn typed<T>(
        &self,
        index: usize,
        kind: ValType,
        get: impl Fn(&Value) -> Option<T>,
    ) -> Result<T, HostError> {
        let value = self.values.get(index).ok_or(HostError::Arity {
            expected: index + 1,
            received: self.values.len(),
        })?;

        get(value).ok_or(HostError::TypeMismatch {
            index,
            expected: kind,
            received: value.kind(),
        })
    }

    pub fn i32(&self, index: usize) -> Result<i32, HostError> {
        self.typed(index, ValType::I32, Value::as_i32)
    }

    pub fn u32(&self, index: usize) -> Result<u32, HostError> {
        self.typed(index, ValType::I32, Value::as_u32)
    }

    pub fn i64(&self, index: usize) -> Result<i64, HostError> {
        self.typed(index, ValType::I64, Value::as_i64)
    }

    pub fn f32(&self, index: usize) -> Result<f32, HostError> {
        self.typed(index, ValType::F32, Value::as_f32)
    }

    pub fn f64(&self, index: usize) -> Result<f64, HostError> {
        self.typed(index, ValType::F64, Value::as_f64)
    }

    /// An offset into the caller's memory. Only meaningful once translated.
    pub fn ptr(&self, index: usize) -> Result<u32, HostError> {
        self.typed(index, ValType::I32, Value::as_mem_offset)
    }
}

/// A host function: an immutable signature plus the adapter that calls the
/// native routine.
#[derive(Clone)]
pub struct HostFunc {
    name: Arc<str>,
    typedef: Type,
    call: NativeCall,
}

impl std::fmt::Debug for HostFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFunc")
            .field("name", &self.name)
            .field("typedef", &self.typedef)
            .finish()
    }
}

impl HostFunc {
    pub fn new(
        name: &str,
        typedef: Type,
        call: impl Fn(&Args, &MemoryView<'_>, &mut [Value]) -> Result<(), HostError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            typedef,
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn typedef(&self) -> &Type {
        &self.typedef
    }

    /// Invokes the function with arguments in operand-stack order.
    ///
    /// Checks run strictly in order: arity and kinds, then memory
    /// resolution, then (inside the adapter) translation of every pointer.
    /// The native routine only runs once all of them have passed.
    pub fn invoke(
        &self,
        received: &[Value],
        store: &mut Store,
        instance: &ModuleInstance,
    ) -> Result<Results, HostError> {
        let result = self.invoke_inner(received, store, instance);
        match &result {
            Ok(_) => log::debug!("{}: ok", self.name),
            Err(e) => log::warn!("{}: {e}", self.name),
        }
        result
    }

    fn invoke_inner(
        &self,
        received: &[Value],
        store: &mut Store,
        instance: &ModuleInstance,
    ) -> Result<Results, HostError> {
        let args = Args::from_stack_order(received, &self.typedef)?;
        log::debug!("{}{} args={:?}", self.name, self.typedef, args.as_slice());

        let memaddr = instance.memaddr(MemIdx(0))?;
        let memory = store.memory_mut(memaddr)?;

        let mut results: Results = self
            .typedef
            .results()
            .iter()
            .map(|kind| match kind {
                ValType::I32 => Value::I32(0),
                ValType::I64 => Value::I64(0),
                ValType::F32 => Value::F32(0.0),
                ValType::F64 => Value::F64(0.0),
            })
            .collect();

        {
            let view = memory.view();
            (self.call)(&args, &view, &mut results)?;
        }

        for (index, (value, expected)) in results.iter().zip(self.typedef.results()).enumerate() {
            if value.kind() != *expected {
                return Err(HostError::TypeMismatch {
                    index,
                    expected: *expected,
                    received: value.kind(),
                });
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use sandcall_ir::ValType::*;

    use super::*;
    use crate::{memory::MemoryRegion, store::MemAddr};

    fn sandbox(len: usize) -> (Store, ModuleInstance) {
        let mut store = Store::new();
        let addr = store.insert(MemoryRegion::with_len(len));
        (store, ModuleInstance::new().with_memory(addr))
    }

    #[test]
    fn unreverses_stack_order() -> anyhow::Result<()> {
        let ty = Type::new([I32, I64, F32, F64], []);
        let declared = [
            Value::I32(0),
            Value::I64(1),
            Value::F32(2.0),
            Value::F64(3.0),
        ];
        let received: Vec<_> = declared.iter().rev().copied().collect();

        let args = Args::from_stack_order(&received, &ty)?;
        assert_eq!(args.as_slice(), &declared);
        assert_eq!(args.i64(1)?, 1);
        assert_eq!(args.f64(3)?, 3.0);
        Ok(())
    }

    #[test]
    fn accessors_do_not_reinterpret() -> anyhow::Result<()> {
        let ty = Type::new([F32, I32], []);
        let args = Args::from_stack_order(&[Value::I32(-4), Value::F32(1.0)], &ty)?;

        assert_eq!(args.f32(0)?, 1.0);
        assert_eq!(args.u32(1)?, (-4i32) as u32);
        assert_eq!(
            args.i32(0).unwrap_err(),
            HostError::TypeMismatch {
                index: 0,
                expected: I32,
                received: F32
            }
        );
        assert!(args.ptr(2).is_err());
        Ok(())
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let ty = Type::new([I32, F32], []);
        // declared order would be (f32, i32)
        let err = Args::from_stack_order(&[Value::I32(0), Value::F32(0.0)], &ty).unwrap_err();
        assert_eq!(err.status(), crate::Status::TypeMismatch);
    }

    #[test]
    fn arity_is_checked_before_memory() {
        let called = Arc::new(AtomicUsize::new(0));
        let counter = called.clone();
        let func = HostFunc::new("noop", Type::new([I32, I32], []), move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        // no memory anywhere: arity still wins
        let mut store = Store::new();
        let instance = ModuleInstance::new();
        let err = func
            .invoke(&[Value::I32(0)], &mut store, &instance)
            .unwrap_err();
        assert_eq!(
            err,
            HostError::Arity {
                expected: 2,
                received: 1
            }
        );
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn resolution_errors() {
        let func = HostFunc::new("noop", Type::new([], []), |_, _, _| Ok(()));

        let mut store = Store::new();
        let err = func
            .invoke(&[], &mut store, &ModuleInstance::new())
            .unwrap_err();
        assert_eq!(err, HostError::MemoryNotFound(MemIdx(0)));

        let instance = ModuleInstance::new().with_memory(MemAddr(4));
        let err = func.invoke(&[], &mut store, &instance).unwrap_err();
        assert_eq!(err, HostError::InvalidStoreAddress(MemAddr(4)));
    }

    #[test]
    fn results_come_back() -> anyhow::Result<()> {
        let (mut store, instance) = sandbox(64);
        store.memory_mut(MemAddr(0))?.store(8, &42i32.to_le_bytes())?;

        let load = HostFunc::new("load_i32", Type::new([I32], [I32]), |args, memory, results| {
            let cell = memory.array::<i32>(args.ptr(0)?, 1)?;
            results[0] = Value::I32(cell.get(0).unwrap_or_default());
            Ok(())
        });

        let results = load.invoke(&[Value::I32(8)], &mut store, &instance)?;
        assert_eq!(results.as_slice(), &[Value::I32(42)]);

        let err = load
            .invoke(&[Value::I32(62)], &mut store, &instance)
            .unwrap_err();
        assert_eq!(err.status(), crate::Status::MemoryAccessOutOfBounds);
        Ok(())
    }

    #[test]
    fn mistyped_results_are_rejected() {
        let (mut store, instance) = sandbox(8);
        let func = HostFunc::new("bad", Type::new([], [F32]), |_, _, results| {
            results[0] = Value::I32(1);
            Ok(())
        });
        assert!(matches!(
            func.invoke(&[], &mut store, &instance),
            Err(HostError::TypeMismatch { index: 0, .. })
        ));
    }
}
