use std::{collections::HashMap, sync::Arc};

use sandcall_ir::Type;

use crate::{
    error::HostError,
    function::{Args, HostFunc, Results},
    instance::ModuleInstance,
    intern_map::{ImportKey, InternMap},
    memory::MemoryView,
    stack::ValueStack,
    store::Store,
    value::Value,
};

/// Collects host functions before any sandbox runs. Freeze with
/// [`Imports::build`]; the result cannot be modified.
#[derive(Debug, Default, Clone)]
pub struct Imports {
    internmap: InternMap,
    externs: HashMap<ImportKey, usize>,
    functions: Vec<HostFunc>,
}

impl Imports {
    pub fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    pub fn link(&mut self, modname: &str, func: HostFunc) -> anyhow::Result<()> {
        let key = self.internmap.insert_key(modname, func.name());
        if self.externs.contains_key(&key) {
            anyhow::bail!("{modname}/{} is already linked", func.name());
        }

        log::debug!("link {modname}/{}{}", func.name(), func.typedef());
        self.externs.insert(key, self.functions.len());
        self.functions.push(func);
        Ok(())
    }

    pub fn link_hostfn(
        &mut self,
        modname: &str,
        funcname: &str,
        typedef: Type,
        func: impl Fn(&Args, &MemoryView<'_>, &mut [Value]) -> Result<(), HostError>
            + Send
            + Sync
            + 'static,
    ) -> anyhow::Result<()> {
        self.link(modname, HostFunc::new(funcname, typedef, func))
    }

    pub fn build(self) -> HostFuncs {
        HostFuncs {
            inner: Arc::new(self),
        }
    }
}

/// The frozen function table. Cheap to clone and safe to share between
/// threads; each thread brings its own [`Store`].
#[derive(Debug, Clone)]
pub struct HostFuncs {
    inner: Arc<Imports>,
}

impl HostFuncs {
    pub fn len(&self) -> usize {
        self.inner.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.functions.is_empty()
    }

    pub fn lookup(&self, modname: &str, name: &str) -> Option<&HostFunc> {
        let key = self.inner.internmap.key(modname, name)?;
        let idx = self.inner.externs.get(&key)?;
        self.inner.functions.get(*idx)
    }

    pub fn typedef(&self, modname: &str, name: &str) -> Option<&Type> {
        self.lookup(modname, name).map(HostFunc::typedef)
    }

    /// `(module, name, function)` for every linked import, in link order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &HostFunc)> + '_ {
        let mut entries: Vec<_> = self
            .inner
            .externs
            .iter()
            .filter_map(|(key, idx)| {
                let (modname, name) = self.inner.internmap.resolve(*key)?;
                Some((*idx, modname, name))
            })
            .collect();
        entries.sort_by_key(|(idx, _, _)| *idx);

        entries
            .into_iter()
            .filter_map(|(idx, modname, name)| Some((modname, name, self.inner.functions.get(idx)?)))
    }

    pub fn names(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.iter().map(|(modname, name, _)| (modname, name))
    }

    /// Pops the arguments of `modname/name` off `stack`, invokes it, and
    /// pushes its results.
    pub fn call(
        &self,
        modname: &str,
        name: &str,
        stack: &mut ValueStack,
        store: &mut Store,
        instance: &ModuleInstance,
    ) -> Result<Results, HostError> {
        let func = self
            .lookup(modname, name)
            .ok_or_else(|| HostError::NoSuchFunction {
                module: modname.to_string(),
                name: name.to_string(),
            })?;

        let args = stack.pop_args(func.typedef().input_arity())?;
        let results = func.invoke(&args, store, instance)?;
        for result in results.iter() {
            stack.push(*result);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod test {
    use sandcall_ir::ValType::*;

    use super::*;
    use crate::{memory::MemoryRegion, Status};

    fn add_imports() -> anyhow::Result<HostFuncs> {
        let mut imports = Imports::new();
        imports.link_hostfn("env", "add", Type::new([I32, I32], [I32]), |args, _, results| {
            results[0] = Value::I32(args.i32(0)?.wrapping_add(args.i32(1)?));
            Ok(())
        })?;
        imports.link_hostfn("env", "sub", Type::new([I32, I32], [I32]), |args, _, results| {
            results[0] = Value::I32(args.i32(0)?.wrapping_sub(args.i32(1)?));
            Ok(())
        })?;
        Ok(imports.build())
    }

    #[test]
    fn host_imports() -> anyhow::Result<()> {
        let funcs = add_imports()?;
        let mut store = Store::new();
        let instance = ModuleInstance::new().with_memory(store.insert(MemoryRegion::with_len(0)));

        let mut stack = ValueStack::new();
        stack.push(10i32);
        stack.push(3i32);
        funcs.call("env", "sub", &mut stack, &mut store, &instance)?;
        assert_eq!(stack.pop(), Some(Value::I32(7)));
        assert!(stack.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_imports() -> anyhow::Result<()> {
        let funcs = add_imports()?;
        let mut store = Store::new();
        let mut stack = ValueStack::new();

        let result = funcs.call("env", "mul", &mut stack, &mut store, &ModuleInstance::new());
        assert_eq!(Status::of(&result), Status::UnknownImport);
        assert!(funcs.lookup("math", "add").is_none());
        Ok(())
    }

    #[test]
    fn duplicate_links_fail() -> anyhow::Result<()> {
        let mut imports = Imports::new();
        imports.link_hostfn("env", "f", Type::new([], []), |_, _, _| Ok(()))?;
        assert!(imports
            .link_hostfn("env", "f", Type::new([I32], []), |_, _, _| Ok(()))
            .is_err());
        // same name under another module is fine
        imports.link_hostfn("other", "f", Type::new([], []), |_, _, _| Ok(()))?;
        assert_eq!(imports.build().len(), 2);
        Ok(())
    }

    #[test]
    fn iterates_in_link_order() -> anyhow::Result<()> {
        let funcs = add_imports()?;
        let names: Vec<_> = funcs.iter().map(|(m, n, _)| format!("{m}/{n}")).collect();
        assert_eq!(names, vec!["env/add", "env/sub"]);
        assert_eq!(
            funcs.names().collect::<Vec<_>>(),
            vec![("env", "add"), ("env", "sub")]
        );
        assert_eq!(
            funcs.typedef("env", "add"),
            Some(&Type::new([I32, I32], [I32]))
        );
        Ok(())
    }

    #[test]
    fn shared_across_threads() -> anyhow::Result<()> {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HostFuncs>();

        let funcs = add_imports()?;
        let handles: Vec<_> = (0..4i32)
            .map(|idx| {
                let funcs = funcs.clone();
                std::thread::spawn(move || -> Result<Value, HostError> {
                    let mut store = Store::new();
                    let instance =
                        ModuleInstance::new().with_memory(store.insert(MemoryRegion::with_len(16)));
                    let mut stack = ValueStack::new();
                    stack.push(idx);
                    stack.push(idx);
                    funcs.call("env", "add", &mut stack, &mut store, &instance)?;
                    Ok(stack.pop().unwrap_or(Value::I32(-1)))
                })
            })
            .collect();

        for (idx, handle) in handles.into_iter().enumerate() {
            let value = handle
                .join()
                .map_err(|_| anyhow::anyhow!("thread panicked"))??;
            assert_eq!(value, Value::I32(idx as i32 * 2));
        }
        Ok(())
    }
}
