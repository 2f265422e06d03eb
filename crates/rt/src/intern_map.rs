use std::{collections::HashMap, sync::Arc};

/// Interned `(module, name)` pair.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub(crate) struct ImportKey(pub(crate) usize, pub(crate) usize);

#[derive(Default, Debug, Clone)]
pub(crate) struct InternMap {
    strings: Vec<Arc<str>>,
    string_to_idx: HashMap<Arc<str>, usize>,
}

impl InternMap {
    pub(crate) fn get(&self, key: &str) -> Option<usize> {
        self.string_to_idx.get(key).copied()
    }

    pub(crate) fn idx(&self, key: usize) -> Option<&str> {
        self.strings.get(key).map(|xs| xs.as_ref())
    }

    pub(crate) fn insert(&mut self, string: &str) -> usize {
        if let Some(idx) = self.string_to_idx.get(string) {
            return *idx;
        }

        let string: Arc<str> = string.into();
        let idx = self.strings.len();
        self.strings.push(string.clone());
        self.string_to_idx.insert(string, idx);
        idx
    }

    /// Looks up an import key without interning; unknown names miss.
    pub(crate) fn key(&self, modname: &str, name: &str) -> Option<ImportKey> {
        Some(ImportKey(self.get(modname)?, self.get(name)?))
    }

    pub(crate) fn insert_key(&mut self, modname: &str, name: &str) -> ImportKey {
        ImportKey(self.insert(modname), self.insert(name))
    }

    pub(crate) fn resolve(&self, key: ImportKey) -> Option<(&str, &str)> {
        Some((self.idx(key.0)?, self.idx(key.1)?))
    }
}
