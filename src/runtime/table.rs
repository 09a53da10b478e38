// Classy Table Module
// Name tables linked to the superclass table of the same kind

use super::interner::{intern, Name};
use indexmap::IndexMap;
use rustc_hash::FxHasher;
use std::cell::RefCell;
use std::hash::BuildHasherDefault;
use std::rc::Rc;

/// Insertion-ordered map keyed by interned names
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

struct TableNode<V> {
    entries: RefCell<FxIndexMap<Name, V>>,
    parent: Option<Table<V>>,
}

pub struct Table<V>(Rc<TableNode<V>>);

impl<V> Clone for Table<V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<V: Clone> Table<V> {
    /// A table with no parent
    pub fn root() -> Self {
        Self(Rc::new(TableNode {
            entries: RefCell::new(FxIndexMap::default()),
            parent: None,
        }))
    }

    /// A new empty table delegating to this one
    pub fn child(&self) -> Self {
        Self(Rc::new(TableNode {
            entries: RefCell::new(FxIndexMap::default()),
            parent: Some(self.clone()),
        }))
    }

    pub fn parent(&self) -> Option<&Table<V>> {
        self.0.parent.as_ref()
    }

    /// Find `name` here or in the nearest ancestor that defines it
    pub fn lookup(&self, name: &str) -> Option<V> {
        let mut table = Some(self);
        while let Some(t) = table {
            if let Some(value) = t.0.entries.borrow().get(name) {
                return Some(value.clone());
            }
            table = t.parent();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        let mut table = Some(self);
        while let Some(t) = table {
            if t.0.entries.borrow().contains_key(name) {
                return true;
            }
            table = t.parent();
        }
        false
    }

    pub fn get_own(&self, name: &str) -> Option<V> {
        self.0.entries.borrow().get(name).cloned()
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.0.entries.borrow().contains_key(name)
    }

    pub fn insert(&self, name: &str, value: V) -> Option<V> {
        self.0.entries.borrow_mut().insert(intern(name), value)
    }

    /// Remove an own entry, keeping the order of the others
    pub fn remove(&self, name: &str) -> Option<V> {
        self.0.entries.borrow_mut().shift_remove(name)
    }

    pub fn own_names(&self) -> Vec<Name> {
        self.0.entries.borrow().keys().cloned().collect()
    }

    pub fn own_entries(&self) -> Vec<(Name, V)> {
        self.0
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Names along the chain, most-derived first, without duplicates
    pub fn names(&self) -> Vec<Name> {
        let mut result: Vec<Name> = Vec::new();
        let mut table = Some(self);
        while let Some(t) = table {
            for name in t.0.entries.borrow().keys() {
                if !result.contains(name) {
                    result.push(name.clone());
                }
            }
            table = t.parent();
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.0.entries.borrow().is_empty()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
