use super::function::Function;
use super::instance::Object;
use super::interner::Name;
use super::value::{Array, Dict, Value};
use crate::error::ClassyResult;
use rustc_hash::FxHashMap;

/// Source composite address to its copy, for shared sub-objects and cycles
pub type CloneMap = FxHashMap<usize, Value>;

/// Copy `value` for a new instance.
///
/// Scalars, functions, classes, instances and composites marked immutable are
/// returned as is. Lists and records are copied recursively; a composite seen
/// twice under the same `map` yields the same copy.
pub fn clone_default(value: &Value, map: &mut CloneMap) -> Value {
    match value {
        Value::Array(arr) if !arr.is_immutable() => {
            if let Some(copy) = map.get(&arr.addr()) {
                return copy.clone();
            }
            let copy = Array::new();
            map.insert(arr.addr(), Value::Array(copy.clone()));
            for item in arr.to_vec() {
                copy.push(clone_default(&item, map));
            }
            Value::Array(copy)
        }
        Value::Dictionary(dict) if !dict.is_immutable() => {
            if let Some(copy) = map.get(&dict.addr()) {
                return copy.clone();
            }
            let copy = Dict::new();
            map.insert(dict.addr(), Value::Dictionary(copy.clone()));
            for (key, item) in dict.entries() {
                copy.set(&key, clone_default(&item, map));
            }
            Value::Dictionary(copy)
        }
        other => other.clone(),
    }
}

/// A default that every instance shares instead of copying
pub fn shared(value: Value) -> Value {
    Value::Function(Function::constant(value))
}

/// Write `entries` into `obj`. Function values are called with `obj` as
/// receiver and their result stored; anything else goes through
/// `clone_default`. With `one_map` every entry shares one clone map.
pub(crate) fn copy_fields(entries: &[(Name, Value)], obj: &Object, one_map: bool) -> ClassyResult<()> {
    let this = Value::Instance(obj.clone());
    let mut map = CloneMap::default();
    for (name, value) in entries {
        if !one_map {
            map.clear();
        }
        let value = match value {
            Value::Function(fun) => fun.call(&this, &[])?,
            other => clone_default(other, &mut map),
        };
        obj.write(name, value)?;
    }
    Ok(())
}

/// Field defaults: a fresh clone map per field
pub(crate) fn copy_defaults(entries: &[(Name, Value)], obj: &Object) -> ClassyResult<()> {
    copy_fields(entries, obj, false)
}

/// Literal initializer: one clone map for the whole record
pub(crate) fn copy_initializer(init: &Dict, obj: &Object) -> ClassyResult<()> {
    copy_fields(&init.entries(), obj, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: Vec<(&str, Value)>) -> Dict {
        entries.into_iter().collect()
    }

    #[test]
    fn test_scalars_are_returned_as_is() {
        let mut map = CloneMap::default();
        assert_eq!(clone_default(&Value::Number(3.0), &mut map), Value::Number(3.0));
        assert_eq!(clone_default(&Value::from("s"), &mut map), Value::from("s"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_composites_are_copied() {
        let inner = dict(vec![("p", Value::Number(1.0))]);
        let outer = Value::from(vec![Value::Dictionary(inner.clone())]);

        let mut map = CloneMap::default();
        let copy = clone_default(&outer, &mut map);

        let copy_arr = copy.as_array().cloned().unwrap();
        assert!(!copy_arr.ptr_eq(outer.as_array().unwrap()));
        let copy_inner = copy_arr.get(0).as_dict().cloned().unwrap();
        assert!(!copy_inner.ptr_eq(&inner));
        copy_inner.set("p", Value::Number(2.0));
        assert_eq!(inner.get("p"), Value::Number(1.0));
    }

    #[test]
    fn test_shared_subobjects_stay_shared() {
        let common = dict(vec![("r", Value::Number(0.0))]);
        let outer = dict(vec![
            ("a", Value::Dictionary(common.clone())),
            ("b", Value::Dictionary(common.clone())),
        ]);

        let mut map = CloneMap::default();
        let copy = clone_default(&Value::Dictionary(outer), &mut map);
        let copy = copy.as_dict().unwrap();
        assert_eq!(copy.get("a"), copy.get("b"));
        assert_ne!(copy.get("a"), Value::Dictionary(common));
    }

    #[test]
    fn test_cycles_resolve_to_the_copy() {
        let node = Dict::new();
        node.set("self", Value::Dictionary(node.clone()));

        let mut map = CloneMap::default();
        let copy = clone_default(&Value::Dictionary(node.clone()), &mut map);
        let copy_dict = copy.as_dict().unwrap();
        assert!(!copy_dict.ptr_eq(&node));
        assert_eq!(copy_dict.get("self"), copy);
    }

    #[test]
    fn test_immutable_is_not_copied() {
        let frozen = Array::from_vec(vec![Value::Number(1.0)]);
        frozen.mark_immutable();
        let mut map = CloneMap::default();
        let copy = clone_default(&Value::Array(frozen.clone()), &mut map);
        assert_eq!(copy, Value::Array(frozen));
    }

    #[test]
    fn test_shared_wraps_in_constant() {
        let color = dict(vec![("g", Value::Number(1.0))]);
        let default = shared(Value::Dictionary(color.clone()));
        let fun = default.as_function().unwrap();
        assert_eq!(
            fun.call(&Value::Undefined, &[]).unwrap(),
            Value::Dictionary(color)
        );
    }
}
