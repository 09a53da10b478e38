use super::class::Class;
#[cfg(feature = "mixin")]
use super::field_wrap::FieldLayer;
use super::function::Function;
use super::instance::Object;
use super::interner::{intern, Name};
use super::table::FxIndexMap;
use rustc_hash::FxHashSet;
use serde::ser::{self, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum Value {
    /// Reading a missing field or a getter-less accessor
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    Array(Array),
    Dictionary(Dict),
    Function(Function),
    Class(Class),
    Instance(Object),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "Undefined",
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Dictionary(_) => "Dict",
            Value::Function(_) => "Function",
            Value::Class(_) => "Class",
            Value::Instance(_) => "Instance",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for instances produced by this object model
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Instance(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match self {
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Instance(obj) => Some(obj),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Dictionary(a), Value::Dictionary(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Class(a), Value::Class(b)) => a.ptr_eq(b),
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display(self, f, &mut FxHashSet::default())
    }
}

/// `path` holds the composites being printed; meeting one again prints a
/// placeholder instead of looping
fn display(value: &Value, f: &mut fmt::Formatter<'_>, path: &mut FxHashSet<usize>) -> fmt::Result {
    match value {
        Value::Undefined => write!(f, "undefined"),
        Value::Null => write!(f, "null"),
        Value::Boolean(b) => write!(f, "{}", b),
        Value::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                write!(f, "{}", *n as i64)
            } else {
                write!(f, "{}", n)
            }
        }
        Value::String(s) => write!(f, "{}", s),
        Value::Array(arr) => {
            if !path.insert(arr.addr()) {
                return write!(f, "[...]");
            }
            write!(f, "[")?;
            for (i, item) in arr.to_vec().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                display(item, f, path)?;
            }
            path.remove(&arr.addr());
            write!(f, "]")
        }
        Value::Dictionary(dict) => {
            if !path.insert(dict.addr()) {
                return write!(f, "{{...}}");
            }
            write!(f, "{{")?;
            for (i, (key, item)) in dict.entries().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "\"{}\": ", key)?;
                display(item, f, path)?;
            }
            path.remove(&dict.addr());
            write!(f, "}}")
        }
        Value::Function(func) => write!(f, "{:?}", func),
        Value::Class(class) => write!(f, "{}", class),
        Value::Instance(obj) => write!(f, "{}", obj),
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            _ => write!(f, "{}", self),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let path = RefCell::new(FxHashSet::default());
        Walk { value: self, path: &path }.serialize(serializer)
    }
}

/// A value being serialized, with the composites above it
struct Walk<'a> {
    value: &'a Value,
    path: &'a RefCell<FxHashSet<usize>>,
}

impl Walk<'_> {
    fn enter<E: ser::Error>(&self, addr: usize) -> Result<(), E> {
        if self.path.borrow_mut().insert(addr) {
            Ok(())
        } else {
            Err(E::custom("cyclic value cannot be serialized"))
        }
    }

    fn child<'b>(&'b self, value: &'b Value) -> Walk<'b> {
        Walk { value, path: self.path }
    }
}

impl Serialize for Walk<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                self.enter::<S::Error>(arr.addr())?;
                let items = arr.to_vec();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(&self.child(item))?;
                }
                self.path.borrow_mut().remove(&arr.addr());
                seq.end()
            }
            Value::Dictionary(dict) => {
                self.enter::<S::Error>(dict.addr())?;
                let entries = dict.entries();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in &entries {
                    map.serialize_entry(&**key, &self.child(value))?;
                }
                self.path.borrow_mut().remove(&dict.addr());
                map.end()
            }
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::from_vec(items))
    }
}

impl From<Array> for Value {
    fn from(arr: Array) -> Self {
        Value::Array(arr)
    }
}

impl From<Dict> for Value {
    fn from(dict: Dict) -> Self {
        Value::Dictionary(dict)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl From<Class> for Value {
    fn from(class: Class) -> Self {
        Value::Class(class)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Instance(obj)
    }
}

struct ArrayData {
    items: RefCell<Vec<Value>>,
    immutable: Cell<bool>,
}

/// Shared, mutable list. Cloning the handle shares the list.
#[derive(Clone)]
pub struct Array(Rc<ArrayData>);

impl Array {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(ArrayData {
            items: RefCell::new(items),
            immutable: Cell::new(false),
        }))
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.borrow().is_empty()
    }

    /// Element at `index`, `Undefined` when out of range
    pub fn get(&self, index: usize) -> Value {
        self.0
            .items
            .borrow()
            .get(index)
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    /// Store at `index`, padding with `Undefined` when writing past the end
    pub fn set(&self, index: usize, value: Value) {
        let mut items = self.0.items.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value;
    }

    pub fn push(&self, value: Value) {
        self.0.items.borrow_mut().push(value);
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    /// Immutable lists are shared, never copied, when used as field defaults
    pub fn mark_immutable(&self) -> &Self {
        self.0.immutable.set(true);
        self
    }

    pub fn is_immutable(&self) -> bool {
        self.0.immutable.get()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

struct DictData {
    entries: RefCell<FxIndexMap<Name, Value>>,
    immutable: Cell<bool>,
}

/// Shared, mutable record with insertion-ordered keys
#[derive(Clone)]
pub struct Dict(Rc<DictData>);

impl Dict {
    pub fn new() -> Self {
        Self(Rc::new(DictData {
            entries: RefCell::new(FxIndexMap::default()),
            immutable: Cell::new(false),
        }))
    }

    /// Value for `key`, `Undefined` when absent
    pub fn get(&self, key: &str) -> Value {
        self.0
            .entries
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    pub fn set(&self, key: &str, value: Value) {
        self.0.entries.borrow_mut().insert(intern(key), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.entries.borrow().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.entries.borrow_mut().shift_remove(key)
    }

    pub fn keys(&self) -> Vec<Name> {
        self.0.entries.borrow().keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(Name, Value)> {
        self.0
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.entries.borrow().is_empty()
    }

    /// Immutable records are shared, never copied, when used as field defaults
    pub fn mark_immutable(&self) -> &Self {
        self.0.immutable.set(true);
        self
    }

    pub fn is_immutable(&self) -> bool {
        self.0.immutable.get()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AsRef<str>> FromIterator<(K, Value)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let dict = Dict::new();
        for (key, value) in iter {
            dict.set(key.as_ref(), value);
        }
        dict
    }
}

/// A getter/setter pair. A missing getter reads `Undefined`; a missing setter
/// ignores writes.
#[derive(Clone, Default)]
pub struct Accessor {
    pub getter: Option<Function>,
    pub setter: Option<Function>,
}

impl Accessor {
    pub fn new(getter: Option<Function>, setter: Option<Function>) -> Self {
        Self { getter, setter }
    }

    pub fn getter(getter: Function) -> Self {
        Self::new(Some(getter), None)
    }

    pub fn setter(setter: Function) -> Self {
        Self::new(None, Some(setter))
    }
}

/// An own property slot of an object, a class or a declaration table
#[derive(Clone)]
pub enum Property {
    Data(Value),
    Accessor(Accessor),
    #[cfg(feature = "mixin")]
    Wrapped(FieldLayer),
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Property::Data(value)
    }
}

impl From<Accessor> for Property {
    fn from(accessor: Accessor) -> Self {
        Property::Accessor(accessor)
    }
}

impl From<Function> for Property {
    fn from(func: Function) -> Self {
        Property::Data(Value::Function(func))
    }
}

impl From<i32> for Property {
    fn from(n: i32) -> Self {
        Property::Data(n.into())
    }
}

impl From<f64> for Property {
    fn from(n: f64) -> Self {
        Property::Data(n.into())
    }
}

impl From<&str> for Property {
    fn from(s: &str) -> Self {
        Property::Data(s.into())
    }
}

impl From<bool> for Property {
    fn from(b: bool) -> Self {
        Property::Data(b.into())
    }
}
