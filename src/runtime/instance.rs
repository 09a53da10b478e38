use super::class::Class;
use super::clone;
use super::interner::{intern, Name};
use super::table::FxIndexMap;
use super::value::{Array, Dict, Property, Value};
use crate::error::{ClassyError, ClassyResult, StackFrame};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

struct ObjectData {
    class: Class,
    props: RefCell<FxIndexMap<Name, Property>>,
}

/// An instance. Its class is fixed at allocation.
#[derive(Clone)]
pub struct Object(Rc<ObjectData>);

#[derive(Clone)]
pub struct WeakObject(Weak<ObjectData>);

impl WeakObject {
    pub fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(Object)
    }

    pub fn ptr_eq(&self, other: &WeakObject) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl Object {
    pub(crate) fn new(class: &Class, init: &Value) -> ClassyResult<Object> {
        let obj = Object(Rc::new(ObjectData {
            class: class.clone(),
            props: RefCell::new(FxIndexMap::default()),
        }));
        class.init_object(&obj)?;
        if let Value::Dictionary(init) = init {
            clone::copy_initializer(init, &obj)?;
        }
        Ok(obj)
    }

    /// The class of this object (`class` is reserved)
    pub fn classs(&self) -> Class {
        self.0.class.clone()
    }

    pub fn class_name(&self) -> Option<Name> {
        self.0.class.class_name()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject(Rc::downgrade(&self.0))
    }

    // ======== RAW PROPERTIES ========

    /// Own property slot `name`
    pub fn property(&self, name: &str) -> Option<Property> {
        self.0.props.borrow().get(name).cloned()
    }

    pub fn has_own_property(&self, name: &str) -> bool {
        self.0.props.borrow().contains_key(name)
    }

    pub fn own_property_names(&self) -> Vec<Name> {
        self.0.props.borrow().keys().cloned().collect()
    }

    /// Install a slot, replacing whatever was there without running setters
    pub fn define(&self, name: &str, prop: Property) {
        self.0.props.borrow_mut().insert(intern(name), prop);
    }

    pub fn delete(&self, name: &str) -> Option<Property> {
        self.0.props.borrow_mut().shift_remove(name)
    }

    /// Read `name`: an own value, the result of its getter, or else the
    /// class method of that name. Missing names read `Undefined`.
    pub fn read(&self, name: &str) -> ClassyResult<Value> {
        match self.property(name) {
            Some(Property::Data(value)) => Ok(value),
            Some(Property::Accessor(accessor)) => match accessor.getter {
                Some(getter) => getter.call(&Value::Instance(self.clone()), &[]),
                None => Ok(Value::Undefined),
            },
            #[cfg(feature = "mixin")]
            Some(Property::Wrapped(layer)) => layer.read(self, name),
            None => Ok(self
                .0
                .class
                .method_table()
                .lookup(name)
                .map(Value::Function)
                .unwrap_or(Value::Undefined)),
        }
    }

    /// Write `name`. Accessors without a setter ignore the write.
    pub fn write(&self, name: &str, value: Value) -> ClassyResult<()> {
        match self.property(name) {
            Some(Property::Accessor(accessor)) => match accessor.setter {
                Some(setter) => setter
                    .call(&Value::Instance(self.clone()), &[value])
                    .map(|_| ()),
                None => Ok(()),
            },
            #[cfg(feature = "mixin")]
            Some(Property::Wrapped(layer)) => layer.write(self, name, value),
            _ => {
                self.define(name, Property::Data(value));
                Ok(())
            }
        }
    }

    /// Call method `name` with this object as receiver
    pub fn call(&self, name: &str, args: &[Value]) -> ClassyResult<Value> {
        let Value::Function(fun) = self.read(name)? else {
            return Err(ClassyError::attribute_error(format!(
                "{} has no method '{}'",
                self, name
            ))
            .with_help(format!("declare it with method(\"{}\", ...)", name)));
        };
        fun.call(&Value::Instance(self.clone()), args)
            .map_err(|mut err| {
                err.push_frame(StackFrame::new(name, self.class_name().as_deref()));
                err
            })
    }

    // ======== BULK FIELD ACCESS ========
    // Names that are not declared fields of the class are skipped.

    /// Every declared field and its current value
    pub fn get_all(&self) -> ClassyResult<Dict> {
        let result = Dict::new();
        for name in self.0.class.list_fields() {
            result.set(&name, self.read(&name)?);
        }
        Ok(result)
    }

    /// Value of declared field `name`, `Undefined` otherwise
    pub fn get_one(&self, name: &str) -> ClassyResult<Value> {
        if self.0.class.has_field(name) {
            self.read(name)
        } else {
            Ok(Value::Undefined)
        }
    }

    /// One value per name, `Undefined` for undeclared names
    pub fn get_many<I, K>(&self, names: I) -> ClassyResult<Vec<Value>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| self.get_one(name.as_ref()))
            .collect()
    }

    /// Values of the declared fields named by `template`: the keys of a
    /// record, or the fields of another instance's class
    pub fn get_by_template(&self, template: &Value) -> ClassyResult<Dict> {
        let result = Dict::new();
        for name in template_names(template) {
            if self.0.class.has_field(&name) {
                result.set(&name, self.read(&name)?);
            }
        }
        Ok(result)
    }

    /// Flat `name, value, ...` list of the declared fields among `names`
    pub fn get_pairs<I, K>(&self, names: I) -> ClassyResult<Vec<Value>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut result = Vec::new();
        for name in names {
            let name = name.as_ref();
            if self.0.class.has_field(name) {
                result.push(Value::from(name));
                result.push(self.read(name)?);
            }
        }
        Ok(result)
    }

    pub fn set_one(&self, name: &str, value: Value) -> ClassyResult<&Self> {
        if self.0.class.has_field(name) {
            self.write(name, value)?;
        }
        Ok(self)
    }

    /// Pair names with values by position; missing values are `Undefined`
    pub fn set_many<I, K>(&self, names: I, values: &[Value]) -> ClassyResult<&Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for (i, name) in names.into_iter().enumerate() {
            let value = values.get(i).cloned().unwrap_or(Value::Undefined);
            self.set_one(name.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Copy values from a record, or the declared fields of another instance
    pub fn set_from(&self, source: &Value) -> ClassyResult<&Self> {
        match source {
            Value::Dictionary(dict) => {
                for (name, value) in dict.entries() {
                    self.set_one(&name, value)?;
                }
            }
            Value::Instance(other) => {
                for name in other.classs().list_fields() {
                    if self.0.class.has_field(&name) {
                        self.write(&name, other.read(&name)?)?;
                    }
                }
            }
            _ => {}
        }
        Ok(self)
    }

    /// Set from a flat `name, value, ...` list. Non-string names are skipped.
    pub fn set_pairs(&self, pairs: &[Value]) -> ClassyResult<&Self> {
        for pair in pairs.chunks(2) {
            if let Some(name) = pair[0].as_str() {
                let value = pair.get(1).cloned().unwrap_or(Value::Undefined);
                self.set_one(name, value)?;
            }
        }
        Ok(self)
    }

    /// Polymorphic read:
    /// - `get([])`: every declared field, as a record
    /// - `get([name])`: one value
    /// - `get([list])`: a list of values
    /// - `get([record or instance])`: a record of the named declared fields
    /// - `get([n1, n2, ...])`: a flat name/value list
    pub fn get(&self, args: &[Value]) -> ClassyResult<Value> {
        match args {
            [] => Ok(Value::Dictionary(self.get_all()?)),
            [Value::String(name)] => self.get_one(name),
            [Value::Array(names)] => {
                let values = names
                    .to_vec()
                    .iter()
                    .map(|name| match name.as_str() {
                        Some(name) => self.get_one(name),
                        None => Ok(Value::Undefined),
                    })
                    .collect::<ClassyResult<Vec<_>>>()?;
                Ok(Value::Array(Array::from_vec(values)))
            }
            [template @ (Value::Dictionary(_) | Value::Instance(_))] => {
                Ok(Value::Dictionary(self.get_by_template(template)?))
            }
            [_] => Ok(Value::Null),
            names => {
                let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
                Ok(Value::Array(Array::from_vec(self.get_pairs(names)?)))
            }
        }
    }

    /// Polymorphic write, always returning the receiver:
    /// - `set([record or instance])`
    /// - `set([names, values])` with two lists
    /// - `set([n1, v1, n2, v2, ...])`
    pub fn set(&self, args: &[Value]) -> ClassyResult<&Self> {
        match args {
            [] => Ok(self),
            [source] => self.set_from(source),
            [Value::Array(names), Value::Array(values)] => {
                let names: Vec<Value> = names.to_vec();
                let values = values.to_vec();
                for (i, name) in names.iter().enumerate() {
                    if let Some(name) = name.as_str() {
                        let value = values.get(i).cloned().unwrap_or(Value::Undefined);
                        self.set_one(name, value)?;
                    }
                }
                Ok(self)
            }
            pairs => self.set_pairs(pairs),
        }
    }
}

fn template_names(template: &Value) -> Vec<Name> {
    match template {
        Value::Dictionary(dict) => dict.keys(),
        Value::Instance(obj) => obj.classs().list_fields(),
        _ => Vec::new(),
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance of {}", self.0.class)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self)
    }
}
