// Classy Class Module
// Class objects, their delegating tables and the declaration operations

use super::clone;
use super::dispatch::{constructor_with_super, method_with_super};
use super::function::Function;
use super::instance::Object;
use super::interner::{intern, Name};
use super::metaclass;
#[cfg(feature = "mixin")]
use super::mixin::Mixin;
use super::table::Table;
use super::value::{Accessor, Property, Value};
use crate::error::{ClassyError, ClassyResult, StackFrame};
use crate::DEFAULT_CONSTRUCTOR;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub(crate) struct ClassData {
    name: RefCell<Option<Name>>,
    superclass: Option<Class>,
    /// Class methods, class fields and constructor entry points
    statics: Table<Property>,
    constructors: Table<Function>,
    methods: Table<Function>,
    fields: Table<Value>,
    active_fields: Table<Accessor>,
    #[cfg(feature = "mixin")]
    pub(crate) mixins: RefCell<Vec<Mixin>>,
    #[cfg(feature = "mixin")]
    pub(crate) wrapped_fields: Table<Accessor>,
}

#[derive(Clone)]
pub struct Class(Rc<ClassData>);

#[derive(Clone)]
pub struct WeakClass(Weak<ClassData>);

impl WeakClass {
    pub fn upgrade(&self) -> Option<Class> {
        self.0.upgrade().map(Class)
    }
}

impl Class {
    /// A new class. Without a superclass the class is a root class whose
    /// class members delegate to the shared metaclass.
    pub fn new(superclass: Option<&Class>) -> Class {
        let data = match superclass {
            None => ClassData {
                name: RefCell::new(None),
                superclass: None,
                statics: metaclass::root_table().child(),
                constructors: Table::root(),
                methods: Table::root(),
                fields: Table::root(),
                active_fields: Table::root(),
                #[cfg(feature = "mixin")]
                mixins: RefCell::new(Vec::new()),
                #[cfg(feature = "mixin")]
                wrapped_fields: Table::root(),
            },
            Some(sup) => ClassData {
                name: RefCell::new(None),
                superclass: Some(sup.clone()),
                statics: sup.0.statics.child(),
                constructors: sup.0.constructors.child(),
                methods: sup.0.methods.child(),
                fields: sup.0.fields.child(),
                active_fields: sup.0.active_fields.child(),
                #[cfg(feature = "mixin")]
                mixins: RefCell::new(Vec::new()),
                #[cfg(feature = "mixin")]
                wrapped_fields: Table::root(),
            },
        };
        Class(Rc::new(data))
    }

    pub fn subclass(&self) -> Class {
        log::debug!("subclassing {}", self);
        Class::new(Some(self))
    }

    pub fn superclass(&self) -> Option<Class> {
        self.0.superclass.clone()
    }

    pub fn name(&self, name: &str) -> &Self {
        *self.0.name.borrow_mut() = Some(intern(name));
        self
    }

    pub fn class_name(&self) -> Option<Name> {
        self.0.name.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Class) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakClass {
        WeakClass(Rc::downgrade(&self.0))
    }

    /// True if `other` is this class or one of its ancestors
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut class = Some(self.clone());
        while let Some(c) = class {
            if c.ptr_eq(other) {
                return true;
            }
            class = c.superclass();
        }
        false
    }

    pub(crate) fn method_table(&self) -> &Table<Function> {
        &self.0.methods
    }

    pub(crate) fn constructor_table(&self) -> &Table<Function> {
        &self.0.constructors
    }

    #[cfg(feature = "mixin")]
    pub(crate) fn data(&self) -> &ClassData {
        &self.0
    }

    // ======== OBJECT CREATION ========

    /// Allocate an instance, seed it from the field defaults of the whole
    /// chain, then apply `init` when it is a record
    pub fn alloc(&self, init: &Value) -> ClassyResult<Object> {
        Object::new(self, init)
    }

    /// Copy defaults into `obj`, from the root class down to this one
    pub(crate) fn init_object(&self, obj: &Object) -> ClassyResult<()> {
        if let Some(sup) = &self.0.superclass {
            sup.init_object(obj)?;
        }

        clone::copy_defaults(&self.0.fields.own_entries(), obj)?;
        for (name, accessor) in self.0.active_fields.own_entries() {
            obj.define(&name, Property::Accessor(accessor));
        }

        #[cfg(feature = "mixin")]
        self.init_wrapped_fields(obj)?;

        Ok(())
    }

    /// Call constructor entry point `name`
    pub fn construct(&self, name: &str, args: &[Value]) -> ClassyResult<Object> {
        match self.call_class_method(name, args)? {
            Value::Instance(obj) => Ok(obj),
            other => Err(ClassyError::type_error(format!(
                "constructor '{}' of {} returned {}, not an instance",
                name,
                self,
                other.type_name()
            ))),
        }
    }

    /// Call the default constructor. Without a declared `create`, the first
    /// argument is used as a literal initializer.
    pub fn create(&self, args: &[Value]) -> ClassyResult<Object> {
        self.construct(DEFAULT_CONSTRUCTOR, args)
    }

    // ======== FIELDS ========

    /// Declare a field and its default. Callable defaults are evaluated per
    /// instance; composite defaults are deep-copied per instance.
    pub fn field(&self, name: &str, value: impl Into<Value>) -> &Self {
        self.0.fields.insert(name, value.into());
        self
    }

    /// Declare several fields; accessor entries become active fields
    pub fn fields<I, K, P>(&self, list: I) -> &Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<Property>,
    {
        for (name, prop) in list {
            match prop.into() {
                Property::Data(value) => {
                    self.field(name.as_ref(), value);
                }
                Property::Accessor(accessor) => {
                    self.active_field(name.as_ref(), accessor.getter, accessor.setter);
                }
                #[cfg(feature = "mixin")]
                Property::Wrapped(_) => {}
            }
        }
        self
    }

    /// Declare a computed field. Writing a getter-only field is a silent no-op.
    pub fn active_field(
        &self,
        name: &str,
        getter: Option<Function>,
        setter: Option<Function>,
    ) -> &Self {
        self.0
            .active_fields
            .insert(name, Accessor::new(getter, setter));
        self
    }

    pub fn has_own_field(&self, name: &str) -> bool {
        self.0.fields.has_own(name) || self.0.active_fields.has_own(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.0.fields.contains(name) || self.0.active_fields.contains(name)
    }

    pub fn list_own_fields(&self) -> Vec<Name> {
        let mut result = self.0.fields.own_names();
        for name in self.0.active_fields.own_names() {
            if !result.contains(&name) {
                result.push(name);
            }
        }
        result
    }

    /// Field names of this class and its ancestors, most-derived first
    pub fn list_fields(&self) -> Vec<Name> {
        let mut result: Vec<Name> = Vec::new();
        let mut class = Some(self.clone());
        while let Some(c) = class {
            for name in c.list_own_fields() {
                if !result.contains(&name) {
                    result.push(name);
                }
            }
            class = c.superclass();
        }
        result
    }

    // ======== CONSTRUCTORS ========

    /// Declare constructor `name` (`create` when omitted). The class gains a
    /// class-level entry point of the same name that allocates an instance
    /// and runs the constructor on it.
    pub fn constructor(&self, name: Option<&str>, fun: Function) -> &Self {
        let name = name.unwrap_or(DEFAULT_CONSTRUCTOR);
        let init = constructor_with_super(self, name, fun);
        self.0.constructors.insert(name, init.clone());

        let entry = Function::new(move |call| {
            let class = call.class()?;
            let obj = class.alloc(&Value::Undefined)?;
            let this = Value::Instance(obj);
            init.call(&this, call.args())?;
            Ok(this)
        });
        self.0.statics.insert(name, Property::from(entry));
        self
    }

    pub fn constructors<I, K>(&self, list: I) -> &Self
    where
        I: IntoIterator<Item = (K, Function)>,
        K: AsRef<str>,
    {
        for (name, fun) in list {
            self.constructor(Some(name.as_ref()), fun);
        }
        self
    }

    pub fn has_own_constructor(&self, name: &str) -> bool {
        name == DEFAULT_CONSTRUCTOR || self.0.constructors.has_own(name)
    }

    pub fn has_constructor(&self, name: &str) -> bool {
        name == DEFAULT_CONSTRUCTOR || self.0.constructors.contains(name)
    }

    pub fn get_own_constructor(&self, name: Option<&str>) -> Option<Function> {
        self.0
            .constructors
            .get_own(name.unwrap_or(DEFAULT_CONSTRUCTOR))
    }

    pub fn get_constructor(&self, name: Option<&str>) -> Option<Function> {
        self.0
            .constructors
            .lookup(name.unwrap_or(DEFAULT_CONSTRUCTOR))
    }

    pub fn list_own_constructors(&self) -> Vec<Name> {
        let mut result = vec![intern(DEFAULT_CONSTRUCTOR)];
        for name in self.0.constructors.own_names() {
            if &*name != DEFAULT_CONSTRUCTOR {
                result.push(name);
            }
        }
        result
    }

    pub fn list_constructors(&self) -> Vec<Name> {
        let mut result = vec![intern(DEFAULT_CONSTRUCTOR)];
        for name in self.0.constructors.names() {
            if !result.contains(&name) {
                result.push(name);
            }
        }
        result
    }

    // ======== METHODS ========

    /// Define or redefine method `name`; `None` removes it.
    ///
    /// Removing a method discards its wrappers. Redefining a wrapped method
    /// keeps the wrappers, layered over the new body in their original order.
    pub fn method(&self, name: &str, fun: Option<Function>) -> &Self {
        let Some(fun) = fun else {
            log::debug!("removing method {} from {}", name, self);
            self.0.methods.remove(name);
            return self;
        };

        #[cfg(feature = "mixin")]
        let wrappers = self.unwrap_wrappers(name, None);

        let fun = method_with_super(fun, name, self.0.superclass.as_ref());
        self.0.methods.insert(name, fun);

        #[cfg(feature = "mixin")]
        self.rewrap(name, &wrappers);

        self
    }

    pub fn methods<I, K>(&self, list: I) -> &Self
    where
        I: IntoIterator<Item = (K, Function)>,
        K: AsRef<str>,
    {
        for (name, fun) in list {
            self.method(name.as_ref(), Some(fun));
        }
        self
    }

    pub fn has_own_method(&self, name: &str) -> bool {
        self.0.methods.has_own(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.0.methods.contains(name)
    }

    pub fn get_own_method(&self, name: &str) -> Option<Function> {
        self.0.methods.get_own(name)
    }

    pub fn get_method(&self, name: &str) -> Option<Function> {
        self.0.methods.lookup(name)
    }

    pub fn list_own_methods(&self) -> Vec<Name> {
        self.0.methods.own_names()
    }

    pub fn list_methods(&self) -> Vec<Name> {
        self.0.methods.names()
    }

    // ======== CLASS FIELDS and CLASS METHODS ========

    /// Attach a method to the class itself; `None` removes it
    pub fn class_method(&self, name: &str, fun: Option<Function>) -> &Self {
        match fun {
            Some(fun) => {
                self.0.statics.insert(name, Property::from(fun));
            }
            None => {
                self.0.statics.remove(name);
            }
        }
        self
    }

    pub fn class_methods<I, K>(&self, list: I) -> &Self
    where
        I: IntoIterator<Item = (K, Function)>,
        K: AsRef<str>,
    {
        for (name, fun) in list {
            self.class_method(name.as_ref(), Some(fun));
        }
        self
    }

    pub fn class_field(&self, name: &str, value: impl Into<Value>) -> &Self {
        self.0.statics.insert(name, Property::Data(value.into()));
        self
    }

    /// Declare several class fields; accessor entries become computed class
    /// fields evaluated with the class as receiver
    pub fn class_fields<I, K, P>(&self, list: I) -> &Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<Property>,
    {
        for (name, prop) in list {
            match prop.into() {
                Property::Data(value) => {
                    self.class_field(name.as_ref(), value);
                }
                Property::Accessor(accessor) => {
                    self.0
                        .statics
                        .insert(name.as_ref(), Property::Accessor(accessor));
                }
                #[cfg(feature = "mixin")]
                Property::Wrapped(_) => {}
            }
        }
        self
    }

    /// True if the class or an ancestor (or the shared metaclass) has a class
    /// member `name`
    pub fn has_class_member(&self, name: &str) -> bool {
        self.0.statics.contains(name)
    }

    /// Read class member `name`, running its getter if it is computed
    pub fn class_value(&self, name: &str) -> ClassyResult<Value> {
        match self.0.statics.lookup(name) {
            Some(Property::Data(value)) => Ok(value),
            Some(Property::Accessor(Accessor {
                getter: Some(getter),
                ..
            })) => getter.call(&Value::Class(self.clone()), &[]),
            _ => Ok(Value::Undefined),
        }
    }

    /// Write class member `name`. Inherited computed members run their
    /// setter; plain values are stored on this class.
    pub fn set_class_value(&self, name: &str, value: Value) -> ClassyResult<()> {
        match self.0.statics.lookup(name) {
            Some(Property::Accessor(accessor)) => match accessor.setter {
                Some(setter) => setter.call(&Value::Class(self.clone()), &[value]).map(|_| ()),
                None => Ok(()),
            },
            _ => {
                self.0.statics.insert(name, Property::Data(value));
                Ok(())
            }
        }
    }

    /// Call class method (or constructor entry point) `name` with the class
    /// as receiver
    pub fn call_class_method(&self, name: &str, args: &[Value]) -> ClassyResult<Value> {
        let member = self.class_value(name)?;
        let Value::Function(fun) = member else {
            return Err(ClassyError::attribute_error(format!(
                "{} has no class method '{}'",
                self, name
            )));
        };
        fun.call(&Value::Class(self.clone()), args).map_err(|mut err| {
            err.push_frame(StackFrame::new(name, self.class_name().as_deref()));
            err
        })
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class_name() {
            Some(name) => write!(f, "class {}", name),
            None => write!(f, "class "),
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self)
    }
}
