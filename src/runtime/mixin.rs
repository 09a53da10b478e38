use super::class::Class;
use super::function::Function;
use super::instance::Object;
use super::interner::{intern, Name};
use super::table::Table;
use super::value::{Accessor, Value};
use crate::error::ClassyResult;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct MixinData {
    name: RefCell<Option<Name>>,
    constructor: RefCell<Option<Function>>,
    fields: Table<Value>,
    methods: Table<Function>,
    wrappers: Table<Function>,
    field_wrappers: Table<Accessor>,
}

/// A mixin. Identity is by reference: `unmix` and ownership tags compare
/// handles, not contents.
#[derive(Clone)]
pub struct Mixin(Rc<MixinData>);

impl Mixin {
    pub fn new() -> Self {
        Self(Rc::new(MixinData {
            name: RefCell::new(None),
            constructor: RefCell::new(None),
            fields: Table::root(),
            methods: Table::root(),
            wrappers: Table::root(),
            field_wrappers: Table::root(),
        }))
    }

    pub fn name(&self, name: &str) -> &Self {
        *self.0.name.borrow_mut() = Some(intern(name));
        self
    }

    pub fn mixin_name(&self) -> Option<Name> {
        self.0.name.borrow().clone()
    }

    /// Run on every new instance of a class using this mixin, after the
    /// instance's own constructor
    pub fn constructor(&self, fun: Function) -> &Self {
        *self.0.constructor.borrow_mut() = Some(fun);
        self
    }

    /// Field copied into new instances, with the same default semantics as
    /// class fields
    pub fn field(&self, name: &str, value: impl Into<Value>) -> &Self {
        self.0.fields.insert(name, value.into());
        self
    }

    pub fn fields<I, K, V>(&self, list: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in list {
            self.field(name.as_ref(), value);
        }
        self
    }

    /// Method added to classes that do not define `name` themselves
    pub fn method(&self, name: &str, fun: Function) -> &Self {
        self.0.methods.insert(name, fun);
        self
    }

    pub fn methods<I, K>(&self, list: I) -> &Self
    where
        I: IntoIterator<Item = (K, Function)>,
        K: AsRef<str>,
    {
        for (name, fun) in list {
            self.method(name.as_ref(), fun);
        }
        self
    }

    /// Wrapper layered on method `name` of classes using this mixin
    pub fn wrapper(&self, name: &str, fun: Function) -> &Self {
        self.0.wrappers.insert(name, fun);
        self
    }

    pub fn wrappers<I, K>(&self, list: I) -> &Self
    where
        I: IntoIterator<Item = (K, Function)>,
        K: AsRef<str>,
    {
        for (name, fun) in list {
            self.wrapper(name.as_ref(), fun);
        }
        self
    }

    /// Field wrap applied to every new instance of classes using this mixin
    pub fn field_wrapper(&self, name: &str, getter: Option<Function>, setter: Option<Function>) -> &Self {
        if getter.is_some() || setter.is_some() {
            self.0
                .field_wrappers
                .insert(name, Accessor::new(getter, setter));
        }
        self
    }

    pub fn get_constructor(&self) -> Option<Function> {
        self.0.constructor.borrow().clone()
    }

    pub(crate) fn field_entries(&self) -> Vec<(Name, Value)> {
        self.0.fields.own_entries()
    }

    pub(crate) fn method_entries(&self) -> Vec<(Name, Function)> {
        self.0.methods.own_entries()
    }

    pub(crate) fn wrapper_entries(&self) -> Vec<(Name, Function)> {
        self.0.wrappers.own_entries()
    }

    pub(crate) fn field_wrapper_entries(&self) -> Vec<(Name, Accessor)> {
        self.0.field_wrappers.own_entries()
    }

    pub fn ptr_eq(&self, other: &Mixin) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Mixin {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Mixin {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Display for Mixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mixin_name() {
            Some(name) => write!(f, "mixin {}", name),
            None => write!(f, "mixin "),
        }
    }
}

impl fmt::Debug for Mixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self)
    }
}

impl Class {
    /// Apply `mixin`: add its methods that the class does not define itself
    /// and layer its wrappers. Its fields, field wraps and constructor apply
    /// to instances created from now on.
    pub fn mixin(&self, mixin: &Mixin) -> &Self {
        log::debug!("applying {} to {}", mixin, self);
        self.data().mixins.borrow_mut().push(mixin.clone());

        for (name, fun) in mixin.method_entries() {
            if self.get_own_method(&name).is_some() {
                continue;
            }
            self.method(&name, Some(fun.clone()));
            // a body stored unmodified is recognized by identity; a trampoline gets tagged
            if let Some(stored) = self.get_own_method(&name) {
                if !stored.ptr_eq(&fun) {
                    stored.set_owner(mixin);
                }
            }
        }

        for (name, wrapper) in mixin.wrapper_entries() {
            self.wrap(&name, wrapper);
        }
        self
    }

    /// Undo `mixin`: remove its wrappers and the methods it added. Fields
    /// already wrapped on existing instances stay wrapped.
    pub fn unmix(&self, mixin: &Mixin) -> &Self {
        let position = self
            .data()
            .mixins
            .borrow()
            .iter()
            .position(|m| m.ptr_eq(mixin));
        let Some(position) = position else {
            return self;
        };
        log::debug!("removing {} from {}", mixin, self);
        self.data().mixins.borrow_mut().remove(position);

        for (name, wrapper) in mixin.wrapper_entries() {
            self.unwrap(&name, Some(&wrapper));
        }

        for (name, fun) in mixin.method_entries() {
            let Some(stored) = self.get_own_method(&name) else {
                continue;
            };
            let added = stored.ptr_eq(&fun) || stored.owner().is_some_and(|owner| owner.ptr_eq(mixin));
            if added {
                self.method_table().remove(&name);
            }
        }
        self
    }

    pub fn has_mixin(&self, mixin: &Mixin) -> bool {
        self.data().mixins.borrow().iter().any(|m| m.ptr_eq(mixin))
    }

    /// Applied mixins, in application order
    pub fn mixins(&self) -> Vec<Mixin> {
        self.data().mixins.borrow().clone()
    }

    /// Run the constructor of every applied mixin on `obj`
    pub(crate) fn run_mixin_constructors(&self, obj: &Object) -> ClassyResult<()> {
        let this = Value::Instance(obj.clone());
        for mixin in self.mixins() {
            if let Some(constructor) = mixin.get_constructor() {
                constructor.call(&this, &[])?;
            }
        }
        Ok(())
    }
}
