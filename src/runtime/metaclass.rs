// Classy Metaclass Module
// Shared root of every class's class-member chain

use super::function::Function;
use super::interner::Name;
use super::table::Table;
use super::value::{Property, Value};
use crate::DEFAULT_CONSTRUCTOR;

thread_local! {
    static ROOT: Table<Property> = new_root();
}

fn new_root() -> Table<Property> {
    let root = Table::root();
    // create(init): allocate, copy the literal initializer, run mixin constructors
    let create = Function::new(|call| {
        let class = call.class()?;
        let obj = class.alloc(&call.arg(0))?;
        #[cfg(feature = "mixin")]
        class.run_mixin_constructors(&obj)?;
        Ok(Value::Instance(obj))
    });
    root.insert(DEFAULT_CONSTRUCTOR, Property::from(create));
    root
}

pub(crate) fn root_table() -> Table<Property> {
    ROOT.with(|root| root.clone())
}

/// Handle on the shared metaclass
#[derive(Clone)]
pub struct Metaclass(Table<Property>);

/// The metaclass shared by every class of this thread
pub fn metaclass() -> Metaclass {
    Metaclass(root_table())
}

impl Metaclass {
    /// Add a class method available on every class; `None` removes it
    pub fn class_method(&self, name: &str, fun: Option<Function>) -> &Self {
        match fun {
            Some(fun) => {
                self.0.insert(name, Property::from(fun));
            }
            None => {
                self.0.remove(name);
            }
        }
        self
    }

    pub fn class_field(&self, name: &str, value: impl Into<Value>) -> &Self {
        self.0.insert(name, Property::Data(value.into()));
        self
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.0.has_own(name)
    }

    pub fn member_names(&self) -> Vec<Name> {
        self.0.own_names()
    }
}
