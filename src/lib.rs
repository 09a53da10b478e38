// Classy
// Single-inheritance classes with super chaining, cloned field defaults,
// active fields and, with the `mixin` feature, method wrappers, mixins and
// field wrapping

pub mod error;
pub mod json;
pub mod runtime;

pub use error::{ClassyError, ClassyResult, ErrorKind, StackFrame};
pub use runtime::*;

/// Name of the default constructor entry point
pub const DEFAULT_CONSTRUCTOR: &str = "create";

/// Prepended to a field name to form the slot a field wrap shadows
pub const SHADOW_PREFIX: char = '$';

/// A new class: a subclass of `superclass`, or a root class when `None`
pub fn new_class(superclass: Option<&Class>) -> Class {
    match superclass {
        Some(superclass) => superclass.subclass(),
        None => Class::new(None),
    }
}

/// True if `value` is an instance created by this object model
pub fn is_object(value: &Value) -> bool {
    value.is_object()
}
