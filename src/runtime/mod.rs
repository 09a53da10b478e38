pub mod class;
pub mod clone;
pub mod dispatch;
#[cfg(feature = "mixin")]
pub mod field_wrap;
pub mod function;
pub mod instance;
pub mod interner;
pub mod metaclass;
#[cfg(feature = "mixin")]
pub mod mixin;
pub mod table;
pub mod value;
#[cfg(feature = "mixin")]
pub mod wrapper;

pub use class::{Class, WeakClass};
pub use clone::{clone_default, shared, CloneMap};
#[cfg(feature = "mixin")]
pub use field_wrap::{shadow_name, FieldLayer, Owner};
pub use function::{Bindings, Call, Function};
pub use instance::{Object, WeakObject};
pub use interner::{intern, Name};
pub use metaclass::{metaclass, Metaclass};
#[cfg(feature = "mixin")]
pub use mixin::Mixin;
pub use table::Table;
pub use value::{Accessor, Array, Dict, Property, Value};
