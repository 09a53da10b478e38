// Classy Dispatch Module
// Trampolines that resolve super and inner per activation, by slot name

use super::class::{Class, WeakClass};
#[cfg(feature = "mixin")]
use super::function::Bindings;
use super::function::{Frame, Function, FunctionKind};
use super::interner::{intern, Name};
use super::value::Value;
use crate::error::ClassyResult;

pub(crate) struct MethodDispatch {
    target: Function,
    slot: Name,
    superclass: Option<Class>,
}

impl MethodDispatch {
    fn resolve_super(&self) -> Option<Function> {
        self.superclass
            .as_ref()
            .and_then(|class| class.method_table().lookup(&self.slot))
    }

    pub(crate) fn invoke(&self, this: &Value, args: &[Value]) -> ClassyResult<Value> {
        log::trace!("dispatch method {}", self.slot);
        let frame = Frame {
            super_fn: self.resolve_super(),
            ..Frame::default()
        };
        self.target.invoke(this, args, frame)
    }
}

pub(crate) struct ConstructorDispatch {
    target: Function,
    slot: Name,
    class: WeakClass,
}

impl ConstructorDispatch {
    pub(crate) fn invoke(&self, this: &Value, args: &[Value]) -> ClassyResult<Value> {
        log::trace!("dispatch constructor {}", self.slot);
        let class = self.class.upgrade();
        let super_fn = if self.target.uses_super() {
            class
                .as_ref()
                .and_then(|c| c.superclass())
                .and_then(|sup| sup.constructor_table().lookup(&self.slot))
        } else {
            None
        };
        let frame = Frame {
            super_fn,
            ..Frame::default()
        };
        self.target.invoke(this, args, frame)?;

        #[cfg(feature = "mixin")]
        if let (Some(class), Value::Instance(obj)) = (&class, this) {
            class.run_mixin_constructors(obj)?;
        }

        Ok(this.clone())
    }
}

/// One layer of a method's wrapper stack
#[cfg(feature = "mixin")]
pub(crate) struct WrapperLayer {
    /// The wrapper as passed to `wrap`, used for identity on removal
    pub(crate) wrapper: Function,
    /// The slot occupant this layer shadows
    pub(crate) inner: Function,
    /// No method existed before this wrap; popping it empties the slot
    pub(crate) was_empty: bool,
    slot: Name,
    superclass: Option<Class>,
}

#[cfg(feature = "mixin")]
impl WrapperLayer {
    pub(crate) fn invoke(&self, this: &Value, args: &[Value]) -> ClassyResult<Value> {
        log::trace!("dispatch wrapper {}", self.slot);
        let super_fn = if self.wrapper.uses_super() {
            self.superclass
                .as_ref()
                .and_then(|class| class.method_table().lookup(&self.slot))
        } else {
            None
        };
        let frame = Frame {
            super_fn,
            inner_fn: Some(self.inner.clone()),
            ..Frame::default()
        };
        self.wrapper.invoke(this, args, frame)
    }
}

/// Make `fun` super-aware for method slot `slot`. Bodies that do not use
/// super are returned as is.
pub fn method_with_super(fun: Function, slot: &str, superclass: Option<&Class>) -> Function {
    if !fun.uses_super() {
        return fun;
    }
    let slot = intern(slot);
    Function::from_kind(
        FunctionKind::Method(MethodDispatch {
            target: fun,
            slot: slot.clone(),
            superclass: superclass.cloned(),
        }),
        Some(slot),
    )
}

/// Make `fun` an initializer for constructor slot `slot` of `class`.
///
/// The extended build always trampolines so that the class's mixin
/// constructors run after the body.
pub fn constructor_with_super(class: &Class, slot: &str, fun: Function) -> Function {
    #[cfg(not(feature = "mixin"))]
    if !fun.uses_super() {
        return fun;
    }
    let slot = intern(slot);
    Function::from_kind(
        FunctionKind::Constructor(ConstructorDispatch {
            target: fun,
            slot: slot.clone(),
            class: class.downgrade(),
        }),
        Some(slot),
    )
}

/// Layer `wrapper` over `inner` in method slot `slot`
#[cfg(feature = "mixin")]
pub fn wrapper_with_super_and_inner(
    wrapper: Function,
    slot: &str,
    superclass: Option<&Class>,
    inner: Function,
    was_empty: bool,
) -> Function {
    let slot = intern(slot);
    Function::from_kind(
        FunctionKind::Layer(WrapperLayer {
            wrapper,
            inner,
            was_empty,
            slot: slot.clone(),
            superclass: superclass.cloned(),
        }),
        Some(slot),
    )
}

/// Stand-in occupant for wrapping an empty slot: forwards to super
#[cfg(feature = "mixin")]
pub(crate) fn super_stand_in(slot: &str, superclass: Option<&Class>) -> Function {
    let forward = Function::with_bindings(Bindings::SUPER, |call| call.forward_super());
    method_with_super(forward, slot, superclass)
}
