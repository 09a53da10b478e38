// Classy Function Module
// Callables and the Call context every body receives

use super::class::Class;
#[cfg(feature = "mixin")]
use super::dispatch::WrapperLayer;
use super::dispatch::{ConstructorDispatch, MethodDispatch};
#[cfg(feature = "mixin")]
use super::field_wrap::FieldAccess;
use super::instance::Object;
use super::interner::Name;
#[cfg(feature = "mixin")]
use super::mixin::Mixin;
use super::value::Value;
use crate::error::{ClassyError, ClassyResult};
#[cfg(feature = "mixin")]
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type NativeBody = dyn Fn(&Call<'_>) -> ClassyResult<Value>;

/// Which dispatch bindings a body uses. Undeclared bindings resolve to a
/// no-op that returns `Undefined`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bindings {
    pub super_call: bool,
    pub inner_call: bool,
}

impl Bindings {
    pub const NONE: Bindings = Bindings {
        super_call: false,
        inner_call: false,
    };
    pub const SUPER: Bindings = Bindings {
        super_call: true,
        inner_call: false,
    };
    pub const INNER: Bindings = Bindings {
        super_call: false,
        inner_call: true,
    };
    pub const BOTH: Bindings = Bindings {
        super_call: true,
        inner_call: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.super_call && !self.inner_call
    }
}

pub(crate) enum FunctionKind {
    Native {
        body: Box<NativeBody>,
        bindings: Bindings,
    },
    Method(MethodDispatch),
    Constructor(ConstructorDispatch),
    #[cfg(feature = "mixin")]
    Layer(WrapperLayer),
}

struct FunctionData {
    kind: FunctionKind,
    name: Option<Name>,
    /// Mixin that added this method to a class
    #[cfg(feature = "mixin")]
    owner: RefCell<Option<Mixin>>,
}

/// A callable with reference identity. Clones share identity.
#[derive(Clone)]
pub struct Function(Rc<FunctionData>);

impl Function {
    /// A body that uses neither super nor inner
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Call<'_>) -> ClassyResult<Value> + 'static,
    {
        Self::with_bindings(Bindings::NONE, body)
    }

    pub fn with_bindings<F>(bindings: Bindings, body: F) -> Self
    where
        F: Fn(&Call<'_>) -> ClassyResult<Value> + 'static,
    {
        Self::from_kind(
            FunctionKind::Native {
                body: Box::new(body),
                bindings,
            },
            None,
        )
    }

    /// A body that always returns `value`
    pub fn constant(value: Value) -> Self {
        Self::new(move |_| Ok(value.clone()))
    }

    pub(crate) fn from_kind(kind: FunctionKind, name: Option<Name>) -> Self {
        Self(Rc::new(FunctionData {
            kind,
            name,
            #[cfg(feature = "mixin")]
            owner: RefCell::new(None),
        }))
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn bindings(&self) -> Bindings {
        match &self.0.kind {
            FunctionKind::Native { bindings, .. } => *bindings,
            _ => Bindings::NONE,
        }
    }

    pub fn uses_super(&self) -> bool {
        self.bindings().super_call
    }

    pub fn uses_inner(&self) -> bool {
        self.bindings().inner_call
    }

    /// Call with `this` as receiver
    pub fn call(&self, this: &Value, args: &[Value]) -> ClassyResult<Value> {
        self.invoke(this, args, Frame::default())
    }

    pub(crate) fn invoke(&self, this: &Value, args: &[Value], frame: Frame) -> ClassyResult<Value> {
        match &self.0.kind {
            FunctionKind::Native { body, .. } => {
                let call = Call { this, args, frame };
                body(&call)
            }
            FunctionKind::Method(dispatch) => dispatch.invoke(this, args),
            FunctionKind::Constructor(dispatch) => dispatch.invoke(this, args),
            #[cfg(feature = "mixin")]
            FunctionKind::Layer(layer) => layer.invoke(this, args),
        }
    }

    #[cfg(feature = "mixin")]
    pub(crate) fn as_layer(&self) -> Option<&WrapperLayer> {
        match &self.0.kind {
            FunctionKind::Layer(layer) => Some(layer),
            _ => None,
        }
    }

    #[cfg(feature = "mixin")]
    pub(crate) fn owner(&self) -> Option<Mixin> {
        self.0.owner.borrow().clone()
    }

    #[cfg(feature = "mixin")]
    pub(crate) fn set_owner(&self, mixin: &Mixin) {
        *self.0.owner.borrow_mut() = Some(mixin.clone());
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.0.kind, self.name()) {
            (FunctionKind::Native { .. }, _) => write!(f, "<fn>"),
            #[cfg(feature = "mixin")]
            (FunctionKind::Layer(_), Some(name)) => write!(f, "<wrapper {}>", name),
            (_, Some(name)) => write!(f, "<fn {}>", name),
            (_, None) => write!(f, "<fn>"),
        }
    }
}

/// Bindings resolved for one activation
#[derive(Clone, Default)]
pub(crate) struct Frame {
    pub super_fn: Option<Function>,
    pub inner_fn: Option<Function>,
    #[cfg(feature = "mixin")]
    pub field: Option<FieldAccess>,
}

/// What a body sees of its activation
pub struct Call<'a> {
    this: &'a Value,
    args: &'a [Value],
    frame: Frame,
}

impl<'a> Call<'a> {
    pub fn this(&self) -> &Value {
        self.this
    }

    /// The receiver as an instance
    pub fn object(&self) -> ClassyResult<Object> {
        match self.this {
            Value::Instance(obj) => Ok(obj.clone()),
            other => Err(ClassyError::type_error(format!(
                "receiver is a {}, not an instance",
                other.type_name()
            ))),
        }
    }

    /// The receiver's class, or the receiver itself inside a class method
    pub fn class(&self) -> ClassyResult<Class> {
        match self.this {
            Value::Class(class) => Ok(class.clone()),
            Value::Instance(obj) => Ok(obj.classs()),
            other => Err(ClassyError::type_error(format!(
                "receiver is a {}, not a class or instance",
                other.type_name()
            ))),
        }
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Argument at `index`, `Undefined` when not passed
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Undefined)
    }

    pub fn has_super(&self) -> bool {
        self.frame.super_fn.is_some()
    }

    /// Call the same-named member one level up the class chain
    pub fn call_super(&self, args: &[Value]) -> ClassyResult<Value> {
        match &self.frame.super_fn {
            Some(super_fn) => super_fn.call(self.this, args),
            None => Ok(Value::Undefined),
        }
    }

    /// `call_super` with this activation's own arguments
    pub fn forward_super(&self) -> ClassyResult<Value> {
        self.call_super(self.args)
    }

    /// Call the method this wrapper is layered on
    pub fn call_inner(&self, args: &[Value]) -> ClassyResult<Value> {
        match &self.frame.inner_fn {
            Some(inner_fn) => inner_fn.call(self.this, args),
            None => Ok(Value::Undefined),
        }
    }

    pub fn forward_inner(&self) -> ClassyResult<Value> {
        self.call_inner(self.args)
    }

    /// Read the value shadowed by the running field wrapper
    #[cfg(feature = "mixin")]
    pub fn get_wrapped(&self) -> ClassyResult<Value> {
        match &self.frame.field {
            Some(access) => access.object.read(&access.shadow),
            None => Ok(Value::Undefined),
        }
    }

    /// Write the value shadowed by the running field wrapper
    #[cfg(feature = "mixin")]
    pub fn set_wrapped(&self, value: Value) -> ClassyResult<()> {
        match &self.frame.field {
            Some(access) => access.object.write(&access.shadow, value),
            None => Ok(()),
        }
    }
}
