#![allow(dead_code)]

use classy_core::{Bindings, Call, ClassyResult, Function, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Shared string the bodies under test append markers to
#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<String>>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, marker: &str) {
        self.0.borrow_mut().push_str(marker);
    }

    /// Current contents, clearing the trace
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    /// A body that appends `marker` and returns `Undefined`
    pub fn marker(&self, marker: &'static str) -> Function {
        let trace = self.clone();
        Function::new(move |_| {
            trace.push(marker);
            Ok(Value::Undefined)
        })
    }

    /// A body that appends `before`, calls super, then appends `after`
    pub fn around_super(&self, before: &'static str, after: &'static str) -> Function {
        let trace = self.clone();
        Function::with_bindings(Bindings::SUPER, move |call| {
            trace.push(before);
            call.forward_super()?;
            trace.push(after);
            Ok(Value::Undefined)
        })
    }

    /// A wrapper that appends `before`, calls inner, then appends `after`
    pub fn around_inner(&self, before: &'static str, after: &'static str) -> Function {
        let trace = self.clone();
        Function::with_bindings(Bindings::INNER, move |call| {
            trace.push(before);
            let result = call.forward_inner()?;
            trace.push(after);
            Ok(result)
        })
    }
}

/// A body returning a fixed string
pub fn returns(text: &'static str) -> Function {
    Function::constant(Value::from(text))
}

/// Numeric argument `index`, 0 when absent
pub fn num_arg(call: &Call<'_>, index: usize) -> f64 {
    call.arg(index).as_number().unwrap_or(0.0)
}

/// Read field `name` of the receiver as a number
pub fn num_field(call: &Call<'_>, name: &str) -> ClassyResult<f64> {
    Ok(call.object()?.read(name)?.as_number().unwrap_or(0.0))
}

pub fn text(value: &Value) -> String {
    value.as_str().map(String::from).unwrap_or_default()
}

/// Root class with a `_trace` field and a `trace(msg)` method. With `msg` it
/// appends and returns the trace; without, it returns the trace and clears it.
pub fn traced_root(name: &str) -> classy_core::Class {
    let class = classy_core::new_class(None);
    class.name(name).field("_trace", "");
    class.method(
        "trace",
        Some(Function::new(|call| {
            let obj = call.object()?;
            match call.arg(0).as_str() {
                Some(msg) => {
                    let current = text(&obj.read("_trace")?);
                    obj.write("_trace", Value::from(format!("{}{}", current, msg)))?;
                    obj.read("_trace")
                }
                None => {
                    let current = obj.read("_trace")?;
                    obj.write("_trace", Value::from(""))?;
                    Ok(current)
                }
            }
        })),
    );
    class
}

/// Append `msg` to the receiver's trace
pub fn trace(call: &Call<'_>, msg: &str) -> ClassyResult<Value> {
    call.object()?.call("trace", &[Value::from(msg)])
}

/// Trace of `obj`, clearing it
pub fn trace_of(obj: &classy_core::Object) -> String {
    text(&obj.call("trace", &[]).unwrap())
}

/// Body appending `msg` to the receiver's trace
pub fn tracer(msg: &'static str) -> Function {
    Function::new(move |call| {
        trace(call, msg)?;
        Ok(Value::Undefined)
    })
}

/// Body tracing `before`, calling super, then tracing `after`
pub fn super_tracer(before: &'static str, after: &'static str) -> Function {
    Function::with_bindings(Bindings::SUPER, move |call| {
        trace(call, before)?;
        call.forward_super()?;
        trace(call, after)?;
        Ok(Value::Undefined)
    })
}

/// Wrapper tracing `before`, calling inner, then tracing `after`
pub fn inner_tracer(before: &'static str, after: &'static str) -> Function {
    Function::with_bindings(Bindings::INNER, move |call| {
        trace(call, before)?;
        let result = call.forward_inner()?;
        trace(call, after)?;
        Ok(result)
    })
}
