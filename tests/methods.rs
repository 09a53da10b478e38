mod common;

use classy_core::{new_class, Bindings, Call, Class, ClassyResult, ErrorKind, Function, Value};

/// Body returning `(<super>) <label>`
fn with_super(label: &'static str) -> Function {
    Function::with_bindings(Bindings::SUPER, move |call| {
        let inner = common::text(&call.forward_super()?);
        Ok(Value::from(format!("({}) {}", inner, label)))
    })
}

/// Body returning `(<this.method()>) <label>`
fn with_self_call(method: &'static str, label: &'static str) -> Function {
    Function::new(move |call| {
        let inner = common::text(&call.object()?.call(method, &[])?);
        Ok(Value::from(format!("({}) {}", inner, label)))
    })
}

struct Abc {
    a: Class,
    b: Class,
    c: Class,
}

fn abc() -> Abc {
    let a = new_class(None);
    a.method("m", Some(common::returns("m in A")));
    let b = a.subclass();
    let c = b.subclass();
    c.method("m", Some(with_super("m in C")));
    Abc { a, b, c }
}

fn call(class: &Class, method: &str) -> String {
    let obj = class.create(&[]).unwrap();
    common::text(&obj.call(method, &[]).unwrap())
}

#[test]
fn test_local_and_inherited_methods() {
    common::init();
    let t = abc();
    assert_eq!(call(&t.a, "m"), "m in A");
    assert_eq!(call(&t.b, "m"), "m in A");
    assert_eq!(call(&t.c, "m"), "(m in A) m in C");

    assert!(t.a.has_own_method("m"));
    assert!(!t.b.has_own_method("m"));
    assert!(t.b.has_method("m"));
}

#[test]
fn test_super_chain() {
    let t = abc();
    t.b.method("m", Some(with_super("m in B")));
    assert_eq!(call(&t.b, "m"), "(m in A) m in B");
    assert_eq!(call(&t.c, "m"), "((m in A) m in B) m in C");
}

#[test]
fn test_super_chain_through_self_calls() {
    let t = abc();
    t.b.method("m", Some(with_super("m in B")));
    t.a.method("m2", Some(common::returns("m2 in A")));
    t.b.method("m2", Some(with_self_call("m", "m2 in B")));
    t.c.method("m2", Some(with_super("m2 in C")));
    assert_eq!(
        call(&t.c, "m2"),
        "((((m in A) m in B) m in C) m2 in B) m2 in C"
    );
}

#[test]
fn test_two_super_chains() {
    let t = abc();
    t.b.method("m", Some(with_super("m in B")));
    t.a.method("m1", Some(common::returns("m1 in A")));
    t.b.method("m1", Some(with_super("m1 in B")));
    t.b.method("m2", Some(with_self_call("m1", "m2 in B")));
    t.c.method("m2", Some(with_super("m2 in C")));
    assert_eq!(call(&t.c, "m2"), "(((m1 in A) m1 in B) m2 in B) m2 in C");
}

#[test]
fn test_ancestor_changes_are_visible() {
    let t = abc();
    let b1 = t.b.create(&[]).unwrap();
    t.a.method("late", Some(common::returns("late in A")));
    assert_eq!(b1.call("late", &[]).unwrap(), Value::from("late in A"));
    assert_eq!(call(&t.b, "late"), "late in A");

    // super is resolved per call
    t.a.method("m", Some(common::returns("new m in A")));
    assert_eq!(call(&t.c, "m"), "(new m in A) m in C");
}

#[test]
fn test_super_without_parent_method_is_a_no_op() {
    let a = new_class(None);
    a.method(
        "m",
        Some(Function::with_bindings(Bindings::SUPER, |call| {
            let parent = call.forward_super()?;
            Ok(Value::from(parent.is_undefined()))
        })),
    );
    assert_eq!(a.create(&[]).unwrap().call("m", &[]).unwrap(), Value::from(true));
}

#[test]
fn test_undeclared_super_is_a_no_op() {
    let t = abc();
    let plain = Function::new(|call| {
        assert!(!call.has_super());
        call.forward_super()
    });
    t.b.method("m", Some(plain.clone()));
    assert!(t.b.get_own_method("m").unwrap().ptr_eq(&plain));
    assert!(t.b.create(&[]).unwrap().call("m", &[]).unwrap().is_undefined());
}

fn nested(call: &Call<'_>) -> ClassyResult<Value> {
    let n = common::num_arg(call, 0);
    let obj = call.object()?;
    let deeper = if n > 0.0 {
        common::text(&obj.call("m", &[Value::from(n - 1.0)])?)
    } else {
        String::new()
    };
    let parent = common::text(&call.call_super(&[Value::from(n)])?);
    Ok(Value::from(format!("B{}({}{})", n, deeper, parent)))
}

#[test]
fn test_reentrant_super_keeps_each_activation_separate() {
    let a = new_class(None);
    a.method(
        "m",
        Some(Function::new(|call| {
            Ok(Value::from(format!("A{}", common::num_arg(call, 0))))
        })),
    );
    let b = a.subclass();
    b.method("m", Some(Function::with_bindings(Bindings::SUPER, nested)));

    let obj = b.create(&[]).unwrap();
    assert_eq!(
        obj.call("m", &[Value::from(1)]).unwrap(),
        Value::from("B1(B0(A0)A1)")
    );
}

#[test]
fn test_method_removal() {
    let t = abc();
    t.c.method("m", None);
    assert!(!t.c.has_own_method("m"));
    assert_eq!(call(&t.c, "m"), "m in A");

    t.a.method("m", None);
    let err = t.c.create(&[]).unwrap().call("m", &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AttributeError);
}

#[test]
fn test_errors_carry_the_member_trace() {
    let a = new_class(None);
    a.name("A").method(
        "fail",
        Some(Function::new(|_| {
            Err(classy_core::ClassyError::runtime_error("boom"))
        })),
    );
    a.method(
        "outer",
        Some(Function::new(|call| call.object()?.call("fail", &[]))),
    );

    let err = a.create(&[]).unwrap().call("outer", &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    let members: Vec<&str> = err.stack_trace.iter().map(|f| f.member.as_str()).collect();
    assert_eq!(members, vec!["fail", "outer"]);
    assert!(err.format().contains("A.fail"));
}

#[test]
fn test_method_introspection() {
    let t = abc();
    t.b.methods([("n", common::returns("n")), ("o", common::returns("o"))]);

    let names = |list: Vec<classy_core::Name>| list.iter().map(|n| n.to_string()).collect::<Vec<_>>();
    assert_eq!(names(t.b.list_own_methods()), vec!["n", "o"]);
    assert_eq!(names(t.c.list_methods()), vec!["m", "n", "o"]);
    assert!(t.c.get_own_method("n").is_none());
    assert!(t.c.get_method("n").is_some());
    assert!(t.a.get_method("n").is_none());
}

#[test]
fn test_instance_value_helpers() {
    let a = new_class(None);
    a.name("A");
    let obj = a.create(&[]).unwrap();
    assert_eq!(obj.to_string(), "instance of class A");
    assert_eq!(obj.class_name().as_deref(), Some("A"));
    assert!(classy_core::is_object(&Value::Instance(obj)));
    assert!(!classy_core::is_object(&Value::Class(a)));
}
