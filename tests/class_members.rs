mod common;

use classy_core::{metaclass, new_class, Accessor, Bindings, Class, ErrorKind, Function, Property, Value};

fn count(class: &Class) -> f64 {
    class
        .call_class_method("numInstances", &[])
        .unwrap()
        .as_number()
        .unwrap()
}

fn counted() -> Class {
    let a = new_class(None);
    a.name("A").class_field("count", 10);
    a.class_method(
        "oneMore",
        Some(Function::new(|call| {
            let class = call.class()?;
            let count = class.class_value("count")?.as_number().unwrap_or(0.0);
            class.set_class_value("count", Value::from(count + 1.0))?;
            Ok(Value::Undefined)
        })),
    );
    a.class_method(
        "numInstances",
        Some(Function::new(|call| call.class()?.class_value("count"))),
    );
    a.constructor(
        None,
        Function::with_bindings(Bindings::SUPER, |call| {
            call.forward_super()?;
            call.class()?.call_class_method("oneMore", &[])?;
            Ok(Value::Undefined)
        }),
    );
    a
}

#[test]
fn test_class_field_and_method() {
    common::init();
    let a = counted();
    assert_eq!(count(&a), 10.0);
    a.create(&[]).unwrap();
    assert_eq!(count(&a), 11.0);
    a.create(&[]).unwrap();
    assert_eq!(count(&a), 12.0);
}

#[test]
fn test_inherited_class_field_and_method() {
    let a = counted();
    let b = a.subclass();
    b.name("B").class_field("count", 100);
    a.create(&[]).unwrap();
    b.create(&[]).unwrap();

    assert_eq!(count(&a), 11.0);
    assert_eq!(count(&b), 101.0);
}

#[test]
fn test_explicit_super_call_in_class_method() {
    let a = counted();
    let b = a.subclass();
    b.name("B").class_field("count", 100);
    a.create(&[]).unwrap();
    b.create(&[]).unwrap();

    b.class_method(
        "numInstances",
        Some(Function::new(|call| {
            let class = call.class()?;
            let own = class.class_value("count")?.as_number().unwrap_or(0.0);
            let parent = match class.superclass() {
                Some(superclass) => superclass
                    .call_class_method("numInstances", &[])?
                    .as_number()
                    .unwrap_or(0.0),
                None => 0.0,
            };
            Ok(Value::from(own + parent))
        })),
    );
    assert_eq!(count(&b), 112.0);
}

#[test]
fn test_subclass_writes_its_own_class_field() {
    let a = counted();
    let b = a.subclass();
    b.create(&[]).unwrap();
    assert_eq!(count(&b), 11.0);
    assert_eq!(count(&a), 10.0);
    assert!(b.has_class_member("count"));
}

#[test]
fn test_computed_class_fields() {
    let a = new_class(None);
    a.name("Shape").class_fields([
        ("sides", Property::from(4)),
        (
            "label",
            Property::from(Accessor::getter(Function::new(|call| {
                let class = call.class()?;
                let sides = class.class_value("sides")?;
                Ok(Value::from(format!("{} with {} sides", class, sides)))
            }))),
        ),
    ]);
    assert_eq!(a.class_value("label").unwrap(), Value::from("class Shape with 4 sides"));

    let b = a.subclass();
    b.name("Triangle").class_field("sides", 3);
    assert_eq!(
        b.class_value("label").unwrap(),
        Value::from("class Triangle with 3 sides")
    );

    // writing a getter-only computed member is ignored
    b.set_class_value("label", Value::from("x")).unwrap();
    assert_eq!(
        b.class_value("label").unwrap(),
        Value::from("class Triangle with 3 sides")
    );
}

#[test]
fn test_class_method_removal_and_missing_members() {
    let a = new_class(None);
    a.class_methods([("ping", common::returns("pong"))]);
    assert_eq!(a.call_class_method("ping", &[]).unwrap(), Value::from("pong"));

    a.class_method("ping", None);
    let err = a.call_class_method("ping", &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AttributeError);
    assert!(a.class_value("ping").unwrap().is_undefined());
}

#[test]
fn test_metaclass_is_shared_and_extensible() {
    let describe = Function::new(|call| Ok(Value::from(call.class()?.to_string())));
    metaclass().class_method("describe", Some(describe));
    assert!(metaclass().has_member("describe"));
    assert!(metaclass().has_member("create"));
    let names = metaclass().member_names();
    assert_eq!(names.first().map(|n| &**n), Some("create"));
    assert!(names.iter().any(|n| &**n == "describe"));

    let a = new_class(None);
    a.name("A");
    let b = a.subclass();
    b.name("B");
    assert_eq!(b.call_class_method("describe", &[]).unwrap(), Value::from("class B"));

    metaclass().class_method("describe", None);
    assert!(!a.has_class_member("describe"));
}

#[test]
fn test_class_naming_and_hierarchy() {
    let a = new_class(None);
    assert_eq!(a.to_string(), "class ");
    a.name("A");
    assert_eq!(a.to_string(), "class A");
    assert_eq!(a.class_name().as_deref(), Some("A"));

    let b = new_class(Some(&a));
    assert!(b.superclass().unwrap().ptr_eq(&a));
    assert!(a.superclass().is_none());
    assert!(b.is_subclass_of(&a));
    assert!(!a.is_subclass_of(&b));
}
