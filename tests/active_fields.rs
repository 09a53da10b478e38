mod common;

use classy_core::{new_class, Accessor, Class, Function, Object, Property, Value};

fn farenheit_getter() -> Function {
    Function::new(|call| {
        let celsius = common::num_field(call, "celsius")?;
        Ok(Value::from(celsius * 9.0 / 5.0 + 32.0))
    })
}

fn farenheit_setter() -> Function {
    Function::new(|call| {
        let t = common::num_arg(call, 0);
        call.object()?.write("celsius", Value::from((t - 32.0) * 5.0 / 9.0))?;
        Ok(Value::Undefined)
    })
}

fn counter() -> Function {
    Function::new(|call| {
        let obj = call.object()?;
        let count = obj.read("_cnt")?.as_number().unwrap_or(0.0) + 1.0;
        obj.write("_cnt", Value::from(count))?;
        Ok(Value::from(count))
    })
}

fn number(obj: &Object, name: &str) -> f64 {
    obj.read(name).unwrap().as_number().unwrap()
}

fn check_temperature(temp: &Class) {
    let t = temp.create(&[]).unwrap();
    t.write("celsius", Value::from(10)).unwrap();
    assert_eq!(number(&t, "farenheit"), 50.0);

    t.write("farenheit", Value::from(95)).unwrap();
    assert_eq!(number(&t, "celsius"), 35.0);
}

fn check_get_only(class: &Class) {
    let o = class.create(&[]).unwrap();
    assert_eq!(number(&o, "count"), 1.0);
    assert!(o.write("count", Value::from(10)).is_ok());
    assert_eq!(number(&o, "count"), 2.0);
}

#[test]
fn test_active_field() {
    common::init();
    let temp = new_class(None);
    temp.name("Temp").field("celsius", 0).active_field(
        "farenheit",
        Some(farenheit_getter()),
        Some(farenheit_setter()),
    );
    check_temperature(&temp);
}

#[test]
fn test_get_only_active_field_ignores_writes() {
    let get_only = new_class(None);
    get_only.name("GetOnly").active_field("count", Some(counter()), None);
    check_get_only(&get_only);
}

#[test]
fn test_fields_route_accessors_to_active_fields() {
    let temp = new_class(None);
    temp.name("Temp").fields([
        ("celsius", Property::from(0)),
        (
            "farenheit",
            Property::from(Accessor::new(Some(farenheit_getter()), Some(farenheit_setter()))),
        ),
    ]);
    assert!(temp.has_own_field("farenheit"));
    check_temperature(&temp);
}

#[test]
fn test_fields_get_only_property() {
    let get_only = new_class(None);
    get_only
        .name("GetOnly")
        .fields([("count", Property::from(Accessor::getter(counter())))]);
    check_get_only(&get_only);
}

#[test]
fn test_active_fields_are_inherited_and_listed() {
    let temp = new_class(None);
    temp.field("celsius", 0).active_field(
        "farenheit",
        Some(farenheit_getter()),
        Some(farenheit_setter()),
    );
    let sub = temp.subclass();
    assert!(sub.has_field("farenheit"));
    assert!(!sub.has_own_field("farenheit"));

    let names: Vec<String> = temp.list_fields().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, vec!["celsius", "farenheit"]);

    let t = sub.create(&[]).unwrap();
    assert!(matches!(t.property("farenheit"), Some(Property::Accessor(_))));
    t.set_one("farenheit", Value::from(212)).unwrap();
    assert_eq!(t.get_one("celsius").unwrap(), Value::from(100));
}

#[test]
fn test_setter_only_active_field_reads_undefined() {
    let class = new_class(None);
    class.field("log", 0).active_field(
        "sink",
        None,
        Some(Function::new(|call| {
            call.object()?.write("log", call.arg(0))?;
            Ok(Value::Undefined)
        })),
    );
    let obj = class.create(&[]).unwrap();
    obj.write("sink", Value::from(7)).unwrap();
    assert!(obj.read("sink").unwrap().is_undefined());
    assert_eq!(obj.read("log").unwrap(), Value::from(7));
}
