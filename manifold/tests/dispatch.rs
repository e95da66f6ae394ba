//! End-to-end dispatch scenarios.

use pretty_assertions::assert_eq;

use manifold::{
    BindError, ClassTable, CoercionPolicy, DispatchError, Dispatcher, Kwargs, TypeExpr, TypeTag,
    Value,
};

fn constant(s: &'static str) -> impl Fn(Option<&Value>, &[Value], &Kwargs) -> Value {
    move |_, _, _| Value::str(s)
}

fn no_kwargs() -> Kwargs {
    Kwargs::new()
}

/// The canonical scenario: `(int, int) -> "A"`, `(float, float) -> "B"`,
/// fallback `-> "C"`, with float truncation opted in so `(int, float)`
/// reaches the first-declared signature through coercion.
fn abc_dispatcher(classes: &mut ClassTable) -> Dispatcher {
    let owner = classes.declare("Point");
    let mut dispatcher = Dispatcher::with_policy(CoercionPolicy {
        truncate_floats: true,
    });
    dispatcher
        .overload(
            vec![TypeTag::Int.into(), TypeTag::Int.into()],
            constant("A"),
        )
        .unwrap();
    dispatcher
        .overload(
            vec![TypeTag::Float.into(), TypeTag::Float.into()],
            constant("B"),
        )
        .unwrap();
    dispatcher.fallback(constant("C")).unwrap();
    dispatcher.bind_to(owner, "combine", classes).unwrap();
    dispatcher
}

#[test]
fn exact_int_pair_hits_first_signature() {
    let mut classes = ClassTable::new();
    let dispatcher = abc_dispatcher(&mut classes);
    let result = dispatcher
        .call(&classes, &[Value::Int(1), Value::Int(2)], &no_kwargs())
        .unwrap();
    assert_eq!(result, Value::str("A"));
}

#[test]
fn exact_float_pair_hits_second_signature() {
    let mut classes = ClassTable::new();
    let dispatcher = abc_dispatcher(&mut classes);
    let result = dispatcher
        .call(&classes, &[Value::Float(1.0), Value::Float(2.0)], &no_kwargs())
        .unwrap();
    assert_eq!(result, Value::str("B"));
}

#[test]
fn mixed_pair_coerces_to_first_declared_signature() {
    let mut classes = ClassTable::new();
    let dispatcher = abc_dispatcher(&mut classes);

    // Phase 1 fails both signatures. Phase 2 truncates 2.0 -> 2 for the
    // first-declared (int, int) signature, which therefore wins.
    let result = dispatcher
        .call(&classes, &[Value::Int(1), Value::Float(2.0)], &no_kwargs())
        .unwrap();
    assert_eq!(result, Value::str("A"));
}

#[test]
fn unmatched_argument_reaches_the_fallback() {
    let mut classes = ClassTable::new();
    let dispatcher = abc_dispatcher(&mut classes);
    let result = dispatcher
        .call(&classes, &[Value::str("x")], &no_kwargs())
        .unwrap();
    assert_eq!(result, Value::str("C"));
}

#[test]
fn no_fallback_means_dispatch_error() {
    let mut classes = ClassTable::new();
    let owner = classes.declare("Point");
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .overload(
            vec![TypeTag::Int.into(), TypeTag::Int.into()],
            constant("A"),
        )
        .unwrap();
    dispatcher
        .overload(
            vec![TypeTag::Float.into(), TypeTag::Float.into()],
            constant("B"),
        )
        .unwrap();
    dispatcher.bind_to(owner, "combine", &classes).unwrap();

    let err = dispatcher.call(&classes, &[], &no_kwargs()).unwrap_err();
    match err {
        DispatchError::NoMatch { owner, field, args } => {
            assert_eq!(owner, "Point");
            assert_eq!(field, "combine");
            assert!(args.is_empty());
        }
        other => panic!("expected NoMatch, got {other:?}"),
    }
}

#[test]
fn coerced_arguments_replace_the_originals() {
    let mut classes = ClassTable::new();
    let owner = classes.declare("Point");
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .overload(
            vec![TypeTag::Float.into(), TypeTag::Float.into()],
            |_, args, _| Value::Tuple(args.to_vec()),
        )
        .unwrap();
    dispatcher.bind_to(owner, "combine", &classes).unwrap();

    // The implementation must see the coerced tuple, not the original ints.
    let result = dispatcher
        .call(&classes, &[Value::Int(1), Value::Int(2)], &no_kwargs())
        .unwrap();
    assert_eq!(
        result,
        Value::Tuple(vec![Value::Float(1.0), Value::Float(2.0)])
    );
}

#[test]
fn exact_arguments_pass_through_unmodified() {
    let mut classes = ClassTable::new();
    let owner = classes.declare("Point");
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .overload(vec![TypeTag::List.into()], |_, args, _| args[0].clone())
        .unwrap();
    dispatcher.bind_to(owner, "identity", &classes).unwrap();

    let list = Value::List(vec![Value::Int(1), Value::str("two")]);
    let result = dispatcher
        .call(&classes, &[list.clone()], &no_kwargs())
        .unwrap();
    assert_eq!(result, list);
}

#[test]
fn placeholder_overload_dispatches_on_owner_instances() {
    let mut classes = ClassTable::new();
    let owner = classes.declare("Point");
    let stranger = classes.declare("Stranger");

    let mut dispatcher = Dispatcher::new();
    dispatcher
        .overload(
            vec![TypeExpr::SelfType, TypeExpr::SelfType],
            constant("pair of points"),
        )
        .unwrap();
    dispatcher.fallback(constant("fallback")).unwrap();
    dispatcher.bind_to(owner, "merge", &classes).unwrap();

    let point = Value::object(owner);
    let result = dispatcher
        .call(&classes, &[point.clone(), point.clone()], &no_kwargs())
        .unwrap();
    assert_eq!(result, Value::str("pair of points"));

    // A different class's instance is not THIS; the fallback takes over.
    let result = dispatcher
        .call(&classes, &[point, Value::object(stranger)], &no_kwargs())
        .unwrap();
    assert_eq!(result, Value::str("fallback"));
}

#[test]
fn duplicate_signatures_fail_the_bind() {
    let mut classes = ClassTable::new();
    let owner = classes.declare("Point");

    let mut dispatcher = Dispatcher::new();
    dispatcher
        .overload(
            vec![TypeTag::Int.into(), TypeTag::Int.into()],
            constant("first"),
        )
        .unwrap();
    dispatcher
        .overload(
            vec![TypeTag::Int.into(), TypeTag::Int.into()],
            constant("second"),
        )
        .unwrap();

    let err = dispatcher.bind_to(owner, "combine", &classes).unwrap_err();
    assert!(matches!(err, BindError::DuplicateSignature { .. }));
}

#[test]
fn two_fallbacks_fail_the_bind() {
    let mut classes = ClassTable::new();
    let owner = classes.declare("Point");

    let mut dispatcher = Dispatcher::new();
    dispatcher.fallback(constant("one")).unwrap();
    dispatcher.fallback(constant("two")).unwrap();

    let err = dispatcher.bind_to(owner, "combine", &classes).unwrap_err();
    assert!(matches!(err, BindError::DuplicateFallback { .. }));
}

#[test]
fn coercion_failures_never_escape_the_dispatcher() {
    let mut classes = ClassTable::new();
    // This constructor refuses everything; its error must stay internal.
    let picky = classes.declare_with_constructor("Picky", |_| Err("no".to_string()));
    let owner = classes.declare("Point");

    let mut dispatcher = Dispatcher::new();
    dispatcher
        .overload(
            vec![TypeExpr::Concrete(TypeTag::Object(picky))],
            constant("picky"),
        )
        .unwrap();
    dispatcher.fallback(constant("fallback")).unwrap();
    dispatcher.bind_to(owner, "accept", &classes).unwrap();

    // The failed constructor cast surfaces as a fallback hit, not an error.
    let result = dispatcher
        .call(&classes, &[Value::Int(1)], &no_kwargs())
        .unwrap();
    assert_eq!(result, Value::str("fallback"));
}

#[test]
fn constructor_coercion_builds_the_declared_instance() {
    let mut classes = ClassTable::new();
    let wrapper = classes.declare_with_constructor("Wrapper", |v| match v {
        Value::Int(_) => Ok(Value::object(manifold::ClassId::new(0))),
        other => Err(format!("cannot wrap {other}")),
    });
    let owner = classes.declare("Point");

    let mut dispatcher = Dispatcher::new();
    dispatcher
        .overload(
            vec![TypeExpr::Concrete(TypeTag::Object(wrapper))],
            |_, args, _| match &args[0] {
                Value::Object { class, .. } => Value::Class(*class),
                _ => unreachable!(),
            },
        )
        .unwrap();
    dispatcher.bind_to(owner, "wrap", &classes).unwrap();

    let result = dispatcher
        .call(&classes, &[Value::Int(3)], &no_kwargs())
        .unwrap();
    assert_eq!(result, Value::Class(wrapper));
}
