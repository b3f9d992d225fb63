// vim: tw=80
//! Loose and strict mocks, and forwarding to a base implementation
#![deny(warnings)]

use decoy::*;
use std::{cell::Cell, rc::Rc};

fn echo(inv: &Invocation) -> Result<Value, Fault> {
    Ok(Value::from(format!("base {}", inv)))
}

#[test]
fn loose_returns_undefined() {
    let mock = Mock::new();
    assert!(mock.call("anything", [1]).unwrap().is_undefined());
    assert!(mock.get("prop").unwrap().is_undefined());
    mock.set("prop", 1).unwrap();
    assert_eq!(3, mock.invocations().len());
}

#[test]
fn strict_fails_unhandled() {
    let mock = Mock::strict();
    let e = mock.call("f", [1, 2]).unwrap_err();
    let e = e.mock_error().unwrap();
    assert_eq!(Reason::NoSetup, e.reason());
    assert_eq!(Some("f(1, 2)"), e.failed());
    assert!(e.message().contains("f(1, 2)"), "{}", e.message());
    // The failed invocation is still recorded
    assert_eq!(vec!["f(1, 2)".to_owned()], e.invocations());
    assert_eq!(1, mock.invocations().len());
}

#[test]
fn strict_setup_without_behavior_yields_undefined() {
    let mock = Mock::strict();
    mock.setup(|r| r.set("p", it::is_any())).unwrap();
    mock.set("p", 1).unwrap();
    mock.set("p", 2).unwrap();
}

#[test]
fn loose_calls_base() {
    let mock = Mock::of_instance(echo);
    mock.setup(|r| r.call("f", args![1])).unwrap().returns("mocked");
    assert_eq!(Value::from("mocked"), mock.call("f", [1]).unwrap());
    assert_eq!(Value::from("base f(2)"), mock.call("f", [2]).unwrap());
    assert_eq!(Value::from("base p"), mock.get("p").unwrap());
}

#[test]
fn strict_does_not_fall_back_to_base() {
    let mock = Mock::builder().strict().base(echo).build();
    let e = mock.get("p").unwrap_err();
    assert_eq!(Reason::NoSetup, e.mock_error().unwrap().reason());
    mock.setup(|r| r.get("p")).unwrap().call_base();
    assert_eq!(Value::from("base p"), mock.get("p").unwrap());
}

#[test]
fn call_base_toggles() {
    let mock = Mock::of_instance(echo);
    assert!(mock.call_base());
    mock.set_call_base(false);
    assert!(mock.get("p").unwrap().is_undefined());
    mock.set_call_base(true);
    assert_eq!(Value::from("base p"), mock.get("p").unwrap());
}

#[test]
fn base_counts_calls() {
    let calls = Rc::new(Cell::new(0));
    let calls2 = calls.clone();
    let mock = Mock::of_instance(move |_: &Invocation| -> Result<Value, Fault> {
        calls2.set(calls2.get() + 1);
        Ok(Value::Null)
    });
    mock.setup(|r| r.get("handled")).unwrap().returns(1);
    mock.get("handled").unwrap();
    mock.get("unhandled").unwrap();
    assert_eq!(1, calls.get());
}

#[test]
fn base_may_use_other_mocks() {
    let mock = Rc::new(Mock::new());
    let weak = Rc::downgrade(&mock);
    let outer = Mock::of_instance(move |inv: &Invocation|
        -> Result<Value, Fault>
    {
        match weak.upgrade() {
            Some(inner) => inner.get(inv.member()),
            None => Ok(Value::Undefined)
        }
    });
    mock.setup(|r| r.get("p")).unwrap().returns(42);
    assert_eq!(Value::from(42), outer.get("p").unwrap());
    assert_eq!(1, mock.invocations().len());
}

#[test]
fn invocation_positions_increase() {
    let mock = Mock::new();
    mock.get("a").unwrap();
    mock.get("b").unwrap();
    let invs = mock.invocations();
    assert!(invs[0].position() < invs[1].position());
}

#[test]
fn builder_settings() {
    let mock = Mock::builder()
        .name("store")
        .behavior(Behavior::Strict)
        .build();
    assert_eq!("store", mock.name());
    assert_eq!(Behavior::Strict, mock.behavior());
    assert_eq!(Behavior::Loose, Mock::default().behavior());
    assert_eq!(Behavior::Strict,
               Mock::with_behavior(Behavior::Strict).behavior());
}

#[test]
#[should_panic(expected = "ExpectationGuard is still alive")]
fn guard_must_be_dropped() {
    let mock = Mock::new();
    let _guard = mock.setup(|r| r.get("p")).unwrap();
    let _ = mock.get("p");
}

#[test]
#[should_panic(expected = "store: mock used while an ExpectationGuard")]
fn guard_must_be_dropped_before_next_setup() {
    let mock = Mock::builder().name("store").build();
    let _guard = mock.setup(|r| r.get("p")).unwrap();
    let _ = mock.setup(|r| r.get("q"));
}

#[test]
fn guard_dropped_after_statement() {
    let mock = Mock::new();
    {
        let mut guard = mock.setup(|r| r.get("p")).unwrap();
        guard.returns(1);
    }
    assert_eq!(Value::from(1), mock.get("p").unwrap());
}
