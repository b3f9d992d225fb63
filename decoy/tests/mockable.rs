// vim: tw=80
//! Mock structs generated by `#[mockable]`

use decoy::*;

#[mockable]
pub trait Doer {
    fn do_number(&self, x: i64) -> i64;
    fn do_string(&self, s: &str) -> String;
    fn do_nothing(&mut self);
    fn parse(&self, s: &str) -> Result<i64, String>;
    fn maybe(&self, flag: bool) -> Option<u32>;
    fn scale(&self, x: i32) -> i64;
}

pub struct RealDoer {
    calls: u32,
}

impl Doer for RealDoer {
    fn do_number(&self, x: i64) -> i64 {
        x * 10
    }
    fn do_string(&self, s: &str) -> String {
        s.to_uppercase()
    }
    fn do_nothing(&mut self) {
        self.calls += 1;
    }
    fn parse(&self, s: &str) -> Result<i64, String> {
        s.parse::<i64>().map_err(|e| e.to_string())
    }
    fn maybe(&self, flag: bool) -> Option<u32> {
        flag.then_some(self.calls)
    }
    fn scale(&self, x: i32) -> i64 {
        i64::from(x) * 1000
    }
}

#[test]
fn returns() {
    let mock = MockDoer::new();
    mock.setup(|x| x.do_number(4)).unwrap().returns(40);
    mock.setup(|x| x.do_string(it::is_any())).unwrap().returns("hi");
    assert_eq!(40, mock.do_number(4));
    assert_eq!("hi", mock.do_string("anything"));
}

#[test]
fn loose_defaults() {
    let mut mock = MockDoer::new();
    assert_eq!(0, mock.do_number(1));
    assert_eq!("", mock.do_string("x"));
    assert_eq!(Ok(0), mock.parse("x"));
    assert_eq!(None, mock.maybe(true));
    mock.do_nothing();
    assert_eq!(5, mock.invocations().len());
}

#[test]
fn returning() {
    let mock = MockDoer::new();
    mock.setup(|x| x.do_number(it::is_any_number()))
        .unwrap()
        .returning(|args| args[0].as_i64().unwrap_or_default() * 2);
    assert_eq!(14, mock.do_number(7));
}

#[test]
fn thrown_becomes_err() {
    let mock = MockDoer::new();
    mock.setup(|x| x.parse("bad")).unwrap().throws("not a number");
    mock.setup(|x| x.parse("5")).unwrap().returns(5);
    assert_eq!(Err("not a number".to_owned()), mock.parse("bad"));
    assert_eq!(Ok(5), mock.parse("5"));
}

#[test]
#[should_panic(expected = "mock threw")]
fn thrown_without_err_panics() {
    let mock = MockDoer::new();
    mock.setup(|x| x.do_number(1)).unwrap().throws("boom");
    mock.do_number(1);
}

#[test]
#[should_panic(expected = "cannot convert string into i64")]
fn wrong_return_type_panics() {
    let mock = MockDoer::new();
    mock.setup(|x| x.do_number(1)).unwrap().returns("one");
    mock.do_number(1);
}

#[test]
#[should_panic(expected = "cannot convert float into i64")]
fn float_too_large_for_return_type() {
    let mock = MockDoer::new();
    mock.setup(|x| x.scale(1)).unwrap().returns(1e30);
    mock.scale(1);
}

#[test]
fn whole_float_return() {
    let mock = MockDoer::new();
    mock.setup(|x| x.scale(1)).unwrap().returns(3.0);
    assert_eq!(3, mock.scale(1));
}

#[test]
fn any_of_argument_type() {
    let mock = MockDoer::new();
    mock.setup(|x| x.scale(it::is_any_object::<i32>())).unwrap().returns(5);
    assert_eq!(5, mock.scale(7));
}

#[test]
fn option_return() {
    let mock = MockDoer::new();
    mock.setup(|x| x.maybe(true)).unwrap().returns(3u32);
    mock.setup(|x| x.maybe(false)).unwrap().returns(Value::Null);
    assert_eq!(Some(3), mock.maybe(true));
    assert_eq!(None, mock.maybe(false));
}

#[test]
fn of_instance_forwards_unhandled() {
    let mut mock = MockDoer::of_instance(RealDoer { calls: 0 });
    mock.setup(|x| x.do_number(1)).unwrap().returns(-1);
    assert_eq!(-1, mock.do_number(1));
    assert_eq!(20, mock.do_number(2));
    assert_eq!("ABC", mock.do_string("abc"));
    assert_eq!(Err("invalid digit found in string".to_owned()),
               mock.parse("x"));
    mock.do_nothing();
    mock.do_nothing();
    assert_eq!(Some(2), mock.maybe(true));
}

#[test]
fn call_base_per_setup() {
    let mock = MockDoer::of_instance(RealDoer { calls: 0 });
    mock.set_call_base(false);
    mock.setup(|x| x.do_number(3)).unwrap().call_base();
    assert_eq!(30, mock.do_number(3));
    assert_eq!(0, mock.do_number(4));
}

#[test]
fn call_base_without_base() {
    let mock = MockDoer::new();
    mock.setup(|x| x.do_number(3)).unwrap().call_base();
    assert_eq!(0, mock.do_number(3));
}

#[test]
#[should_panic(expected = "NoSetup")]
fn strict_panics_on_unhandled() {
    let mock = MockDoer::with_behavior(Behavior::Strict);
    mock.setup(|x| x.do_number(1)).unwrap().returns(1);
    assert_eq!(1, mock.do_number(1));
    mock.do_number(2);
}

#[test]
fn verify() {
    let mock = MockDoer::new();
    mock.do_number(1);
    mock.do_number(1);
    mock.do_string("a");
    mock.verify(|x| x.do_number(1), 2).unwrap();
    mock.verify(|x| x.do_string("b"), Times::never()).unwrap();
    let e = mock.verify(|x| x.do_number(it::is_any()), Times::once())
        .unwrap_err();
    assert_eq!(Reason::CallCountVerificationFailed, e.reason());
}

#[test]
fn sequence() {
    let mut mock = MockDoer::new();
    mock.setup(|x| x.do_nothing()).unwrap().once().in_sequence();
    mock.setup(|x| x.do_number(it::is_any())).unwrap().once().in_sequence();
    mock.do_number(1);
    mock.do_nothing();
    let e = mock.verify_all().unwrap_err();
    assert_eq!(Reason::CallOrderVerificationFailed, e.reason());
}

#[test]
fn as_trait_object() {
    fn total(d: &dyn Doer) -> i64 {
        d.do_number(1) + d.do_number(2)
    }
    let mock = MockDoer::new();
    mock.setup(|x| x.do_number(it::is_any()))
        .unwrap()
        .returns(5)
        .verifiable();
    assert_eq!(10, total(&mock));
    mock.verify_all().unwrap();
}

#[test]
fn debug() {
    let mock = MockDoer::default();
    let s = format!("{:?}", mock);
    assert!(s.starts_with("MockDoer { mock: Mock { name: \"MockDoer\""), "{}",
            s);
}
