// vim: tw=80
//! Argument matchers

use predicates::prelude::*;
use predicates_tree::CaseTreeExt;
use std::fmt;

use crate::value::{Native, Object, TypeTag, Value};

/// Decides whether a single argument is acceptable.
///
/// Most matchers are built with the factories in [`it`].  Plain literals
/// convert into exact-value matchers, so `args![1, "two"]` works as expected.
pub enum Matcher {
    /// Structurally equal to a snapshot taken when the matcher was made
    Value(Value),
    /// Accepted by an arbitrary predicate
    Predicate(Box<dyn Predicate<Value>>),
    /// Anything at all, including `Undefined`
    Any,
    /// Any value whose runtime type is the given one.  Primitive types match
    /// the values that carry them: any integer type matches every integer.
    AnyOfType(TypeTag),
    AnyString,
    AnyNumber,
    /// Any object that has at least these fields, each structurally equal
    ObjectWith(Object),
}

impl Matcher {
    pub fn matches(&self, candidate: &Value) -> bool {
        match self {
            Matcher::Value(expected) => expected.deep_eq(candidate),
            Matcher::Predicate(p) => p.eval(candidate),
            Matcher::Any => true,
            Matcher::AnyOfType(tag) => candidate.type_tag()
                .is_some_and(|t| t.carrier() == tag.carrier()),
            Matcher::AnyString => candidate.is_string(),
            Matcher::AnyNumber => candidate.is_number(),
            Matcher::ObjectWith(shape) => candidate.as_object()
                .is_some_and(|o| o.has_shape(shape)),
        }
    }

    /// Explain why a predicate matcher rejected `candidate`.  Other matchers
    /// have nothing to add beyond their description.
    pub fn explain(&self, candidate: &Value) -> Option<String> {
        match self {
            Matcher::Predicate(p) => p.find_case(false, candidate)
                .map(|case| case.tree().to_string()),
            _ => None
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Value(v) => write!(f, "{}", v),
            Matcher::Predicate(p) => write!(f, "{}", p),
            Matcher::Any => f.write_str("is_any()"),
            Matcher::AnyOfType(tag) => {
                write!(f, "is_any_object::<{}>()", tag.short_name())
            },
            Matcher::AnyString => f.write_str("is_any_string()"),
            Matcher::AnyNumber => f.write_str("is_any_number()"),
            Matcher::ObjectWith(shape) => {
                write!(f, "is_object_with({})", shape)
            }
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matcher({})", self)
    }
}

impl From<Value> for Matcher {
    fn from(value: Value) -> Self {
        Matcher::Value(value.snapshot())
    }
}

macro_rules! literal_matcher {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Matcher {
                fn from(literal: $t) -> Self {
                    Matcher::from(Value::from(literal))
                }
            }
        )*
    }
}
literal_matcher!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64,
    usize, f32, f64, (), String, &str, &String, Object, Native);

impl<T> From<Vec<T>> for Matcher where Value: From<T> {
    fn from(items: Vec<T>) -> Self {
        Matcher::from(<Value as From<Vec<T>>>::from(items))
    }
}

impl<T> From<Option<T>> for Matcher where Value: From<T> {
    fn from(o: Option<T>) -> Self {
        Matcher::from(<Value as From<Option<T>>>::from(o))
    }
}

/// Matcher factories
pub mod it {
    use super::*;

    /// Exactly equal to `value`, as it is now.  Later changes to `value` do
    /// not affect the matcher.
    pub fn is_value<V: Into<Value>>(value: V) -> Matcher {
        Matcher::from(value.into())
    }

    /// Accepted by the closure `f`
    ///
    /// # Examples
    /// ```
    /// # use decoy::*;
    /// let m = it::is(|v| v.as_i64().is_some_and(|i| i > 10));
    /// assert!(m.matches(&Value::from(11)));
    /// assert!(!m.matches(&Value::from(10)));
    /// ```
    pub fn is<F>(f: F) -> Matcher
        where F: Fn(&Value) -> bool + 'static
    {
        Matcher::Predicate(Box::new(predicate::function(f)))
    }

    /// Accepted by a predicate from the `predicates` crate
    ///
    /// # Examples
    /// ```
    /// # use decoy::*;
    /// let m = it::satisfies(predicate::eq(Value::from(4)));
    /// assert!(m.matches(&Value::from(4)));
    /// ```
    pub fn satisfies<P>(p: P) -> Matcher
        where P: Predicate<Value> + 'static
    {
        Matcher::Predicate(Box::new(p))
    }

    pub fn is_any() -> Matcher {
        Matcher::Any
    }

    /// Any object tagged with `T` (see [`Object::of`]), or any native `T`.
    ///
    /// For primitive `T` the type's carrier is matched instead.  Every integer
    /// type matches any integer value, `f32` matches any float, and `&str` or
    /// `char` matches any string.  To accept integers and floats alike, use
    /// [`is_any_number`].
    ///
    /// # Examples
    /// ```
    /// # use decoy::*;
    /// let m = it::is_any_object::<i32>();
    /// assert!(m.matches(&Value::from(5u8)));
    /// assert!(!m.matches(&Value::from(5.5)));
    /// ```
    pub fn is_any_object<T: ?Sized + 'static>() -> Matcher {
        Matcher::AnyOfType(TypeTag::of::<T>())
    }

    pub fn is_any_string() -> Matcher {
        Matcher::AnyString
    }

    pub fn is_any_number() -> Matcher {
        Matcher::AnyNumber
    }

    /// Any object carrying at least the fields of `shape`
    ///
    /// # Examples
    /// ```
    /// # use decoy::*;
    /// let m = it::is_object_with(&Object::new().with("id", 1));
    /// assert!(m.matches(&Object::new().with("id", 1).with("x", 2).into()));
    /// assert!(!m.matches(&Object::new().with("x", 2).into()));
    /// ```
    pub fn is_object_with(shape: &Object) -> Matcher {
        Matcher::ObjectWith(shape.snapshot())
    }
}

#[cfg(test)]
mod t {
    use super::*;

    struct Doer;

    #[test]
    fn literals_are_snapshots() {
        let o = Object::new().with("x", 1);
        let m = Matcher::from(o.clone());
        o.set("x", 2);
        assert!(m.matches(&Object::new().with("x", 1).into()));
        assert!(!m.matches(&o.into()));
    }

    #[test]
    fn any_of_type_is_exact() {
        let m = it::is_any_object::<Doer>();
        assert!(m.matches(&Object::of::<Doer>().into()));
        assert!(!m.matches(&Object::new().into()));
        assert!(!m.matches(&Value::Undefined));
        assert!(it::is_any_object::<String>().matches(&"x".into()));
    }

    #[test]
    fn any_of_primitive_type_matches_its_carrier() {
        assert!(it::is_any_object::<i32>().matches(&5i32.into()));
        assert!(it::is_any_object::<u64>().matches(&Value::from(-1)));
        assert!(!it::is_any_object::<i32>().matches(&1.5.into()));
        assert!(it::is_any_object::<f32>().matches(&1.5.into()));
        assert!(it::is_any_object::<&str>().matches(&"x".into()));
        assert!(!it::is_any_object::<bool>().matches(&1.into()));
    }

    #[test]
    fn list_and_option_literals() {
        let m = Matcher::from(vec![1, 2]);
        assert!(m.matches(&vec![1, 2].into()));
        assert!(!m.matches(&vec![2, 1].into()));
        let m = Matcher::from(None::<i32>);
        assert!(m.matches(&Value::Null));
        assert!(!m.matches(&Value::Undefined));
        assert!(Matcher::from(Some("x")).matches(&"x".into()));
    }

    #[test]
    fn object_with_is_snapshot() {
        let shape = Object::new().with("a", 1);
        let m = it::is_object_with(&shape);
        shape.set("a", 2);
        assert!(m.matches(&Object::new().with("a", 1).into()));
        assert!(!m.matches(&shape.into()));
    }

    #[test]
    fn any_string_and_number() {
        assert!(it::is_any_string().matches(&"".into()));
        assert!(!it::is_any_string().matches(&Value::Null));
        assert!(it::is_any_number().matches(&1.5.into()));
        assert!(it::is_any_number().matches(&1.into()));
        assert!(!it::is_any_number().matches(&"1".into()));
    }

    #[test]
    fn object_with() {
        let m = it::is_object_with(&Object::new().with("a", 1));
        assert!(!m.matches(&Value::from(1)));
        assert!(!m.matches(&Object::new().with("a", 2).into()));
        let empty = it::is_object_with(&Object::new());
        assert!(empty.matches(&Object::new().with("z", 0).into()));
        assert!(!empty.matches(&Value::from("z")));
    }

    #[test]
    fn explain_predicate() {
        let m = it::satisfies(predicate::eq(Value::from(4)));
        assert!(m.explain(&Value::from(5)).is_some());
        assert!(m.explain(&Value::from(4)).is_none());
        assert!(it::is_any().explain(&Value::from(5)).is_none());
    }

    #[test]
    fn describe() {
        assert_eq!("is_any()", it::is_any().to_string());
        assert_eq!("is_any_object::<Doer>()",
                   it::is_any_object::<Doer>().to_string());
        assert_eq!(r#"is_object_with({"a": 1})"#,
                   it::is_object_with(&Object::new().with("a", 1)).to_string());
        assert_eq!(r#""x""#, Matcher::from("x").to_string());
    }
}
