// vim: tw=80
//! Conversion from dynamic [`Value`]s back into the Rust types of a mocked
//! method's signature.

use thiserror::Error;

use crate::value::{Native, Object, Value};

/// A [`Value`] could not be converted to the requested type
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot convert {found} into {expected}")]
pub struct ConversionError {
    expected: &'static str,
    found: &'static str,
}

impl ConversionError {
    pub fn new(expected: &'static str, found: &Value) -> Self {
        ConversionError { expected, found: found.kind_name() }
    }

    pub fn expected(&self) -> &'static str {
        self.expected
    }

    pub fn found(&self) -> &'static str {
        self.found
    }
}

/// Types that a mocked method may return.
///
/// `Undefined` and `Null` convert to each type's empty default, which is what
/// a loose mock yields for a call it has no setup for.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConversionError>;

    /// Carry a value thrown by the mock, if this type is able to.
    fn from_thrown(_thrown: Value) -> Option<Self> {
        None
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(_value: Value) -> Result<Self, ConversionError> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Undefined | Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            other => Err(ConversionError::new("bool", &other))
        }
    }
}

macro_rules! from_value_int {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    let wanted = stringify!($t);
                    match value {
                        Value::Undefined | Value::Null => Ok(0),
                        ref v @ (Value::Int(_) | Value::Float(_)) => {
                            v.as_i64()
                                .and_then(|i| <$t>::try_from(i).ok())
                                .ok_or_else(|| ConversionError::new(wanted, v))
                        },
                        other => Err(ConversionError::new(wanted, &other))
                    }
                }
            }
        )*
    }
}
from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Undefined | Value::Null => Ok(0.0),
            other => other.as_f64()
                .ok_or_else(|| ConversionError::new("f64", &other))
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Undefined | Value::Null => Ok(String::new()),
            Value::Str(s) => Ok(s),
            other => Err(ConversionError::new("String", &other))
        }
    }
}

impl FromValue for Object {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Undefined | Value::Null => Ok(Object::new()),
            Value::Object(o) => Ok(o),
            other => Err(ConversionError::new("Object", &other))
        }
    }
}

impl FromValue for Native {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Native(n) => Ok(n),
            other => Err(ConversionError::new("Native", &other))
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Undefined | Value::Null => Ok(None),
            other => T::from_value(other).map(Some)
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Undefined | Value::Null => Ok(Vec::new()),
            Value::List(items) => {
                items.into_iter().map(T::from_value).collect()
            },
            other => Err(ConversionError::new("Vec", &other))
        }
    }
}

/// A thrown value becomes `Err`
impl<T: FromValue, E: FromValue> FromValue for Result<T, E> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        T::from_value(value).map(Ok)
    }

    fn from_thrown(thrown: Value) -> Option<Self> {
        E::from_value(thrown).ok().map(Err)
    }
}
