// vim: tw=80

use serde_derive::Serialize;
use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::value::Value;

/// Positions are shared by every mock, so invocations of different mocks are
/// totally ordered too.
static POSITION: AtomicUsize = AtomicUsize::new(0);

/// The kind of member access that was intercepted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Kind {
    /// A method call
    Call,
    /// A property read
    Get,
    /// A property write.  The written value is the sole argument.
    Set,
}

/// One recorded member access.  Immutable once created.
#[derive(Clone, Debug, Serialize)]
pub struct Invocation {
    member: String,
    kind: Kind,
    args: Vec<Value>,
    position: usize,
}

impl Invocation {
    pub fn new<S: Into<String>>(kind: Kind, member: S, args: Vec<Value>)
        -> Self
    {
        let position = POSITION.fetch_add(1, Ordering::Relaxed);
        Invocation { member: member.into(), kind, args, position }
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Monotonic sequence number of this invocation
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Get => f.write_str(&self.member),
            Kind::Set => {
                f.write_str(&self.member)?;
                match self.args.first() {
                    Some(v) => write!(f, " = {}", v),
                    None => f.write_str(" = undefined")
                }
            },
            Kind::Call => {
                write!(f, "{}(", self.member)?;
                for (i, arg) in self.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}
