// vim: tw=80

use std::fmt;
use thiserror::Error;

use crate::value::Value;

/// Why a mock operation failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reason {
    /// A strict mock was invoked with no setup able to handle the invocation
    NoSetup,
    /// A setup descriptor performed more than one member access
    MoreThanOneSetupExpression,
    /// A setup descriptor performed no member access at all
    InvalidSetupExpression,
    /// An expectation was met too few or too many times
    CallCountVerificationFailed,
    /// The invocation history cannot be split among the in-sequence
    /// expectations in their declared order
    CallOrderVerificationFailed,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A failure reported by the mock engine itself.
///
/// Besides its [`Reason`] it carries everything needed to diagnose the
/// failure: the offending pattern or invocation, every configured setup, and
/// every invocation performed so far.  Its `Display` output includes all of
/// them.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{reason} - {message}{}", Diagnostics(.setups, .invocations))]
pub struct MockError {
    reason: Reason,
    message: String,
    subject: Option<String>,
    setups: Vec<String>,
    invocations: Vec<String>,
}

impl MockError {
    pub(crate) fn new<S: Into<String>>(reason: Reason, message: S) -> Self {
        MockError {
            reason,
            message: message.into(),
            subject: None,
            setups: Vec::new(),
            invocations: Vec::new(),
        }
    }

    pub(crate) fn subject<S: ToString>(mut self, subject: S) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub(crate) fn context(mut self, setups: Vec<String>,
                          invocations: Vec<String>) -> Self
    {
        self.setups = setups;
        self.invocations = invocations;
        self
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// The headline, without the list of setups and invocations
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The pattern or invocation the failure is about, if any
    pub fn failed(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Every setup configured on the mock at the time of failure
    pub fn setups(&self) -> &[String] {
        &self.setups
    }

    /// Every invocation performed on the mock at the time of failure
    pub fn invocations(&self) -> &[String] {
        &self.invocations
    }
}

struct Diagnostics<'a>(&'a [String], &'a [String]);

impl fmt::Display for Diagnostics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, "Configured setups", self.0)?;
        write_list(f, "Performed invocations", self.1)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, title: &str, items: &[String])
    -> fmt::Result
{
    write!(f, "\n{}:", title)?;
    if items.is_empty() {
        return f.write_str(" none");
    }
    for item in items {
        write!(f, "\n    {}", item)?;
    }
    Ok(())
}

/// Everything that can go wrong while a mock handles an invocation
#[derive(Clone, Debug, Error)]
pub enum Fault {
    #[error(transparent)]
    Mock(#[from] MockError),
    /// The matched setup was configured to throw this value
    #[error("mock threw {0}")]
    Thrown(Value),
}

impl Fault {
    /// The engine error, if this is not a thrown value
    pub fn mock_error(&self) -> Option<&MockError> {
        match self {
            Fault::Mock(e) => Some(e),
            Fault::Thrown(_) => None
        }
    }

    pub fn thrown(&self) -> Option<&Value> {
        match self {
            Fault::Thrown(v) => Some(v),
            Fault::Mock(_) => None
        }
    }
}
