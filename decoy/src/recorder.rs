// vim: tw=80

use std::cell::RefCell;

use crate::{
    error::{MockError, Reason},
    expectation::Pattern,
    invocation::Kind,
    matcher::Matcher,
};

/// Captures the member access performed by a setup or verify descriptor.
///
/// A descriptor is a closure that must access exactly one member of the
/// recorder.
///
/// # Examples
/// ```
/// # use decoy::*;
/// let mock = Mock::new();
/// mock.setup(|r| r.get("size")).unwrap().returns(3);
/// mock.setup(|r| r.set("size", it::is_any_number())).unwrap();
/// mock.setup(|r| r.call_prefix("log", args!["warn"])).unwrap();
/// assert_eq!(Value::from(3), mock.get("size").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct Recorder {
    captured: RefCell<Vec<Pattern>>,
}

impl Recorder {
    /// A method call.  Exactly as many arguments as there are matchers are
    /// accepted.
    pub fn call<S, I, M>(&self, member: S, args: I)
        where S: Into<String>,
              I: IntoIterator<Item = M>,
              M: Into<Matcher>
    {
        self.capture(Kind::Call, member.into(), args, false)
    }

    /// A method call constraining only the leading arguments.  Any further
    /// arguments are accepted.
    pub fn call_prefix<S, I, M>(&self, member: S, args: I)
        where S: Into<String>,
              I: IntoIterator<Item = M>,
              M: Into<Matcher>
    {
        self.capture(Kind::Call, member.into(), args, true)
    }

    /// A property read
    pub fn get<S: Into<String>>(&self, member: S) {
        self.capture(Kind::Get, member.into(), Vec::<Matcher>::new(), false)
    }

    /// A property write of a value accepted by `value`
    pub fn set<S, M>(&self, member: S, value: M)
        where S: Into<String>,
              M: Into<Matcher>
    {
        self.capture(Kind::Set, member.into(), [value], false)
    }

    fn capture<I, M>(&self, kind: Kind, member: String, args: I,
                     ignore_trailing: bool)
        where I: IntoIterator<Item = M>,
              M: Into<Matcher>
    {
        let matchers = args.into_iter().map(Into::into).collect();
        self.captured.borrow_mut()
            .push(Pattern::new(kind, member, matchers, ignore_trailing));
    }

    /// Run `descriptor` and return the single pattern it accessed.
    pub(crate) fn record<F>(descriptor: F) -> Result<Pattern, MockError>
        where F: FnOnce(&Recorder)
    {
        let recorder = Recorder::default();
        descriptor(&recorder);
        let mut captured = recorder.captured.into_inner();
        match captured.len() {
            0 => Err(MockError::new(Reason::InvalidSetupExpression,
                "the setup expression did not access any member")),
            1 => Ok(captured.remove(0)),
            n => {
                let accessed = captured.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                let msg = format!(
                    "the setup expression accessed {} members: {}", n,
                    accessed);
                Err(MockError::new(Reason::MoreThanOneSetupExpression, msg))
            }
        }
    }
}
