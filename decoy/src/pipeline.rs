// vim: tw=80
//! The interception pipeline: a fixed chain of strategies run once per
//! invocation.
//!
//! No borrow of the mock's context is held while user code runs, whether a
//! value factory, a callback, or a base implementation.  That code may
//! therefore invoke the mock again; the nested invocation is recorded and
//! handled like any other.

use std::rc::Rc;

use crate::{
    context::Behavior,
    error::{Fault, MockError, Reason},
    expectation::{Action, Next},
    invocation::Invocation,
    mock::{Mock, Reply},
    value::Value,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// State of one invocation as it passes through the pipeline
pub(crate) struct CallState {
    invocation: Rc<Invocation>,
    /// Index of the expectation that handles the invocation
    resolved: Option<usize>,
    reply: Option<Result<Reply, Fault>>,
}

pub(crate) trait Strategy {
    fn handle(&self, mock: &Mock, state: &mut CallState) -> Flow;
}

/// Appends the invocation to the mock's history, matched or not
struct RecordInvocation;

/// Selects the oldest expectation accepting the invocation
struct ResolveExpectation;

/// Runs the next behavior of the resolved expectation.  Fails the
/// invocation if a strict mock has nothing to run.
struct ExecuteAction;

/// Answers an invocation that no expectation handled
struct InvokeBase;

/// Supplies the empty default if nothing else answered
struct GuardRecursion;

const STRATEGIES: [&dyn Strategy; 5] = [
    &RecordInvocation,
    &ResolveExpectation,
    &ExecuteAction,
    &InvokeBase,
    &GuardRecursion,
];

/// Tracks the nesting of invocations on one mock
struct Depth<'a>(&'a Mock);

impl<'a> Depth<'a> {
    fn enter(mock: &'a Mock) -> Self {
        let depth = mock.depth();
        depth.set(depth.get() + 1);
        Depth(mock)
    }
}

impl Drop for Depth<'_> {
    fn drop(&mut self) {
        let depth = self.0.depth();
        depth.set(depth.get() - 1);
    }
}

pub(crate) fn run(mock: &Mock, invocation: Invocation)
    -> Result<Reply, Fault>
{
    let _depth = Depth::enter(mock);
    let mut state = CallState {
        invocation: Rc::new(invocation),
        resolved: None,
        reply: None,
    };
    for strategy in STRATEGIES {
        if strategy.handle(mock, &mut state) == Flow::Stop {
            break;
        }
    }
    state.reply.unwrap_or(Ok(Reply::Value(Value::Undefined)))
}

impl Strategy for RecordInvocation {
    fn handle(&self, mock: &Mock, state: &mut CallState) -> Flow {
        debug_event!(mock = mock.name(), invocation = %state.invocation,
            position = state.invocation.position(), "invocation recorded");
        mock.context_mut()
            .invocations
            .push(Rc::clone(&state.invocation));
        Flow::Continue
    }
}

impl Strategy for ResolveExpectation {
    fn handle(&self, mock: &Mock, state: &mut CallState) -> Flow {
        state.resolved = mock.context().resolve(&state.invocation);
        trace_event!(mock = mock.name(), invocation = %state.invocation,
            resolved = ?state.resolved, "resolution");
        Flow::Continue
    }
}

impl Strategy for ExecuteAction {
    fn handle(&self, mock: &Mock, state: &mut CallState) -> Flow {
        let Some(i) = state.resolved else {
            if mock.behavior() == Behavior::Strict {
                debug_event!(mock = mock.name(), invocation = %state.invocation,
                    "no setup for invocation on strict mock");
                let msg = format!("{}: no setup handles {}", mock.name(),
                    state.invocation);
                state.reply = Some(Err(failure(mock, state, msg).into()));
                return Flow::Stop;
            }
            return Flow::Continue;
        };
        let next = {
            let mut ctx = mock.context_mut();
            let behavior = ctx.behavior;
            match ctx.expectations.get_mut(i) {
                Some(e) => e.next_action(behavior),
                None => Next::Empty
            }
        };
        trace_event!(mock = mock.name(), expectation = i, next = ?next,
            "executing");
        let reply = match next {
            Next::Empty => Ok(Reply::Value(Value::Undefined)),
            Next::Exhausted => {
                let msg = format!("{}: every behavior set up for {} has \
                    already been used", mock.name(), state.invocation);
                Err(failure(mock, state, msg).into())
            },
            Next::Act(action) => perform(mock, action, &state.invocation)
        };
        state.reply = Some(reply);
        Flow::Stop
    }
}

impl Strategy for InvokeBase {
    fn handle(&self, mock: &Mock, state: &mut CallState) -> Flow {
        if state.reply.is_some() {
            return Flow::Continue;
        }
        if mock.call_base() {
            trace_event!(mock = mock.name(), "calling base");
            state.reply = Some(call_base(mock, &state.invocation));
        }
        Flow::Continue
    }
}

impl Strategy for GuardRecursion {
    fn handle(&self, mock: &Mock, state: &mut CallState) -> Flow {
        if mock.depth().get() > 1 {
            trace_event!(mock = mock.name(), depth = mock.depth().get(),
                "nested invocation handled");
        }
        state.reply.get_or_insert(Ok(Reply::Value(Value::Undefined)));
        Flow::Stop
    }
}

fn perform(mock: &Mock, action: Action, invocation: &Invocation)
    -> Result<Reply, Fault>
{
    match action {
        Action::Return(value) => Ok(Reply::Value(value)),
        Action::Returning(producer) => {
            let value = (&mut *producer.borrow_mut())(invocation.args());
            Ok(Reply::Value(value))
        },
        Action::Callback(effect) => {
            (&mut *effect.borrow_mut())(invocation.args());
            Ok(Reply::Value(Value::Undefined))
        },
        Action::Throw(value) => Err(Fault::Thrown(value)),
        Action::CallBase => call_base(mock, invocation),
    }
}

fn call_base(mock: &Mock, invocation: &Invocation) -> Result<Reply, Fault> {
    match mock.delegate(invocation) {
        Some(result) => result.map(Reply::Value),
        None => Ok(Reply::Base)
    }
}

fn failure(mock: &Mock, state: &CallState, msg: String) -> MockError {
    let ctx = mock.context();
    MockError::new(Reason::NoSetup, msg)
        .subject(&state.invocation)
        .context(ctx.describe_setups(), ctx.describe_invocations())
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{invocation::Kind, matcher::it};

    #[test]
    fn nested_invocations_are_recorded() {
        let mock = Rc::new(Mock::new());
        let inner = Rc::downgrade(&mock);
        mock.setup(|r| r.call("outer", [it::is_any()]))
            .unwrap()
            .returning(move |args| {
                let mock = inner.upgrade().unwrap();
                mock.call("inner", [args[0].clone()]).unwrap();
                let recorded = mock.invocations();
                recorded.len()
            });
        let v = mock.call("outer", [1]).unwrap();
        assert_eq!(Value::from(2), v);
        assert_eq!(0, mock.depth().get());
    }

    #[test]
    fn strict_unmatched_is_recorded() {
        let mock = Mock::strict();
        let e = mock.call("f", [1]).unwrap_err();
        assert_eq!(Reason::NoSetup, e.mock_error().unwrap().reason());
        assert_eq!(1, mock.invocations().len());
    }

    #[test]
    fn base_reply_without_stored_base() {
        let mock = Mock::builder().call_base(true).build();
        let r = mock.intercept(Kind::Call, "f", vec![]).unwrap();
        assert_eq!(Reply::Base, r);
    }

    #[test]
    fn empty_queue_yields_undefined() {
        let mock = Mock::builder().call_base(true).build();
        mock.setup(|r| r.get("p")).unwrap();
        let r = mock.intercept(Kind::Get, "p", vec![]).unwrap();
        assert_eq!(Reply::Value(Value::Undefined), r);
    }
}
