// vim: tw=80
//! A record/replay mock object engine.
//!
//! Decoy substitutes a test double for a real object, lets a test declare
//! expected interactions ("setups"), replays their configured behavior,
//! records every actual interaction, and afterwards verifies call counts and,
//! optionally, call order.
//!
//! # Usage
//!
//! There are two ways to use Decoy.  The easiest is [`#[mockable]`], which
//! generates a mock struct for a trait.  For everything else there is
//! [`Mock`] itself, whose members are addressed by name and whose arguments
//! and results are dynamically typed [`Value`]s.
//!
//! Whichever method is used, the basic idea is the same.
//! * Create a mock.  It is either loose (unmatched calls return an empty
//!   default) or strict (unmatched calls fail immediately).
//! * Declare setups.  Each setup captures exactly one member access, with a
//!   [`Matcher`] per argument, and a queue of behaviors.
//! * Supply the mock to the code under test.
//! * Verify, either one pattern at a time with [`Mock::verify`] or every
//!   verifiable setup at once with [`Mock::verify_all`].
//!
//! ## Getting started
//! ```
//! use decoy::*;
//!
//! #[mockable]
//! trait Doer {
//!     fn do_number(&self, x: i64) -> i64;
//! }
//!
//! fn call_with_four(x: &dyn Doer) -> i64 {
//!     x.do_number(4)
//! }
//!
//! let mock = MockDoer::new();
//! mock.setup(|x| x.do_number(it::is_any_number()))
//!     .unwrap()
//!     .returning(|args| args[0].as_i64().unwrap_or_default() + 1)
//!     .verifiable();
//! assert_eq!(5, call_with_four(&mock));
//! mock.verify_all().unwrap();
//! ```
//!
//! ## Dynamic mocks
//!
//! A bare [`Mock`] intercepts whatever it is asked to.  Setups are described
//! with a closure that performs a single access on a [`Recorder`].
//!
//! ```
//! use decoy::*;
//!
//! let mock = Mock::new();
//! mock.setup(|r| r.call("f", args![it::is_any(), 2])).unwrap().returns(7);
//!
//! assert_eq!(Value::from(7), mock.call("f", [9, 2]).unwrap());
//! assert!(mock.call("f", [9, 3]).unwrap().is_undefined());
//! mock.verify(|r| r.call("f", args![9, 3]), Times::once()).unwrap();
//! ```
//!
//! ## Matching
//!
//! Setups are resolved oldest first: when several setups accept the same
//! invocation, the one declared first is used.  Literal arguments are
//! compared by structural equality against a snapshot taken when the setup
//! was declared, so later mutation of the original argument does not affect
//! matching.  See [`it`] for the other matchers.
//!
//! ## Behaviors
//!
//! Every [`returns`](Expectation::returns),
//! [`returning`](Expectation::returning),
//! [`callback`](Expectation::callback), [`throws`](Expectation::throws) and
//! [`call_base`](Expectation::call_base) appends one behavior to the setup's
//! queue.  Each matching invocation consumes the next one.  A single behavior
//! is replayed forever.  When a queue of several behaviors runs dry, a loose
//! mock keeps replaying the last one while a strict mock fails the call.
//!
//! ## Expectation guards
//!
//! [`Mock::setup`] returns an [`ExpectationGuard`] that holds the mock's state
//! while the expectation is configured.  Configure it in one expression and
//! let the guard drop at the end of the statement.  Using the mock, or
//! declaring another setup, while a guard is still bound to a variable
//! panics.
//!
//! ```should_panic
//! use decoy::*;
//!
//! let mock = Mock::new();
//! let mut guard = mock.setup(|r| r.get("p")).unwrap();
//! guard.returns(1);
//! mock.get("p").unwrap();     // panics: `guard` is still alive
//! ```
//!
//! ## Sequences
//!
//! Setups marked [`in_sequence`](Expectation::in_sequence) must account for
//! the whole invocation history, in declaration order, each within its
//! [`Times`] range.
//!
//! ```
//! use decoy::*;
//!
//! let mock = Mock::new();
//! mock.setup(|r| r.call("f", args![1])).unwrap().once().in_sequence();
//! mock.setup(|r| r.call("f", args![2])).unwrap().once().in_sequence();
//! mock.call("f", [2]).unwrap();
//! mock.call("f", [1]).unwrap();
//!
//! let e = mock.verify_all().unwrap_err();
//! assert_eq!(Reason::CallOrderVerificationFailed, e.reason());
//! ```
//!
//! # Crate features
//!
//! * **tracing** - Emit [`tracing`](https://docs.rs/tracing) events from the
//!   interception pipeline and the verifier.  Enabled by default.
//!
//! [`#[mockable]`]: attr.mockable.html

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "tracing")] {
        macro_rules! debug_event {
            ($($arg:tt)*) => { ::tracing::debug!($($arg)*) }
        }
        macro_rules! trace_event {
            ($($arg:tt)*) => { ::tracing::trace!($($arg)*) }
        }
    } else {
        macro_rules! debug_event {
            ($($arg:tt)*) => {}
        }
        macro_rules! trace_event {
            ($($arg:tt)*) => {}
        }
    }
}

mod context;
mod convert;
mod error;
mod expectation;
mod invocation;
mod matcher;
mod mock;
mod pipeline;
mod recorder;
mod times;
mod value;
mod verify;

pub use decoy_derive::mockable;
pub use predicates::prelude::{Predicate, predicate};

pub use crate::{
    context::Behavior,
    convert::{ConversionError, FromValue},
    error::{Fault, MockError, Reason},
    expectation::{Expectation, Pattern},
    invocation::{Invocation, Kind},
    matcher::{Matcher, it},
    mock::{Dispatch, ExpectationGuard, Mock, MockBuilder, Reply},
    recorder::Recorder,
    times::Times,
    value::{Native, Object, TypeTag, Value},
};

/// Build a list of argument [`Matcher`]s.  Literals become exact-value
/// matchers.
///
/// # Examples
/// ```
/// # use decoy::*;
/// let mock = Mock::new();
/// mock.setup(|r| r.call("add", args![it::is_any_number(), 2])).unwrap();
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Matcher>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Matcher::from($arg)),+]
    };
}

/// Support code for the `#[mockable]` macro.  Not a public API.
#[doc(hidden)]
pub mod __private {
    use super::*;

    /// Convert the pipeline's reply into a mocked method's return type.
    /// Faults become panics, except thrown values that the return type can
    /// carry, like `Err(E)`.
    pub fn resolve<R: FromValue>(reply: Result<Reply, Fault>) -> R {
        match reply {
            Ok(Reply::Value(value)) => convert(value),
            Ok(Reply::Base) => absent(),
            Err(Fault::Thrown(thrown)) => {
                match R::from_thrown(thrown.clone()) {
                    Some(r) => r,
                    None => panic!("{}", Fault::Thrown(thrown))
                }
            },
            Err(Fault::Mock(e)) => panic!("{}", e)
        }
    }

    /// The empty default for a mocked method with no base implementation.
    pub fn absent<R: FromValue>() -> R {
        convert(Value::Undefined)
    }

    fn convert<R: FromValue>(value: Value) -> R {
        match R::from_value(value) {
            Ok(r) => r,
            Err(e) => panic!("{}", e)
        }
    }
}
