// vim: tw=80

use std::rc::Rc;

use crate::{
    expectation::Expectation,
    invocation::Invocation,
};

/// Failure policy for invocations that no setup handles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Behavior {
    /// Unhandled invocations return an empty default, or call the base
    #[default]
    Loose,
    /// Unhandled invocations fail immediately, and every setup is verified by
    /// [`verify_all`](crate::Mock::verify_all)
    Strict,
}

/// Everything a mock knows: its setups, in declaration order, and its
/// invocations, in the order they happened.
#[derive(Debug, Default)]
pub(crate) struct Context {
    pub(crate) expectations: Vec<Expectation>,
    pub(crate) invocations: Vec<Rc<Invocation>>,
    pub(crate) behavior: Behavior,
}

impl Context {
    pub(crate) fn new(behavior: Behavior) -> Self {
        Context { behavior, ..Default::default() }
    }

    pub(crate) fn add(&mut self, expectation: Expectation) -> usize {
        self.expectations.push(expectation);
        self.expectations.len() - 1
    }

    /// Forget every setup and invocation
    pub(crate) fn reset(&mut self) {
        self.expectations.clear();
        self.invocations.clear();
    }

    /// The oldest setup that accepts `inv`
    pub(crate) fn resolve(&self, inv: &Invocation) -> Option<usize> {
        self.expectations.iter().position(|e| e.matches(inv))
    }

    pub(crate) fn describe_setups(&self) -> Vec<String> {
        self.expectations.iter().map(ToString::to_string).collect()
    }

    pub(crate) fn describe_invocations(&self) -> Vec<String> {
        self.invocations.iter().map(ToString::to_string).collect()
    }
}
