// vim: tw=80

use std::{
    cell::{Cell, Ref, RefCell, RefMut},
    fmt,
    ops::{Deref, DerefMut},
};

use crate::{
    context::{Behavior, Context},
    error::{Fault, MockError},
    expectation::Expectation,
    invocation::{Invocation, Kind},
    pipeline,
    recorder::Recorder,
    times::Times,
    value::Value,
    verify,
};

/// A real implementation that a mock may forward invocations to.
///
/// Implemented for closures, so a base is usually written inline.
///
/// # Examples
/// ```
/// # use decoy::*;
/// let mock = Mock::builder()
///     .base(|inv: &Invocation| -> Result<Value, Fault> {
///         Ok(Value::from(inv.args().len()))
///     }).build();
/// assert_eq!(Value::from(3), mock.call("f", [1, 2, 3]).unwrap());
/// ```
pub trait Dispatch {
    fn dispatch(&self, invocation: &Invocation) -> Result<Value, Fault>;
}

impl<F> Dispatch for F
    where F: Fn(&Invocation) -> Result<Value, Fault>
{
    fn dispatch(&self, invocation: &Invocation) -> Result<Value, Fault> {
        self(invocation)
    }
}

/// Outcome of a successfully handled invocation
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Value(Value),
    /// The invocation should be forwarded to a base implementation that the
    /// mock does not own.  Generated mocks handle this themselves.
    Base,
}

impl Reply {
    /// The replied value.  `Base` is `Undefined`.
    pub fn into_value(self) -> Value {
        match self {
            Reply::Value(v) => v,
            Reply::Base => Value::Undefined
        }
    }
}

/// Configures a [`Mock`] before building it.
///
/// # Examples
/// ```
/// # use decoy::*;
/// let mock = Mock::builder()
///     .name("clock")
///     .strict()
///     .build();
/// assert_eq!("clock", mock.name());
/// assert_eq!(Behavior::Strict, mock.behavior());
/// ```
#[derive(Default)]
pub struct MockBuilder {
    name: Option<String>,
    behavior: Behavior,
    call_base: Option<bool>,
    base: Option<Box<dyn Dispatch>>,
}

impl MockBuilder {
    /// Name the mock in diagnostics
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Shortcut for `behavior(Behavior::Strict)`
    pub fn strict(self) -> Self {
        self.behavior(Behavior::Strict)
    }

    /// Forward unhandled invocations to the base implementation.  Defaults to
    /// `true` when a base is supplied.
    pub fn call_base(mut self, call_base: bool) -> Self {
        self.call_base = Some(call_base);
        self
    }

    /// The real implementation behind the mock
    pub fn base<D: Dispatch + 'static>(mut self, base: D) -> Self {
        self.base = Some(Box::new(base));
        self
    }

    pub fn build(self) -> Mock {
        let call_base = self.call_base.unwrap_or(self.base.is_some());
        Mock {
            name: self.name.unwrap_or_else(|| "Mock".to_owned()),
            context: RefCell::new(Context::new(self.behavior)),
            call_base: Cell::new(call_base),
            base: self.base,
            depth: Cell::new(0),
        }
    }
}

/// A mock object whose members are addressed by name.
///
/// A `Mock` is meant for a single thread.  It records every invocation, and
/// answers each one from the oldest matching setup.
pub struct Mock {
    name: String,
    context: RefCell<Context>,
    call_base: Cell<bool>,
    base: Option<Box<dyn Dispatch>>,
    /// How many invocations of this mock are currently being handled
    depth: Cell<usize>,
}

impl Mock {
    /// A loose mock
    pub fn new() -> Self {
        Mock::builder().build()
    }

    /// A strict mock
    pub fn strict() -> Self {
        Mock::builder().strict().build()
    }

    pub fn with_behavior(behavior: Behavior) -> Self {
        Mock::builder().behavior(behavior).build()
    }

    /// A mock that calls `base` for every invocation it has no setup for
    pub fn of_instance<D: Dispatch + 'static>(base: D) -> Self {
        Mock::builder().base(base).build()
    }

    pub fn builder() -> MockBuilder {
        MockBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn behavior(&self) -> Behavior {
        self.context().behavior
    }

    /// Are unhandled invocations forwarded to the base implementation?
    pub fn call_base(&self) -> bool {
        self.call_base.get()
    }

    /// May be changed at any time.  Takes effect with the next invocation.
    pub fn set_call_base(&self, call_base: bool) {
        self.call_base.set(call_base);
    }

    /// Declare an expectation for the member access performed by
    /// `descriptor`.
    ///
    /// The returned guard borrows the mock.  It must be dropped before the
    /// mock is used again.
    ///
    /// # Panics
    ///
    /// If another `ExpectationGuard` of this mock is still alive.
    ///
    /// # Examples
    /// ```
    /// # use decoy::*;
    /// let mock = Mock::new();
    /// mock.setup(|r| r.call("next", args![]))
    ///     .unwrap()
    ///     .returns(1)
    ///     .returns(2);
    /// let none: [Value; 0] = [];
    /// assert_eq!(Value::from(1), mock.call("next", none.clone()).unwrap());
    /// assert_eq!(Value::from(2), mock.call("next", none.clone()).unwrap());
    /// assert_eq!(Value::from(2), mock.call("next", none).unwrap());
    /// ```
    pub fn setup<F>(&self, descriptor: F)
        -> Result<ExpectationGuard<'_>, MockError>
        where F: FnOnce(&Recorder)
    {
        let pattern = Recorder::record(descriptor)?;
        let mut guard = self.context_mut();
        let index = guard.expectations.len();
        let i = guard.add(Expectation::new(pattern, index));
        debug_event!(mock = %self.name,
            setup = %guard.expectations[i].pattern(), "expectation declared");
        Ok(ExpectationGuard { guard, i })
    }

    /// Check how many recorded invocations match the member access performed
    /// by `descriptor`.
    pub fn verify<F, T>(&self, descriptor: F, times: T) -> Result<(), MockError>
        where F: FnOnce(&Recorder),
              T: Into<Times>
    {
        let pattern = Recorder::record(descriptor)?;
        let ctx = self.context();
        verify::verify_call_count(&self.name, &ctx, &pattern, times.into())
    }

    /// Check every verifiable expectation, or every expectation at all if the
    /// mock is strict.  Then check that the in-sequence expectations were met
    /// in order.
    pub fn verify_all(&self) -> Result<(), MockError> {
        verify::verify_all(&self.name, &self.context())
    }

    /// [`verify_all`](#method.verify_all), then [`reset`](#method.reset).  A
    /// failed verification leaves the mock untouched.
    pub fn verify_and_reset(&self) -> Result<(), MockError> {
        self.verify_all()?;
        self.reset();
        Ok(())
    }

    /// Forget every expectation and every recorded invocation.  The mock's
    /// behavior is kept.
    pub fn reset(&self) {
        self.context_mut().reset();
        debug_event!(mock = %self.name, "reset");
    }

    /// Invoke a method
    pub fn call<S, I>(&self, member: S, args: I) -> Result<Value, Fault>
        where S: Into<String>,
              I: IntoIterator,
              I::Item: Into<Value>
    {
        let args = args.into_iter().map(Into::into).collect();
        self.intercept(Kind::Call, member, args).map(Reply::into_value)
    }

    /// Read a property
    pub fn get<S: Into<String>>(&self, member: S) -> Result<Value, Fault> {
        self.intercept(Kind::Get, member, Vec::new()).map(Reply::into_value)
    }

    /// Write a property
    pub fn set<S, V>(&self, member: S, value: V) -> Result<(), Fault>
        where S: Into<String>,
              V: Into<Value>
    {
        self.intercept(Kind::Set, member, vec![value.into()]).map(drop)
    }

    /// Run an invocation through the interception pipeline.  This is the
    /// entry point for code that exposes a mock under another interface.
    pub fn intercept<S: Into<String>>(&self, kind: Kind, member: S,
                                      args: Vec<Value>)
        -> Result<Reply, Fault>
    {
        pipeline::run(self, Invocation::new(kind, member, args))
    }

    /// Every invocation recorded so far, oldest first
    pub fn invocations(&self) -> Vec<Invocation> {
        self.context().invocations.iter()
            .map(|inv| Invocation::clone(inv))
            .collect()
    }

    /// # Panics
    ///
    /// If an `ExpectationGuard` of this mock is still alive
    pub(crate) fn context(&self) -> Ref<'_, Context> {
        match self.context.try_borrow() {
            Ok(ctx) => ctx,
            Err(_) => self.guard_alive()
        }
    }

    /// # Panics
    ///
    /// If an `ExpectationGuard` of this mock is still alive, or the context
    /// is otherwise in use
    pub(crate) fn context_mut(&self) -> RefMut<'_, Context> {
        match self.context.try_borrow_mut() {
            Ok(ctx) => ctx,
            Err(_) => self.guard_alive()
        }
    }

    fn guard_alive(&self) -> ! {
        panic!("{}: mock used while an ExpectationGuard is still alive.  Drop \
            the guard returned by setup before using the mock.", self.name)
    }

    pub(crate) fn depth(&self) -> &Cell<usize> {
        &self.depth
    }

    /// Forward to the stored base, if there is one
    pub(crate) fn delegate(&self, invocation: &Invocation)
        -> Option<Result<Value, Fault>>
    {
        self.base.as_ref().map(|base| base.dispatch(invocation))
    }
}

impl Default for Mock {
    fn default() -> Self {
        Mock::new()
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Mock");
        s.field("name", &self.name)
            .field("call_base", &self.call_base.get())
            .field("has_base", &self.base.is_some());
        match self.context.try_borrow() {
            Ok(ctx) => s.field("behavior", &ctx.behavior)
                .field("expectations", &ctx.expectations.len())
                .field("invocations", &ctx.invocations.len()),
            Err(_) => s.field("context", &"<borrowed>")
        };
        s.finish()
    }
}

/// Holds the mock while one of its expectations is being configured.
///
/// Dereferences to the [`Expectation`].
pub struct ExpectationGuard<'m> {
    guard: RefMut<'m, Context>,
    i: usize,
}

impl Deref for ExpectationGuard<'_> {
    type Target = Expectation;

    fn deref(&self) -> &Expectation {
        &self.guard.expectations[self.i]
    }
}

impl DerefMut for ExpectationGuard<'_> {
    fn deref_mut(&mut self) -> &mut Expectation {
        &mut self.guard.expectations[self.i]
    }
}

impl fmt::Debug for ExpectationGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExpectationGuard").field(&**self).finish()
    }
}
