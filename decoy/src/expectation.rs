// vim: tw=80

use std::{
    cell::RefCell,
    fmt,
    rc::Rc,
};

use crate::{
    context::Behavior,
    invocation::{Invocation, Kind},
    matcher::Matcher,
    times::Times,
    value::Value,
};

/// The shape of a member access, captured from a setup descriptor.
#[derive(Debug)]
pub struct Pattern {
    kind: Kind,
    member: String,
    matchers: Vec<Matcher>,
    /// Only the leading arguments are constrained
    ignore_trailing: bool,
}

impl Pattern {
    pub(crate) fn new(kind: Kind, member: String, matchers: Vec<Matcher>,
                      ignore_trailing: bool) -> Self
    {
        Pattern { kind, member, matchers, ignore_trailing }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Does `inv` access the same member, with acceptable arguments?
    pub fn matches(&self, inv: &Invocation) -> bool {
        let args = inv.args();
        let arity_ok = if self.ignore_trailing {
            args.len() >= self.matchers.len()
        } else {
            args.len() == self.matchers.len()
        };
        self.kind == inv.kind() &&
            self.member == inv.member() &&
            arity_ok &&
            self.matchers.iter().zip(args).all(|(m, a)| m.matches(a))
    }

    /// Explanations from any predicate matchers that reject `inv`'s
    /// arguments
    pub(crate) fn explain(&self, inv: &Invocation) -> Vec<String> {
        self.matchers.iter()
            .zip(inv.args())
            .enumerate()
            .filter_map(|(i, (m, a))| {
                m.explain(a).map(|tree| format!("argument {}: {}", i, tree))
            }).collect()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Get => f.write_str(&self.member),
            Kind::Set => match self.matchers.first() {
                Some(m) => write!(f, "{} = {}", self.member, m),
                None => write!(f, "{} = is_any()", self.member),
            },
            Kind::Call => {
                write!(f, "{}(", self.member)?;
                for (i, m) in self.matchers.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                if self.ignore_trailing {
                    if !self.matchers.is_empty() {
                        f.write_str(", ")?;
                    }
                    f.write_str("..")?;
                }
                f.write_str(")")
            }
        }
    }
}

type Producer = Rc<RefCell<dyn FnMut(&[Value]) -> Value>>;
type SideEffect = Rc<RefCell<dyn FnMut(&[Value])>>;

/// One entry of an expectation's behavior queue
#[derive(Clone)]
pub(crate) enum Action {
    Return(Value),
    Returning(Producer),
    Callback(SideEffect),
    Throw(Value),
    CallBase,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Return(v) => write!(f, "Return({})", v),
            Action::Returning(_) => f.write_str("Returning(..)"),
            Action::Callback(_) => f.write_str("Callback(..)"),
            Action::Throw(v) => write!(f, "Throw({})", v),
            Action::CallBase => f.write_str("CallBase"),
        }
    }
}

/// What the behavior queue has to offer for the next matching invocation
#[derive(Debug)]
pub(crate) enum Next {
    Act(Action),
    /// No behaviors were ever configured
    Empty,
    /// A strict mock ran through every configured behavior
    Exhausted,
}

/// A declared interaction: a [`Pattern`], a queue of behaviors, and
/// verification requirements.
///
/// Obtained from [`Mock::setup`](crate::Mock::setup).  Every builder method
/// may be chained in any order.
#[derive(Debug)]
pub struct Expectation {
    pattern: Pattern,
    actions: Vec<Action>,
    /// How many actions have been consumed
    cursor: usize,
    times: Option<Times>,
    verifiable: bool,
    in_sequence: bool,
    index: usize,
}

impl Expectation {
    pub(crate) fn new(pattern: Pattern, index: usize) -> Self {
        Expectation {
            pattern,
            actions: Vec::new(),
            cursor: 0,
            times: None,
            verifiable: false,
            in_sequence: false,
            index,
        }
    }

    /// Return a fixed value
    pub fn returns<V: Into<Value>>(&mut self, value: V) -> &mut Self {
        self.actions.push(Action::Return(value.into()));
        self
    }

    /// Compute the return value from the invocation's arguments
    pub fn returning<F, R>(&mut self, mut f: F) -> &mut Self
        where F: FnMut(&[Value]) -> R + 'static,
              R: Into<Value>
    {
        let producer: Producer = Rc::new(RefCell::new(
            move |args: &[Value]| -> Value { f(args).into() }
        ));
        self.actions.push(Action::Returning(producer));
        self
    }

    /// Run a side effect with the invocation's arguments.  The call returns
    /// `Undefined`.
    pub fn callback<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(&[Value]) + 'static
    {
        self.actions.push(Action::Callback(Rc::new(RefCell::new(f))));
        self
    }

    /// Fail the invocation with `value`
    pub fn throws<V: Into<Value>>(&mut self, value: V) -> &mut Self {
        self.actions.push(Action::Throw(value.into()));
        self
    }

    /// Forward the invocation to the mock's base implementation
    pub fn call_base(&mut self) -> &mut Self {
        self.actions.push(Action::CallBase);
        self
    }

    /// Include this expectation in [`verify_all`](crate::Mock::verify_all).
    /// Unless otherwise specified, it must be met at least once.
    pub fn verifiable(&mut self) -> &mut Self {
        self.verifiable = true;
        self
    }

    /// Require this expectation to be met a number of times within a range.
    /// Implies [`verifiable`](#method.verifiable).
    pub fn times<T: Into<Times>>(&mut self, times: T) -> &mut Self {
        self.times = Some(times.into());
        self.verifiable()
    }

    /// Shortcut for [`times(Times::once())`](#method.times)
    pub fn once(&mut self) -> &mut Self {
        self.times(Times::once())
    }

    /// Forbid this expectation from ever being met
    pub fn never(&mut self) -> &mut Self {
        self.times(Times::never())
    }

    /// Require this expectation to take its turn, in declaration order, among
    /// all other in-sequence expectations.  Implies
    /// [`verifiable`](#method.verifiable).
    pub fn in_sequence(&mut self) -> &mut Self {
        self.in_sequence = true;
        self.verifiable()
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Required number of invocations.  Defaults to at least once.
    pub fn expected_times(&self) -> Times {
        self.times.unwrap_or_else(Times::at_least_once)
    }

    pub fn is_verifiable(&self) -> bool {
        self.verifiable
    }

    pub fn is_in_sequence(&self) -> bool {
        self.in_sequence
    }

    /// Position of this expectation among its mock's setups
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn matches(&self, inv: &Invocation) -> bool {
        self.pattern.matches(inv)
    }

    /// Advance the behavior queue.  The cursor saturates at the last action,
    /// which is replayed unless the queue held several actions and the mock
    /// is strict.
    pub(crate) fn next_action(&mut self, behavior: Behavior) -> Next {
        let len = self.actions.len();
        if len == 0 {
            return Next::Empty;
        }
        if self.cursor < len {
            self.cursor += 1;
            return Next::Act(self.actions[self.cursor - 1].clone());
        }
        if len == 1 || behavior == Behavior::Loose {
            Next::Act(self.actions[len - 1].clone())
        } else {
            Next::Exhausted
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)?;
        if self.verifiable {
            write!(f, " expected {}", self.expected_times())?;
        }
        if self.in_sequence {
            f.write_str(" in sequence")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::matcher::it;

    fn call(member: &str, args: Vec<Value>) -> Invocation {
        Invocation::new(Kind::Call, member, args)
    }

    fn pattern(matchers: Vec<Matcher>, ignore_trailing: bool) -> Pattern {
        Pattern::new(Kind::Call, "f".to_owned(), matchers, ignore_trailing)
    }

    fn returned(next: Next) -> Option<Value> {
        match next {
            Next::Act(Action::Return(v)) => Some(v),
            _ => None
        }
    }

    #[test]
    fn arity_must_match() {
        let p = pattern(vec![Matcher::from(1)], false);
        assert!(p.matches(&call("f", vec![1.into()])));
        assert!(!p.matches(&call("f", vec![1.into(), 2.into()])));
        assert!(!p.matches(&call("f", vec![])));
        assert!(!p.matches(&call("g", vec![1.into()])));
    }

    #[test]
    fn ignore_trailing() {
        let p = pattern(vec![Matcher::from(1)], true);
        assert!(p.matches(&call("f", vec![1.into(), 2.into()])));
        assert!(!p.matches(&call("f", vec![])));
        assert_eq!("f(1, ..)", p.to_string());
    }

    #[test]
    fn kind_must_match() {
        let p = Pattern::new(Kind::Get, "f".to_owned(), vec![], false);
        assert!(!p.matches(&call("f", vec![])));
        assert!(p.matches(&Invocation::new(Kind::Get, "f", vec![])));
    }

    #[test]
    fn explain() {
        let p = pattern(vec![it::is_any(), it::is(|v| v.is_null())], false);
        let why = p.explain(&call("f", vec![1.into(), 2.into()]));
        assert_eq!(1, why.len());
        assert!(why[0].starts_with("argument 1: "));
    }

    #[test]
    fn single_action_replays() {
        let mut e = Expectation::new(pattern(vec![], false), 0);
        e.returns(5);
        for _ in 0..3 {
            let v = returned(e.next_action(Behavior::Strict));
            assert_eq!(Some(Value::from(5)), v);
        }
    }

    #[test]
    fn loose_queue_saturates() {
        let mut e = Expectation::new(pattern(vec![], false), 0);
        e.returns(0).returns(1);
        let got: Vec<_> = (0..4)
            .map(|_| returned(e.next_action(Behavior::Loose)))
            .collect();
        let expected: Vec<_> = [0, 1, 1, 1].into_iter()
            .map(|i| Some(Value::from(i)))
            .collect();
        assert_eq!(expected, got);
    }

    #[test]
    fn strict_queue_exhausts() {
        let mut e = Expectation::new(pattern(vec![], false), 0);
        e.returns(0).returns(1);
        e.next_action(Behavior::Strict);
        e.next_action(Behavior::Strict);
        assert!(matches!(e.next_action(Behavior::Strict), Next::Exhausted));
    }

    #[test]
    fn empty_queue() {
        let mut e = Expectation::new(pattern(vec![], false), 0);
        assert!(matches!(e.next_action(Behavior::Strict), Next::Empty));
    }

    #[test]
    fn times_implies_verifiable() {
        let mut e = Expectation::new(pattern(vec![], false), 0);
        assert!(!e.is_verifiable());
        assert_eq!(Times::at_least_once(), e.expected_times());
        e.times(2..=3);
        assert!(e.is_verifiable());
        assert_eq!(Times::between(2, 3), e.expected_times());
    }
}
