// vim: tw=80
//! Call count and call order verification

use crate::{
    context::{Behavior, Context},
    error::{MockError, Reason},
    expectation::{Expectation, Pattern},
    invocation::Invocation,
    times::Times,
};

/// Check that the number of invocations accepted by `pattern` is within
/// `times`.
pub(crate) fn verify_call_count(name: &str, ctx: &Context, pattern: &Pattern,
                                times: Times) -> Result<(), MockError>
{
    let count = ctx.invocations.iter()
        .filter(|inv| pattern.matches(inv))
        .count();
    if times.verify(count) {
        return Ok(());
    }
    let s = if count == 1 { "" } else { "s" };
    let mut msg = format!("{}: expected {} {}, but it was invoked {} time{}",
        name, pattern, times, count, s);
    // Predicates can say why the latest near miss was rejected
    let near_miss = ctx.invocations.iter().rev().find(|inv| {
        inv.member() == pattern.member() &&
            inv.kind() == pattern.kind() &&
            !pattern.matches(inv)
    });
    if let Some(inv) = near_miss {
        for why in pattern.explain(inv) {
            msg.push_str(&format!("\nnearest invocation {}, {}", inv, why));
        }
    }
    debug_event!(mock = name, pattern = %pattern, %times, count,
        "call count verification failed");
    Err(MockError::new(Reason::CallCountVerificationFailed, msg)
        .subject(pattern)
        .context(ctx.describe_setups(), ctx.describe_invocations()))
}

/// Check the call count of every verifiable expectation, then the order of
/// the in-sequence ones.
pub(crate) fn verify_all(name: &str, ctx: &Context) -> Result<(), MockError> {
    let strict = ctx.behavior == Behavior::Strict;
    for e in ctx.expectations.iter().filter(|e| strict || e.is_verifiable()) {
        verify_call_count(name, ctx, e.pattern(), e.expected_times())?;
    }
    verify_order(name, ctx)
}

fn verify_order(name: &str, ctx: &Context) -> Result<(), MockError> {
    let ordered = ctx.expectations.iter()
        .filter(|e| e.is_in_sequence())
        .collect::<Vec<_>>();
    if ordered.is_empty() {
        return Ok(());
    }
    let actual = ctx.invocations.iter()
        .map(|inv| &**inv)
        .collect::<Vec<_>>();
    if fits(&ordered, &actual) {
        return Ok(());
    }
    let expected = ordered.iter()
        .map(|e| format!("{} {}", e.pattern(), e.expected_times()))
        .collect::<Vec<_>>()
        .join(", then ");
    debug_event!(mock = name, "call order verification failed");
    let msg = format!("{}: invocations did not occur in the order {}", name,
        expected);
    Err(MockError::new(Reason::CallOrderVerificationFailed, msg)
        .context(ctx.describe_setups(), ctx.describe_invocations()))
}

/// Can `actual` be split into consecutive runs, one per expectation in
/// `expected`, each as long as that expectation's call count allows and
/// consisting only of invocations it accepts?
///
/// Depth first search over the length of the first run.  No run may be longer
/// than the invocations that remain, so unbounded counts terminate.
fn fits(expected: &[&Expectation], actual: &[&Invocation]) -> bool {
    let Some((first, rest)) = expected.split_first() else {
        return actual.is_empty();
    };
    let times = first.expected_times();
    let longest = actual.iter()
        .take(times.max_within(actual.len()))
        .take_while(|inv| first.matches(inv))
        .count();
    (times.min()..=longest).any(|n| fits(rest, &actual[n..]))
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{
        invocation::Kind,
        matcher::{Matcher, it},
        value::Value,
    };

    fn expect(ctx: &mut Context, matcher: Matcher, times: Times) {
        let p = Pattern::new(Kind::Call, "f".to_owned(), vec![matcher], false);
        let i = ctx.expectations.len();
        let mut e = Expectation::new(p, i);
        e.times(times).in_sequence();
        ctx.add(e);
    }

    fn invoke(ctx: &mut Context, arg: i64) {
        let inv = Invocation::new(Kind::Call, "f", vec![Value::from(arg)]);
        ctx.invocations.push(inv.into());
    }

    fn ordered(ctx: &Context) -> bool {
        verify_order("m", ctx).is_ok()
    }

    #[test]
    fn empty_sequence_verifies() {
        let mut ctx = Context::default();
        invoke(&mut ctx, 1);
        assert!(ordered(&ctx));
    }

    #[test]
    fn in_order() {
        let mut ctx = Context::default();
        expect(&mut ctx, 1.into(), Times::once());
        expect(&mut ctx, 2.into(), Times::once());
        invoke(&mut ctx, 1);
        invoke(&mut ctx, 2);
        assert!(ordered(&ctx));
    }

    #[test]
    fn out_of_order() {
        let mut ctx = Context::default();
        expect(&mut ctx, 1.into(), Times::once());
        expect(&mut ctx, 2.into(), Times::once());
        invoke(&mut ctx, 2);
        invoke(&mut ctx, 1);
        let e = verify_order("m", &ctx).unwrap_err();
        assert_eq!(Reason::CallOrderVerificationFailed, e.reason());
    }

    #[test]
    fn unbounded_runs_backtrack() {
        let mut ctx = Context::default();
        expect(&mut ctx, it::is_any(), Times::at_least_once());
        expect(&mut ctx, 3.into(), Times::once());
        for i in [1, 2, 3] {
            invoke(&mut ctx, i);
        }
        assert!(ordered(&ctx));
    }

    #[test]
    fn runs_must_cover_every_invocation() {
        let mut ctx = Context::default();
        expect(&mut ctx, 1.into(), Times::once());
        invoke(&mut ctx, 1);
        invoke(&mut ctx, 1);
        assert!(!ordered(&ctx));
    }

    #[test]
    fn optional_run() {
        let mut ctx = Context::default();
        expect(&mut ctx, 1.into(), Times::once());
        expect(&mut ctx, 2.into(), Times::at_most_once());
        expect(&mut ctx, 3.into(), Times::once());
        invoke(&mut ctx, 1);
        invoke(&mut ctx, 3);
        assert!(ordered(&ctx));
    }

    #[test]
    fn count_message() {
        let mut ctx = Context::default();
        invoke(&mut ctx, 1);
        let p = Pattern::new(Kind::Call, "f".to_owned(),
            vec![it::is(|v| v.as_i64() == Some(2))], false);
        let e = verify_call_count("m", &ctx, &p, Times::once()).unwrap_err();
        assert_eq!(Reason::CallCountVerificationFailed, e.reason());
        assert!(e.message().starts_with("m: expected f("));
        assert!(e.message()
            .contains("exactly 1 time, but it was invoked 0 times"));
        assert!(e.message().contains("nearest invocation f(1)"));
        assert_eq!(vec!["f(1)".to_owned()], e.invocations());
    }

    #[test]
    fn strict_verifies_everything() {
        let mut ctx = Context::new(Behavior::Strict);
        let p = Pattern::new(Kind::Get, "p".to_owned(), vec![], false);
        ctx.add(Expectation::new(p, 0));
        assert!(verify_all("m", &ctx).is_err());
        ctx.behavior = Behavior::Loose;
        assert!(verify_all("m", &ctx).is_ok());
    }
}
