//! Sequential chain runner.
//!
//! A [`Chain`] executes its steps strictly in order on the caller's thread,
//! threading each success payload into the next step and stopping at the
//! first failure. Two step kinds differ only in how errors are treated:
//!
//! - [`Step::Try`]: an `Err` from the body is captured as a failure whose
//!   payload is a [`Fault`].
//! - [`Step::Let`]: the body must produce an [`Outcome`]; an `Err` is returned
//!   from [`Chain::run`] untouched.
//!
//! Step bodies receive the caller's context as an explicit `&mut` argument,
//! which is how steps share dependencies or accumulate state.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::core::outcome::Outcome;
use crate::core::value::{Fault, Value};
use crate::error::{EmptyChainError, MissingInputError};

/// Work performed by a step, with or without the previous payload.
pub enum Body<'a, C, R> {
    /// Ignores the previous payload. Valid anywhere in a chain.
    Thunk(Box<dyn FnOnce(&mut C) -> R + 'a>),
    /// Receives the previous success payload. Invalid as the first step.
    Unary(Box<dyn FnOnce(&mut C, Value) -> R + 'a>),
}

impl<'a, C, R> Body<'a, C, R> {
    pub fn thunk(f: impl FnOnce(&mut C) -> R + 'a) -> Self {
        Body::Thunk(Box::new(f))
    }

    pub fn unary(f: impl FnOnce(&mut C, Value) -> R + 'a) -> Self {
        Body::Unary(Box::new(f))
    }

    pub fn arity(&self) -> usize {
        match self {
            Body::Thunk(_) => 0,
            Body::Unary(_) => 1,
        }
    }

    fn invoke(
        self,
        context: &mut C,
        input: Option<Value>,
        step: usize,
    ) -> Result<R, MissingInputError> {
        match (self, input) {
            (Body::Thunk(f), _) => Ok(f(context)),
            (Body::Unary(f), Some(input)) => Ok(f(context, input)),
            (Body::Unary(_), None) => Err(MissingInputError { step }),
        }
    }
}

pub type TryBody<'a, C> = Body<'a, C, Result<Value>>;
pub type LetBody<'a, C> = Body<'a, C, Result<Outcome>>;

/// One unit of work in a chain.
pub enum Step<'a, C> {
    /// Errors are captured as failures.
    Try(TryBody<'a, C>),
    /// Errors propagate out of the chain.
    Let(LetBody<'a, C>),
}

impl<C> Step<'_, C> {
    pub fn label(&self) -> &'static str {
        match self {
            Step::Try(_) => "try",
            Step::Let(_) => "let",
        }
    }
}

/// Ordered list of steps run against a context of type `C`.
pub struct Chain<'a, C> {
    steps: Vec<Step<'a, C>>,
}

impl<C> Default for Chain<'_, C> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<'a, C> Chain<'a, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step<'a, C>) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Add a `Try` step that ignores the previous payload.
    ///
    /// A plain return value is wrapped as a success; a returned [`Outcome`]
    /// is used as is.
    pub fn attempt<T: Into<Value>>(
        &mut self,
        f: impl FnOnce(&mut C) -> Result<T> + 'a,
    ) -> &mut Self {
        self.push(Step::Try(Body::thunk(move |context| f(context).map(Into::into))))
    }

    /// Add a `Try` step that receives the previous payload.
    pub fn attempt_with<T: Into<Value>>(
        &mut self,
        f: impl FnOnce(&mut C, Value) -> Result<T> + 'a,
    ) -> &mut Self {
        self.push(Step::Try(Body::unary(move |context, input| {
            f(context, input).map(Into::into)
        })))
    }

    /// Add a `Let` step that ignores the previous payload.
    pub fn bind(&mut self, f: impl FnOnce(&mut C) -> Result<Outcome> + 'a) -> &mut Self {
        self.push(Step::Let(Body::thunk(f)))
    }

    /// Add a `Let` step that receives the previous payload.
    pub fn bind_with(
        &mut self,
        f: impl FnOnce(&mut C, Value) -> Result<Outcome> + 'a,
    ) -> &mut Self {
        self.push(Step::Let(Body::unary(f)))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Execute the steps in order and return the final outcome.
    ///
    /// Errors:
    /// - [`EmptyChainError`] if there are no steps.
    /// - [`MissingInputError`] if the first step takes the previous payload.
    /// - Any error returned by a `Let` body, unmodified.
    #[instrument(skip_all, fields(steps = self.steps.len()))]
    pub fn run(self, context: &mut C) -> Result<Outcome> {
        if self.steps.is_empty() {
            return Err(EmptyChainError.into());
        }
        let total = self.steps.len();
        let mut running: Option<Outcome> = None;

        for (index, step) in self.steps.into_iter().enumerate() {
            let input = match running {
                Some(outcome) if outcome.is_failure() => {
                    debug!(step = index, skipped = total - index, "short-circuit on failure");
                    return Ok(outcome);
                }
                Some(outcome) => Some(outcome.into_value()),
                None => None,
            };

            debug!(step = index, kind = step.label(), "running step");
            let outcome = match step {
                Step::Try(body) => match body.invoke(context, input, index)? {
                    Ok(value) => Outcome::lift(value),
                    Err(err) => {
                        debug!(step = index, error = %err, "captured step error");
                        Outcome::failure(Fault::new(err))
                    }
                },
                Step::Let(body) => body.invoke(context, input, index)??,
            };
            running = Some(outcome);
        }

        running.ok_or_else(|| EmptyChainError.into())
    }
}

/// Declare a chain with `declare` and run it against `context`.
///
/// ```
/// use verdict::chain::attempt_all;
/// use verdict::core::outcome::Outcome;
///
/// let outcome = attempt_all(&mut (), |chain| {
///     chain
///         .attempt(|_| Ok(1))
///         .attempt_with(|_, prev| Ok(prev.as_i64().unwrap_or_default() + 1));
/// })
/// .unwrap();
/// assert_eq!(outcome, Outcome::success(2));
/// ```
pub fn attempt_all<'a, C>(
    context: &mut C,
    declare: impl FnOnce(&mut Chain<'a, C>),
) -> Result<Outcome> {
    let mut chain = Chain::new();
    declare(&mut chain);
    chain.run(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, bail};
    use std::fmt;

    #[derive(Debug)]
    struct Refused(&'static str);

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "refused: {}", self.0)
        }
    }

    impl std::error::Error for Refused {}

    #[test]
    fn threads_payloads_between_steps() {
        let outcome = attempt_all(&mut (), |chain| {
            chain
                .attempt(|_| Ok(2))
                .attempt_with(|_, v| Ok(v.as_i64().unwrap_or_default() * 10))
                .attempt_with(|_, v| Ok(format!("n={v}")));
        })
        .expect("run");
        assert_eq!(outcome, Outcome::success("n=20"));
    }

    #[test]
    fn try_step_captures_errors_and_stops() {
        let mut third_runs = 0;
        let outcome = attempt_all(&mut third_runs, |chain| {
            chain
                .attempt(|_| Ok(1))
                .attempt(|_| -> Result<i32> { bail!("boom") })
                .attempt(|runs| {
                    *runs += 1;
                    Ok(2)
                });
        })
        .expect("run");

        assert!(outcome.is_failure());
        let fault = outcome.value().as_fault().expect("fault payload");
        assert_eq!(fault.message(), "boom");
        assert_eq!(third_runs, 0);
    }

    #[test]
    fn try_step_returning_outcome_is_not_rewrapped() {
        let outcome = attempt_all(&mut (), |chain| {
            chain
                .attempt(|_| Ok(Outcome::success(1)))
                .attempt(|_| Ok(Outcome::failure("declined")));
        })
        .expect("run");
        assert_eq!(outcome, Outcome::failure("declined"));
    }

    #[test]
    fn let_step_errors_propagate_unmodified() {
        let err = attempt_all(&mut (), |chain| {
            chain
                .attempt(|_| Ok(1))
                .bind(|_| Err(Refused("quota").into()));
        })
        .expect_err("let error escapes");
        let refused = err.downcast_ref::<Refused>().expect("original error type");
        assert_eq!(refused.0, "quota");
    }

    #[test]
    fn let_step_outcome_is_used_as_is() {
        let outcome = attempt_all(&mut (), |chain| {
            chain
                .attempt(|_| Ok(3))
                .bind_with(|_, v| Ok(Outcome::failure(v)));
        })
        .expect("run");
        assert_eq!(outcome, Outcome::failure(3));
    }

    #[test]
    fn let_step_after_failure_is_skipped() {
        let mut ran = false;
        let outcome = attempt_all(&mut ran, |chain| {
            chain
                .attempt(|_| -> Result<i32> { Err(anyhow!("first")) })
                .bind(|ran| {
                    *ran = true;
                    Err(anyhow!("never"))
                });
        })
        .expect("short-circuit before the let step");
        assert!(outcome.is_failure());
        assert!(!ran);
    }

    #[test]
    fn empty_chain_is_a_contract_error() {
        let err = Chain::<()>::new().run(&mut ()).expect_err("empty");
        assert!(err.downcast_ref::<EmptyChainError>().is_some());
    }

    #[test]
    fn unary_first_step_is_a_contract_error() {
        for step in [
            Step::Try(Body::unary(|_: &mut (), v| Ok(v))),
            Step::Let(Body::unary(|_: &mut (), v| Ok(Outcome::success(v)))),
        ] {
            let mut chain = Chain::new();
            chain.push(step);
            let err = chain.run(&mut ()).expect_err("missing input");
            assert_eq!(
                err.downcast_ref::<MissingInputError>(),
                Some(&MissingInputError { step: 0 })
            );
        }
    }

    #[test]
    fn context_changes_are_visible_after_the_run() {
        let mut log: Vec<String> = Vec::new();
        let outcome = attempt_all(&mut log, |chain| {
            chain
                .attempt(|log| {
                    log.push("load".to_string());
                    Ok("config")
                })
                .attempt_with(|log, v| {
                    log.push(format!("parse {v}"));
                    Ok(v)
                });
        })
        .expect("run");
        assert_eq!(outcome, Outcome::success("config"));
        assert_eq!(log, vec!["load".to_string(), "parse config".to_string()]);
    }

    #[test]
    fn thunk_after_first_step_ignores_payload() {
        let outcome = attempt_all(&mut (), |chain| {
            chain.attempt(|_| Ok(1)).attempt(|_| Ok("fresh"));
        })
        .expect("run");
        assert_eq!(outcome, Outcome::success("fresh"));
    }

    #[test]
    fn body_arity_reports_shape() {
        let thunk: TryBody<'_, ()> = Body::thunk(|_| Ok(Value::Nil));
        let unary: TryBody<'_, ()> = Body::unary(|_, v| Ok(v));
        assert_eq!(thunk.arity(), 0);
        assert_eq!(unary.arity(), 1);
    }
}
