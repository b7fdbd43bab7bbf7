//! Two-variant outcome algebra with a step-chain runner and a pattern matcher.
//!
//! - **[`core`]**: [`Outcome`](core::outcome::Outcome), its payload
//!   [`Value`](core::value::Value) and the combinators. Pure and deterministic.
//! - **[`chain`]**: runs an ordered list of `try`/`let` steps against a caller
//!   context, short-circuiting on the first Failure.
//! - **[`matcher`]**: first-match-wins dispatch over an outcome's tag and payload.
//! - **[`io`]**: scenario files and reply templates used by the CLI.
//!
//! [`scenario`] wires these together for `verdict run`.

pub mod chain;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod matcher;
pub mod scenario;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
