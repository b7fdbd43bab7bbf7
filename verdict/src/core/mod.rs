//! Pure outcome algebra.
//!
//! No I/O lives here. [`value`] holds the dynamic payload model and
//! [`outcome`] the two-variant result type with its combinators.

pub mod outcome;
pub mod value;
