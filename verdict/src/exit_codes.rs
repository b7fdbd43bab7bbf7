//! Stable exit codes for verdict CLI commands.

use crate::error::NoMatchError;

/// The chain ended in Success and a clause matched, or the command succeeded.
pub const OK: i32 = 0;
/// Invalid scenario, contract error, I/O error or any other failure to run.
pub const INVALID: i32 = 1;
/// The chain finished but no clause matched its outcome.
pub const NO_MATCH: i32 = 2;
/// The chain ended in Failure and a clause handled it.
pub const FAILURE: i32 = 3;

/// Exit code for an error returned by a command.
pub fn for_error(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<NoMatchError>().is_some() {
        NO_MATCH
    } else {
        INVALID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::Outcome;
    use anyhow::{Context, anyhow};

    #[test]
    fn no_match_maps_to_its_own_code() {
        let err = anyhow::Error::new(NoMatchError {
            outcome: Outcome::success(1),
            clauses: 0,
        });
        assert_eq!(for_error(&err), NO_MATCH);
    }

    #[test]
    fn context_does_not_hide_no_match() {
        let err: anyhow::Result<()> = Err(anyhow::Error::new(NoMatchError {
            outcome: Outcome::failure("x"),
            clauses: 2,
        }));
        let err = err.context("run scenario.toml").expect_err("error");
        assert_eq!(for_error(&err), NO_MATCH);
    }

    #[test]
    fn everything_else_is_invalid() {
        assert_eq!(for_error(&anyhow!("boom")), INVALID);
    }
}
