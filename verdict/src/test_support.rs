//! Helpers for tests that need scenario files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Chain ends in `Success(6)`, matched by the first clause.
pub const SIX_SCENARIO: &str = r#"
[[steps]]
kind = "try"
op = "const"
value = 20

[[steps]]
kind = "try"
op = "div"
value = 4

[[steps]]
kind = "let"
op = "add"
value = 1

[[clauses]]
tag = "success"
literal = 6
reply = "exactly six"
"#;

/// Chain ends in a Failure carrying a division fault.
pub const DIVIDE_BY_ZERO_SCENARIO: &str = r#"
[options]
pretty = false

[[steps]]
kind = "try"
op = "const"
value = 1

[[steps]]
kind = "try"
op = "div"
value = 0

[[clauses]]
tag = "failure"
matches = "division by zero"
reply = "cannot divide: {{ value }}"
"#;

/// Chain ends in `Success(1)` but only a failure clause exists.
pub const UNMATCHED_SCENARIO: &str = r#"
[[steps]]
kind = "try"
op = "const"
value = 1

[[clauses]]
tag = "failure"
reply = "never"
"#;

/// Fails schema validation: `pow` is not a known op.
pub const INVALID_SCENARIO: &str = r#"
[[steps]]
kind = "try"
op = "pow"
value = 2
"#;

/// Temporary directory holding scenario files for one test.
pub struct ScenarioDir {
    dir: TempDir,
}

impl ScenarioDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` inside the directory and return its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write scenario");
        path
    }
}

impl Default for ScenarioDir {
    fn default() -> Self {
        Self::new()
    }
}
