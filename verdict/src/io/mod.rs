//! I/O helpers for the scenario CLI.

pub mod reply;
pub mod scenario;
