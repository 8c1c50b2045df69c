//! Support library for the pipegen CLI binary.
//!
//! Re-exports the command pipeline and logging setup so doctests and
//! integration tests can exercise them without forking a subprocess.

pub mod cli;
pub mod logging;
