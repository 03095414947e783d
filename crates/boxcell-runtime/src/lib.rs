//! # boxcell-runtime
//!
//! The container supervisor: creates the isolated child process, runs
//! the setup sequence inside it, execs the target command, and reports
//! the child's exit status to the caller.
//!
//! Exactly two OS-level execution contexts exist per run: the
//! controlling process and the isolated child. The controlling process
//! only blocks waiting for the child; the child performs a strictly
//! sequential series of kernel operations where every step depends on
//! the prior one.

mod child;
pub mod supervisor;

pub use supervisor::{ExitReport, run, run_with};
