//! vsdl-affine: run commands against a thread-affine resource.
//!
//! Native APIs such as SDL keep thread-local state and are only valid on the
//! OS thread that initialized them. [`AffineExecutor`] owns that thread:
//! - Any thread may submit commands, blocking or fire-and-forget
//! - Commands run one at a time, strictly in submission order
//! - The resource state is created, used and dropped on the worker thread

mod error;
mod executor;

pub use error::ExecError;
pub use executor::{AffineExecutor, Builder, ReportHook, Severity};
