//! Startup and shutdown orchestration.
//!
//! # Responsibilities
//! - Drive the bootstrap phase machine to Serving
//! - Provision the certificate bundle before any listener accepts
//! - Bind listeners last (traffic only when ready)
//! - Fail fast: any error before Serving is fatal for the process

pub mod shutdown;
pub mod startup;

pub use startup::{run, serve, Phase};
