//! HTTP route surface.
//!
//! Pass-through glue with no contract beyond status codes: an index page
//! echoing the environment, five fixed outbound proxy routes, and a
//! plaintext 404 fallback. Served identically on both listeners.

pub mod server;

pub use server::{build_router, AppState};
