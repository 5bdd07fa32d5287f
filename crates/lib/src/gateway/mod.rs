//! Gateway: HTTP server hosting the channel webhooks.
//!
//! Single port. `GET /` reports health; each configured channel is served under
//! `/webhooks/<channel name>/`.

mod server;

pub use server::{build_router, run_gateway};
