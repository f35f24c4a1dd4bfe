//! Authentication service HTTP layer.
//!
//! Exposed as a library so integration tests can assemble the router with
//! alternative backing stores; the `gh_server` binary wires the production
//! stack in `main.rs`.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
