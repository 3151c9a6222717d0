//! Root of the `helpdesk-core` library: the data and session layer behind
//! the support dashboard.

// Library code reports through `tracing` and return values; front-ends own
// the terminal.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod list_controller;
pub mod list_query;
pub mod navigation;
pub mod notify;
pub mod route_guard;
pub mod session;
pub mod submission;
pub mod ticket_detail;
pub mod time_format;
pub mod transport;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use client::ApiClient;
pub use client::QueryState;
pub use client::Subscription;
pub use config::ClientConfig;
pub use config::ConfigLoader;
pub use error::ClientError;
pub use route_guard::GuardDecision;
pub use session::Session;
pub use session::SessionStore;
