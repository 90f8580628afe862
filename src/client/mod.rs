//! The client library: connect, a background listener task, and per-request
//! futures keyed by correlation id.

mod client;
mod session;

pub use client::Client;
