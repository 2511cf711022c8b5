// detectgate: rate-limited gateway for AI-content detection backends.
//
// This is the library root. Requests pass through the throttle, then the
// provider gateway, which normalizes whatever the configured backend says
// into a stable verdict.

pub mod config;
pub mod detection;
pub mod error;
pub mod output;
pub mod report;
pub mod service;
pub mod throttle;
pub mod validate;

#[cfg(feature = "web")]
pub mod web;
