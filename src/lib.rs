//! Outflow - streaming HTTP responses and static file serving
//!
//! Core library for writing HTTP/1.1 responses over non-blocking
//! connections, one response per connection.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod server;

pub use error::{Error, Result};
