//! HTTP response implementation.
//!
//! This module writes HTTP/1.1 responses over a single connection. Every
//! response carries `Connection: close`; there is no keep-alive and no
//! chunked encoding.
//!
//! # Architecture
//!
//! - **`headers`**: Renders the header block, owns `Content-Length` and `Connection`
//! - **`mime`**: Content type inference from the request path suffix
//! - **`status`**: Status codes and the phrases used on error pages
//! - **`response`**: The streaming writer: outbound queue and its state machine
//! - **`file`**: Serves files from an ordered list of root directories
//! - **`error_page`**: Minimal HTML error pages and error to status mapping
//! - **`connection`**: Reads the request line of a client connection and answers it
//!
//! # Response State Machine
//!
//! Each response is driven by a task that only runs when the transport can
//! take more bytes:
//!
//! ```text
//!        ┌─────────────┐
//!        │    Idle     │ ← Nothing queued
//!        └──────┬──────┘
//!               │ Block queued
//!               ▼
//!        ┌──────────────────┐
//!        │     Writing      │ ← Send head of queue as the transport allows
//!        └──────┬───────────┘
//!               │ Queue empty
//!               ├─ Not complete → Idle
//!               ▼
//!        ┌──────────────────┐
//!        │    Draining      │ ← Flush
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │    Closing       │ ← Close the transport
//!        └──────┬───────────┘
//!               ▼
//!              Done            (also reached directly on a write error)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use outflow::http::headers::Headers;
//! use outflow::http::response::{Response, Transport};
//!
//! let response = Response::open(Transport::pollable(write_half), Some("/"));
//! response.serve_file(None, false, &roots).await;
//! response.finished().await;
//! ```

pub mod connection;
pub mod error_page;
pub mod file;
pub mod headers;
pub mod mime;
pub mod response;
pub mod status;
