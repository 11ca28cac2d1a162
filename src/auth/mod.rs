//! Authentication capability.
//!
//! Validating credentials is left to an [`Auth`] implementation. The
//! response layer only needs the outcome: credentials on success, or an
//! [`Error`] that maps onto an HTTP status via
//! [`status_for_error`](crate::http::error_page::status_for_error).

pub mod mock;

use std::collections::HashMap;
use std::future::Future;

use bytes::Bytes;

use crate::error::{Error, Result};

pub use mock::MockAuth;

/// Validated credentials for a logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: Bytes,
    /// Address of the peer that logged in.
    pub remote_peer: String,
}

/// Validates client credentials.
pub trait Auth {
    /// Attempts one login.
    ///
    /// `headers` are the request headers, `input` is the credential blob
    /// sent by the client and `remote_peer` the client's address.
    fn login(
        &self,
        headers: &HashMap<String, String>,
        input: Bytes,
        remote_peer: &str,
    ) -> impl Future<Output = Result<Credentials>> + Send;
}

/// Splits a `user\npassword` login blob.
pub fn parse_login_input(input: &Bytes) -> Result<(String, Bytes)> {
    let newline = input
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| Error::InvalidData("Authentication failed: no password".to_string()))?;

    let user = std::str::from_utf8(&input[..newline])
        .map_err(|_| Error::InvalidData("Authentication failed: invalid user".to_string()))?;

    Ok((user.to_string(), input.slice(newline + 1..)))
}
