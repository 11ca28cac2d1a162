use std::collections::HashMap;

use bytes::Bytes;
use tracing::debug;

use crate::auth::{parse_login_input, Auth, Credentials};
use crate::error::{Error, Result};

/// Accepts exactly one user and password. Used by tests and demos.
#[derive(Debug, Clone)]
pub struct MockAuth {
    expect_user: String,
    expect_password: String,
}

impl MockAuth {
    pub fn new(expect_user: impl Into<String>, expect_password: impl Into<String>) -> Self {
        Self {
            expect_user: expect_user.into(),
            expect_password: expect_password.into(),
        }
    }
}

impl Auth for MockAuth {
    async fn login(
        &self,
        _headers: &HashMap<String, String>,
        input: Bytes,
        remote_peer: &str,
    ) -> Result<Credentials> {
        let (user, password) = parse_login_input(&input)?;

        if user != self.expect_user || password.as_ref() != self.expect_password.as_bytes() {
            debug!(user = %user, remote_peer, "mock login rejected");
            return Err(Error::AuthenticationFailed);
        }

        Ok(Credentials {
            user,
            password,
            remote_peer: remote_peer.to_string(),
        })
    }
}
