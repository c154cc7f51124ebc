//! Username/password check guarding credential issuance.
//!
//! Users come from a static allow-list loaded at startup and all share one
//! secret. This is deliberately the simplest possible login; the one-time
//! credential it unlocks is what the WebSocket gateway actually trusts.

use super::error::AuthError;
use crate::config::SecurityConfig;
use std::collections::HashSet;
use subtle::ConstantTimeEq;

/// Constant-time secret comparison to prevent timing attacks.
fn secrets_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

pub struct Authenticator {
    allowed_users: HashSet<String>,
    shared_secret: String,
}

impl Authenticator {
    pub fn new<I, S>(allowed_users: I, shared_secret: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_users: allowed_users.into_iter().map(Into::into).collect(),
            shared_secret: shared_secret.into(),
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            config.allowed_users.iter().cloned(),
            config.shared_secret.clone(),
        )
    }

    /// Accept `username`/`password` if the user is allow-listed and the
    /// password equals the shared secret.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        // Evaluate both halves so a bad username costs the same as a bad password.
        let known_user = self.allowed_users.contains(username);
        let secret_ok = secrets_match(password, &self.shared_secret);

        if known_user && secret_ok {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
