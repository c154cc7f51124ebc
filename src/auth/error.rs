use thiserror::Error;

/// Errors returned by the login check that guards credential issuance.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Username and password required")]
    MissingCredentials,
    #[error("Invalid credentials")]
    InvalidCredentials,
}
