pub mod error;
pub mod login;
pub mod otp;

pub use error::AuthError;
pub use login::Authenticator;
pub use otp::{Credential, CredentialStore};
