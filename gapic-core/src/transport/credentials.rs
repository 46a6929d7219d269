//! # Credentials
//!
//! Transports attach credentials as an `authorization: Bearer <token>` header. Where the token
//! comes from is the job of a [`CredentialsProvider`], resolved once when a transport is
//! created from a [`super::registry::TransportRegistry`].
use std::fmt;

/// Environment variable [`EnvironmentCredentials`] reads by default.
pub const DEFAULT_TOKEN_VARIABLE: &str = "GAPIC_ACCESS_TOKEN";

#[derive(thiserror::Error, Debug)]
pub enum CredentialsError {
    #[error("No credentials found in environment variable '{0}'")]
    Missing(String),
    #[error("Environment variable '{0}' is not valid unicode")]
    NotUnicode(String),
}

/// An access token. The token never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Value of the `authorization` header.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Source of the credentials a transport is created with.
pub trait CredentialsProvider: Send + Sync {
    /// `Ok(None)` means the transport runs unauthenticated.
    fn credentials(&self) -> Result<Option<Credentials>, CredentialsError>;
}

/// No credentials at all. Suits local emulators and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialsProvider for Anonymous {
    fn credentials(&self) -> Result<Option<Credentials>, CredentialsError> {
        Ok(None)
    }
}

impl CredentialsProvider for Credentials {
    fn credentials(&self) -> Result<Option<Credentials>, CredentialsError> {
        Ok(Some(self.clone()))
    }
}

/// Reads a bearer token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvironmentCredentials {
    variable: String,
}

impl Default for EnvironmentCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_VARIABLE)
    }
}

impl EnvironmentCredentials {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl CredentialsProvider for EnvironmentCredentials {
    fn credentials(&self) -> Result<Option<Credentials>, CredentialsError> {
        match std::env::var(&self.variable) {
            Ok(token) => Ok(Some(Credentials::bearer(token))),
            Err(std::env::VarError::NotPresent) => {
                Err(CredentialsError::Missing(self.variable.clone()))
            }
            Err(std::env::VarError::NotUnicode(_)) => {
                Err(CredentialsError::NotUnicode(self.variable.clone()))
            }
        }
    }
}
