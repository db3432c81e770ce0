use crate::error::ShortenerError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A validated short code identifier for a shortened URL.
///
/// Short codes are 1-32 ASCII alphanumeric characters and are compared
/// case-sensitively (`aB3` and `Ab3` are different codes).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

pub const MIN_LENGTH: usize = 1;
pub const MAX_LENGTH: usize = 32;

impl ShortCode {
    /// Creates a new `ShortCode` after validating the input.
    ///
    /// Valid codes are 1-32 characters and contain only `[a-zA-Z0-9]`.
    pub fn new(code: impl Into<String>) -> Result<Self, ShortenerError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (the code generator, or rows read back from the store).
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> Result<(), ShortenerError> {
        if code.len() < MIN_LENGTH || code.len() > MAX_LENGTH {
            return Err(ShortenerError::InvalidShortCode(format!(
                "length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_LENGTH,
                code.len()
            )));
        }

        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ShortenerError::InvalidShortCode(format!(
                "must contain only alphanumeric characters: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShortCode {
    type Error = ShortenerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortCode> for String {
    fn from(code: ShortCode) -> Self {
        code.0
    }
}
