use thiserror::Error;

/// Errors returned when configuring a [`RandomGenerator`](crate::RandomGenerator).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("code length {length} is out of range; expected {min}..={max}")]
    InvalidLength { length: usize, min: usize, max: usize },
    #[error("alphabet must not be empty")]
    EmptyAlphabet,
    #[error("alphabet contains a non-alphanumeric character: {0:?}")]
    InvalidCharacter(char),
    #[error("alphabet contains a duplicate character: {0:?}")]
    DuplicateCharacter(char),
}
