use crate::error::GeneratorError;
use crate::Generator;
use rand::Rng;
use snaplink_core::shortcode::{MAX_LENGTH, MIN_LENGTH};
use snaplink_core::ShortCode;

/// The 62-character alphabet: lowercase, uppercase, then digits.
pub const ALPHANUMERIC: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Draws fixed-length codes uniformly at random from an alphabet.
///
/// Holds no state besides its configuration, so codes are not unique by
/// themselves; with the default settings the code space is 62^6.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    alphabet: Vec<u8>,
    length: usize,
}

impl RandomGenerator {
    /// Creates a generator over a custom alphabet.
    ///
    /// The alphabet must be non-empty, ASCII alphanumeric and free of
    /// duplicates, so every character is equally likely.
    pub fn new(length: usize, alphabet: &str) -> Result<Self, GeneratorError> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(GeneratorError::InvalidLength {
                length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }

        if alphabet.is_empty() {
            return Err(GeneratorError::EmptyAlphabet);
        }

        let mut seen = Vec::with_capacity(alphabet.len());
        for c in alphabet.chars() {
            if !c.is_ascii_alphanumeric() {
                return Err(GeneratorError::InvalidCharacter(c));
            }
            if seen.contains(&(c as u8)) {
                return Err(GeneratorError::DuplicateCharacter(c));
            }
            seen.push(c as u8);
        }

        Ok(Self {
            alphabet: seen,
            length,
        })
    }

    /// Creates a generator over the 62-character alphanumeric alphabet.
    pub fn alphanumeric(length: usize) -> Result<Self, GeneratorError> {
        Self::new(length, ALPHANUMERIC)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of distinct codes this generator can produce, saturating at
    /// `u128::MAX`.
    pub fn code_space(&self) -> u128 {
        (self.alphabet.len() as u128)
            .checked_pow(self.length as u32)
            .unwrap_or(u128::MAX)
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            alphabet: ALPHANUMERIC.as_bytes().to_vec(),
            length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..self.length)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())] as char)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
