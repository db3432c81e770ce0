pub mod error;
pub mod random;

pub use error::GeneratorError;
pub use random::RandomGenerator;

use snaplink_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// A generated code is only a candidate: the shortening service checks it
/// against the store and asks for another one on collision.
pub trait Generator: Send + Sync + 'static {
    /// Generates a candidate short code.
    fn generate(&self) -> ShortCode;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self) -> ShortCode {
        (**self).generate()
    }
}
