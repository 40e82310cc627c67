//! Random short-code generation.

use leancup_application::ports::short_code::ShortCodeGenerator;
use leancup_domain::ShortCode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Draws each of the nine letters uniformly from `a..=z`
///
/// Uniqueness is not checked here; the session use case retries on the
/// store's short-code constraint.
pub struct RandomShortCodeGenerator {
    rng: Mutex<StdRng>,
}

impl RandomShortCodeGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence of codes for demos and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomShortCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortCodeGenerator for RandomShortCodeGenerator {
    fn generate(&self) -> ShortCode {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let mut indices = [0usize; 9];
        for idx in indices.iter_mut() {
            *idx = rng.gen_range(0..ShortCode::ALPHABET.len());
        }
        ShortCode::from_indices(indices)
    }
}
