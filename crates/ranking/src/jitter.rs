//! Random sources for the exploration / jitter terms.
//!
//! The home feed adds a little noise so tied videos don't always come out in
//! the same order, and the shorts feed uses a random base score for
//! exploration. Both draw through [`JitterSource`] so tests can pin the value
//! and the CLI can replay a run from a seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Produces values in `[0, 1)`
pub trait JitterSource: Send + Sync {
    fn sample(&self) -> f64;
}

/// Thread-local RNG; the production default
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn sample(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Seeded RNG: the same seed replays the same sequence of draws
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self) -> f64 {
        // A poisoned lock still holds a usable RNG
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random::<f64>()
    }
}

/// Always returns the same value
#[derive(Debug, Clone, Copy)]
pub struct ConstantJitter(pub f64);

impl JitterSource for ConstantJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Adapts any closure into a jitter source
pub struct FnJitter<F>(pub F);

impl<F> JitterSource for FnJitter<F>
where
    F: Fn() -> f64 + Send + Sync,
{
    fn sample(&self) -> f64 {
        (self.0)()
    }
}
