use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Mutex;

/// Fisher-Yates shuffle over an injectable random source
///
/// Seed it for reproducible orderings in tests; use [`Shuffler::from_entropy`]
/// everywhere else.
pub struct Shuffler {
    rng: Mutex<StdRng>,
}

impl Shuffler {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn shuffle<T>(&self, items: &mut [T]) {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for i in (1..items.len()).rev() {
            let j = rng.gen_range(0..=i);
            items.swap(i, j);
        }
    }
}

impl Default for Shuffler {
    fn default() -> Self {
        Self::from_entropy()
    }
}
