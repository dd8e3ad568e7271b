//! Deterministic environment for turmoil simulations.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use palaver_client::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall-clock origin of the simulation.
const SIM_EPOCH: u64 = 1_700_000_000;

/// Environment backed by turmoil's virtual clock and a seeded RNG.
///
/// Must be constructed inside a simulation host (the virtual clock needs a
/// runtime context). Given the same seed, `random_bytes` produces the same
/// sequence on every run.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
    started: tokio::time::Instant,
}

impl SimEnv {
    /// Create an environment with a deterministic RNG seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            started: tokio::time::Instant::now(),
        }
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn unix_time(&self) -> u64 {
        SIM_EPOCH + self.started.elapsed().as_secs()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
