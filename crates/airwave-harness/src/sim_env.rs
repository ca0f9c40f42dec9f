//! Simulated environment.
//!
//! Virtual clock plus a seeded ChaCha RNG. Two `SimEnv`s built from the same
//! seed hand out the same session ids and message ids in the same order, so
//! a failing scenario replays exactly from its seed.
//!
//! Time never moves on its own; tests call [`SimEnv::advance`].

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use airwave_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall clock at simulation start: 2024-01-01T00:00:00Z.
pub const SIM_EPOCH_MILLIS: u64 = 1_704_067_200_000;

struct SimState {
    rng: ChaCha8Rng,
    elapsed: Duration,
}

/// Deterministic environment for simulation.
///
/// Clones share the clock and the RNG.
#[derive(Clone)]
pub struct SimEnv {
    state: Arc<Mutex<SimState>>,
}

impl SimEnv {
    /// Environment seeded with `seed`, clock at zero.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                rng: ChaCha8Rng::seed_from_u64(seed),
                elapsed: Duration::ZERO,
            })),
        }
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, by: Duration) {
        self.lock().elapsed += by;
    }

    /// Time since the simulation started.
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").field("elapsed", &self.elapsed()).finish_non_exhaustive()
    }
}

impl Environment for SimEnv {
    /// Virtual time since simulation start.
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.elapsed()
    }

    fn unix_millis(&self) -> u64 {
        SIM_EPOCH_MILLIS + self.elapsed().as_millis() as u64
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.lock().rng.fill_bytes(buffer);
    }
}
