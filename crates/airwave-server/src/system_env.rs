//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` is the production implementation of the Environment trait using
//! real system time and the OS RNG. Behavior is non-deterministic; tests use
//! the seeded simulation environment instead.

use airwave_core::Environment;

/// Production environment using system time and OS randomness.
///
/// Session ids and chat message ids are drawn from getrandom, so they cannot
/// be guessed from earlier ids.
///
/// # Panics
///
/// Panics if the OS RNG fails. A server that cannot draw unguessable session
/// ids must not keep running.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn unix_millis(&self) -> u64 {
        // A clock set before 1970 reads as the epoch.
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}
