//! Environment abstraction for deterministic testing.
//!
//! Decouples the connection manager from system resources (time,
//! randomness). Production uses [`SystemEnv`]; the simulation harness
//! provides a virtual-clock, seeded-RNG implementation.

use std::time::Duration;

/// Abstract environment providing time and randomness.
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; simulation
    /// environments use virtual time (e.g. `tokio::time::Instant`).
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Wall-clock seconds since the Unix epoch.
    ///
    /// Outgoing chat messages carry this as their `timestamp`.
    fn unix_time(&self) -> u64;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this (the reconnect delay); the state
    /// machine itself never blocks.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);
}

/// Production environment: system clock, tokio timers, OS entropy.
#[cfg(feature = "transport")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

#[cfg(feature = "transport")]
impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn unix_time(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        use rand::RngCore;
        rand::rngs::OsRng.fill_bytes(buffer);
    }
}
