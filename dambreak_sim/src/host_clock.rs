//! Simulated render host clock.
//!
//! Produces the per-tick wall-clock deltas a render loop would hand to the
//! playback controller: a nominal render rate plus optional jitter. All
//! jitter comes from a seeded ChaCha8 RNG, so a run is reproducible from its
//! seed.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use std::time::Duration;

/// Largest accepted jitter fraction (keeps every delta positive).
pub const MAX_JITTER: f64 = 0.95;

/// Virtual render clock with deterministic frame-time jitter.
#[derive(Debug, Clone)]
pub struct SimHostClock {
    /// Master seed for this run
    seed: u64,

    /// Nominal render frame time
    base: Duration,

    /// Jitter as a fraction of `base`, in [0, MAX_JITTER]
    jitter: f64,

    rng: ChaCha8Rng,

    /// Virtual time elapsed so far
    elapsed: Duration,

    /// Host ticks produced so far
    ticks: u64,
}

impl SimHostClock {
    /// Creates a clock rendering at `render_hz` with `jitter` (fraction of a frame).
    ///
    /// Non-positive rates fall back to 60 Hz; jitter is clamped to [0, MAX_JITTER].
    pub fn new(render_hz: f64, jitter: f64, seed: u64) -> Self {
        let hz = if render_hz.is_finite() && render_hz > 0.0 { render_hz } else { 60.0 };
        let jitter = if jitter.is_finite() { jitter.clamp(0.0, MAX_JITTER) } else { 0.0 };
        Self {
            seed,
            base: Duration::from_secs_f64(1.0 / hz),
            jitter,
            rng: ChaCha8Rng::seed_from_u64(seed),
            elapsed: Duration::ZERO,
            ticks: 0,
        }
    }

    /// Returns the delta for the next host tick and advances virtual time.
    pub fn next_delta(&mut self) -> Duration {
        let delta = if self.jitter > 0.0 {
            let u: f64 = Uniform::new_inclusive(-1.0, 1.0).sample(&mut self.rng);
            self.base.mul_f64(1.0 + self.jitter * u)
        } else {
            self.base
        };
        self.elapsed += delta;
        self.ticks += 1;
        delta
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_steady_clock() {
        let mut clock = SimHostClock::new(50.0, 0.0, 1);
        for _ in 0..10 {
            assert_eq!(clock.next_delta(), Duration::from_millis(20));
        }
        assert_eq!(clock.ticks(), 10);
        assert_eq!(clock.elapsed(), Duration::from_millis(200));
    }

    #[test]
    fn test_bad_inputs_fall_back() {
        let clock = SimHostClock::new(0.0, 7.0, 1);
        assert_eq!(clock.base(), Duration::from_secs_f64(1.0 / 60.0));
        assert_eq!(clock.jitter(), MAX_JITTER);
    }

    #[test]
    fn test_same_seed_same_deltas() {
        let mut a = SimHostClock::new(60.0, 0.5, 42);
        let mut b = SimHostClock::new(60.0, 0.5, 42);
        let mut c = SimHostClock::new(60.0, 0.5, 43);

        let da: Vec<_> = (0..32).map(|_| a.next_delta()).collect();
        let db: Vec<_> = (0..32).map(|_| b.next_delta()).collect();
        let dc: Vec<_> = (0..32).map(|_| c.next_delta()).collect();

        assert_eq!(da, db);
        assert_ne!(da, dc);
    }

    proptest! {
        #[test]
        fn prop_jittered_deltas_stay_in_band(
            hz in 10.0f64..240.0,
            jitter in 0.0f64..0.9,
            seed in any::<u64>(),
        ) {
            let mut clock = SimHostClock::new(hz, jitter, seed);
            let base = clock.base().as_secs_f64();
            for _ in 0..64 {
                let d = clock.next_delta().as_secs_f64();
                prop_assert!(d > 0.0);
                prop_assert!(d >= base * (1.0 - jitter) - 1e-9);
                prop_assert!(d <= base * (1.0 + jitter) + 1e-9);
            }
        }
    }
}
