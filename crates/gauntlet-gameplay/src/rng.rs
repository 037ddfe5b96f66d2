//! Seeded randomness for the simulation.
//!
//! Every random decision (slot choice, approach rolls, spawn jitter) draws
//! from a [`SimRng`] owned by the arena or by the component that needs it,
//! so a run is reproducible from its seed.

/// Deterministic random source.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: fastrand::Rng,
    seed: u64,
}

impl SimRng {
    /// Creates a generator from a seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: fastrand::Rng::with_seed(seed),
            seed,
        }
    }

    /// Returns the seed this generator was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform value in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.inner.f32()
    }

    /// Returns true with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f32) -> bool {
        if p <= 0.0 {
            return false;
        }
        self.unit() < p
    }

    /// Per-tick roll for a rate expressed per second.
    ///
    /// Succeeds when `unit() < rate * dt * scale`.
    pub fn per_second(&mut self, rate: f32, dt: f32, scale: f32) -> bool {
        self.chance(rate * dt * scale)
    }

    /// Uniform index in `0..len`, or `None` for an empty range.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.inner.usize(..len))
        }
    }

    /// Uniform value in `[min, max)`.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.unit()
    }

    /// Derives an independent generator.
    pub fn fork(&mut self) -> Self {
        Self::with_seed(self.inner.u64(..))
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::with_seed(0x5EED)
    }
}
