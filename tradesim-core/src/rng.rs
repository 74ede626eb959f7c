//! Deterministic RNG derivation.
//!
//! A master seed is expanded into per-symbol sub-seeds via BLAKE3 hashing,
//! so a run is exactly reproducible given `(bars, config, seed)` and
//! independent of the order in which streams are created.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Seeded source of per-stream RNGs for one simulation run.
#[derive(Debug, Clone)]
pub struct SimRng {
    master_seed: u64,
}

impl SimRng {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for a labeled stream (e.g. a symbol).
    pub fn sub_seed(&self, label: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(label.as_bytes());
        let hash = hasher.finalize();
        u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap())
    }

    /// Create a seeded `StdRng` for a labeled stream.
    pub fn rng_for(&self, label: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(label))
    }
}

/// Draw from N(mean, std_dev) via the Box–Muller transform.
///
/// Kept over an external distribution crate so the only RNG surface is the
/// `RngCore` trait object injected by the caller.
pub fn normal_sample(rng: &mut dyn RngCore, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}
