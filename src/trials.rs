//! ═══════════════════════════════════════════════════════════════════════════════
//! TRIALS — Deterministic Trial Dispatch
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Trial `t` of a routine seeded with `s` always draws from ChaCha8 stream `t`
//! of key `s`. The assignment is fixed before dispatch, so running trials on
//! the rayon pool reproduces the serial result exactly.
//! ═══════════════════════════════════════════════════════════════════════════════

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// RNG for one trial: key = `seed`, stream = `trial`
pub fn trial_rng(seed: u64, trial: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(trial as u64);
    rng
}

/// Run `f(trial_index)` for every trial, results in trial order
pub fn run_trials<T, F>(n_trials: usize, parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if parallel {
        (0..n_trials).into_par_iter().map(&f).collect()
    } else {
        (0..n_trials).map(f).collect()
    }
}

/// Per-routine seed derived from the master seed (splitmix64 finalizer)
pub fn derive_seed(master: u64, routine: &str) -> u64 {
    let mut z = master;
    for byte in routine.bytes() {
        z = z.wrapping_mul(0x100000001b3).wrapping_add(byte as u64);
    }
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}
