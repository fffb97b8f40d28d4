//! # Selection Shuffler
//!
//! Spreads load across physical devices by randomizing the candidate order,
//! so the locker does not always favor the first rows of the catalog.

use corral_common::target::Target;
use rand::Rng;
use rand::seq::SliceRandom;

/// Applies a uniform random permutation to `targets` when `enabled`.
pub fn shuffle_targets(targets: &mut [Target], enabled: bool) {
    if enabled {
        shuffle_with(targets, &mut rand::rng());
    }
}

/// Shuffles with a caller-provided RNG.
pub fn shuffle_with<R: Rng + ?Sized>(targets: &mut [Target], rng: &mut R) {
    targets.shuffle(rng);
}
