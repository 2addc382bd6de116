//! Benchmark profiles for drainage flow accumulation.
//!
//! - [`reference_raster`]: 100x100 raster (10K nodes) with single- or
//!   multi-flow routing over a noisy inclined plane
//! - [`stress_tree`]: seeded random forest with 100K nodes
//! - [`stress_dag`]: seeded random multi-receiver DAG with 100K nodes

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use drainage_test_utils::fixtures::{raster_d4, raster_mfd, random_dag, random_tree};
use drainage_test_utils::Network;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Side length of the reference raster.
pub const REFERENCE_SIDE: usize = 100;

/// Node count of the stress profiles.
pub const STRESS_NODES: usize = 100_000;

/// Elevation rising from the south-west corner, perturbed by seeded noise
/// small enough to keep every interior node draining.
pub fn noisy_plane(rows: usize, cols: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..rows * cols)
        .map(|i| {
            let (r, c) = ((i / cols) as f64, (i % cols) as f64);
            r + c + 0.4 * rng.random::<f64>()
        })
        .collect()
}

/// 100x100 raster with open boundaries, unit spacing.
///
/// `multi_flow` selects four-slot proportional routing over
/// steepest descent.
pub fn reference_raster(seed: u64, multi_flow: bool) -> Network {
    let side = REFERENCE_SIDE;
    let z = noisy_plane(side, side, seed);
    let closed = vec![false; side * side];
    if multi_flow {
        raster_mfd(side, side, 1.0, 1.0, &z, &closed)
    } else {
        raster_d4(side, side, 1.0, 1.0, &z, &closed)
    }
}

/// 100K-node random forest draining to 16 outlets.
pub fn stress_tree(seed: u64) -> Network {
    random_tree(STRESS_NODES, 16, seed)
}

/// 100K-node random DAG with up to 3 receivers per node.
pub fn stress_dag(seed: u64) -> Network {
    random_dag(STRESS_NODES, 16, 3, seed)
}
