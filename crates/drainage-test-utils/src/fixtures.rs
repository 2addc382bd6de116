//! Reusable network fixtures.
//!
//! - [`line`]: a chain draining into its last node.
//! - [`braun_willett`]: the ten-node worked example from Braun & Willett (2013).
//! - [`hex_basin`]: a nineteen-node hexagonal mesh with one filled pit.
//! - [`raster_d4`] / [`raster_mfd`]: steepest-descent and multiple-flow
//!   routing over a raster elevation model.
//! - [`random_tree`] / [`random_dag`]: seeded random acyclic graphs for
//!   property tests and benchmarks.

use crate::Network;
use drainage_core::LinkId;
use rand::prelude::*;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;

/// `n` nodes in a chain, `i -> i + 1`, with the last node terminal.
///
/// Every node but the outlet carries unit cell area.
pub fn line(n: usize) -> Network {
    assert!(n > 0, "line needs at least one node");
    let receiver = (0..n).map(|i| (i + 1).min(n - 1)).collect();
    let mut cell_area = vec![1.0; n];
    cell_area[n - 1] = 0.0;
    let mut net = Network::to_one(receiver).with_cell_area(cell_area);
    net.link = (0..n)
        .map(|i| if i + 1 < n { LinkId(i) } else { LinkId::NONE })
        .collect();
    net
}

/// Braun & Willett's ten-node example, zero-based. Node 4 is the outlet.
pub fn braun_willett() -> Network {
    Network::to_one(vec![1, 4, 1, 6, 4, 4, 5, 4, 6, 7])
}

/// Hexagonal mesh (rows of 3, 4, 5, 4, 3 nodes) after pit routing.
///
/// Node 0 is the outlet; the seven interior nodes carry unit cell area,
/// perimeter nodes none. Node 9 was a pit and has been routed out through
/// node 4.
pub fn hex_basin() -> Network {
    let receiver = vec![0, 1, 2, 3, 0, 9, 6, 7, 9, 4, 9, 11, 12, 9, 9, 15, 16, 17, 18];
    let mut cell_area = vec![0.0; receiver.len()];
    for node in [4, 5, 8, 9, 10, 13, 14] {
        cell_area[node] = 1.0;
    }
    let mut net = Network::to_one(receiver).with_cell_area(cell_area);
    net.link = net
        .receiver
        .iter()
        .enumerate()
        .map(|(i, &r)| if r == i { LinkId::NONE } else { LinkId(i) })
        .collect();
    net
}

/// Id of the raster link joining adjacent nodes `a` and `b`.
///
/// Horizontal links are numbered row by row first, then vertical links.
pub fn raster_link(rows: usize, cols: usize, a: usize, b: usize) -> LinkId {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    if hi == lo + 1 {
        let (r, c) = (lo / cols, lo % cols);
        LinkId(r * (cols - 1) + c)
    } else {
        debug_assert_eq!(hi, lo + cols, "nodes are not adjacent");
        LinkId(rows * (cols - 1) + lo)
    }
}

/// Lengths of every raster link, indexed by link id.
pub fn raster_link_lengths(rows: usize, cols: usize, dx: f64, dy: f64) -> Vec<f64> {
    let horizontal = rows * (cols - 1);
    let vertical = (rows - 1) * cols;
    let mut lengths = vec![dx; horizontal];
    lengths.extend(std::iter::repeat_n(dy, vertical));
    lengths
}

/// D4 neighbours of `node` in east, north, west, south order, with the
/// distance to each.
fn d4_neighbours(rows: usize, cols: usize, dx: f64, dy: f64, node: usize) -> Vec<(usize, f64)> {
    let (r, c) = (node / cols, node % cols);
    let mut out = Vec::with_capacity(4);
    if c + 1 < cols {
        out.push((node + 1, dx));
    }
    if r + 1 < rows {
        out.push((node + cols, dy));
    }
    if c > 0 {
        out.push((node - 1, dx));
    }
    if r > 0 {
        out.push((node - cols, dy));
    }
    out
}

fn is_perimeter(rows: usize, cols: usize, node: usize) -> bool {
    let (r, c) = (node / cols, node % cols);
    r == 0 || c == 0 || r + 1 == rows || c + 1 == cols
}

/// Positive downhill slopes from `node` to its open D4 neighbours.
fn downhill(
    rows: usize,
    cols: usize,
    dx: f64,
    dy: f64,
    elevation: &[f64],
    closed: &[bool],
    node: usize,
) -> Vec<(usize, f64)> {
    d4_neighbours(rows, cols, dx, dy, node)
        .into_iter()
        .filter(|&(nb, _)| !closed[nb])
        .map(|(nb, dist)| (nb, (elevation[node] - elevation[nb]) / dist))
        .filter(|&(_, slope)| slope > 0.0)
        .collect()
}

fn check_raster(rows: usize, cols: usize, elevation: &[f64], closed: &[bool]) {
    assert!(rows >= 3 && cols >= 3, "raster needs an interior");
    assert_eq!(elevation.len(), rows * cols, "elevation length");
    assert_eq!(closed.len(), rows * cols, "closed mask length");
}

/// Steepest-descent D4 routing on a `rows x cols` raster.
///
/// Perimeter nodes are terminal and have no cell. Interior nodes drain to
/// their steepest lower neighbour that is not `closed`, or to themselves
/// when none is lower. Row index increases northward.
pub fn raster_d4(
    rows: usize,
    cols: usize,
    dx: f64,
    dy: f64,
    elevation: &[f64],
    closed: &[bool],
) -> Network {
    check_raster(rows, cols, elevation, closed);
    let n = rows * cols;
    let mut receiver: Vec<usize> = (0..n).collect();
    let mut link = vec![LinkId::NONE; n];
    let mut cell_area = vec![0.0; n];

    for node in 0..n {
        if is_perimeter(rows, cols, node) {
            continue;
        }
        cell_area[node] = dx * dy;
        if closed[node] {
            continue;
        }
        let steepest = downhill(rows, cols, dx, dy, elevation, closed, node)
            .into_iter()
            .fold(None, |best: Option<(usize, f64)>, (nb, slope)| match best {
                Some((_, s)) if s >= slope => best,
                _ => Some((nb, slope)),
            });
        if let Some((nb, _)) = steepest {
            receiver[node] = nb;
            link[node] = raster_link(rows, cols, node, nb);
        }
    }

    Network {
        receiver,
        proportion: None,
        link,
        max_receivers: 1,
        cell_area,
        link_length: raster_link_lengths(rows, cols, dx, dy),
    }
}

/// Multiple-flow-direction routing on a raster, four slots per node.
///
/// Each interior node splits its flux across all lower open D4 neighbours
/// in proportion to slope. Slots are filled in east, north, west, south
/// order; unused slots point at the node itself with proportion 0.
pub fn raster_mfd(
    rows: usize,
    cols: usize,
    dx: f64,
    dy: f64,
    elevation: &[f64],
    closed: &[bool],
) -> Network {
    const K: usize = 4;
    check_raster(rows, cols, elevation, closed);
    let n = rows * cols;
    let mut receiver = Vec::with_capacity(n * K);
    let mut proportion = vec![0.0; n * K];
    let mut link = vec![LinkId::NONE; n * K];
    let mut cell_area = vec![0.0; n];

    for node in 0..n {
        receiver.extend(std::iter::repeat_n(node, K));
        let row = node * K;
        let interior = !is_perimeter(rows, cols, node);
        if interior {
            cell_area[node] = dx * dy;
        }
        let lower = if interior && !closed[node] {
            downhill(rows, cols, dx, dy, elevation, closed, node)
        } else {
            Vec::new()
        };
        if lower.is_empty() {
            proportion[row] = 1.0;
            continue;
        }
        let total: f64 = lower.iter().map(|&(_, s)| s).sum();
        for (slot, &(nb, slope)) in lower.iter().enumerate() {
            receiver[row + slot] = nb;
            proportion[row + slot] = slope / total;
            link[row + slot] = raster_link(rows, cols, node, nb);
        }
    }

    Network {
        receiver,
        proportion: Some(proportion),
        link,
        max_receivers: K,
        cell_area,
        link_length: raster_link_lengths(rows, cols, dx, dy),
    }
}

/// Random single-receiver forest over `n` nodes with `outlets` terminals.
///
/// Nodes are ranked by a seeded shuffle; each non-outlet drains to a node
/// of lower rank, so the graph is acyclic but node ids carry no order.
/// Cell areas are drawn from `[0.5, 1.5)`.
pub fn random_tree(n: usize, outlets: usize, seed: u64) -> Network {
    assert!(outlets >= 1 && outlets <= n, "need 1..=n outlets");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rank: Vec<usize> = (0..n).collect();
    rank.shuffle(&mut rng);

    let mut receiver = vec![0usize; n];
    let mut link = vec![LinkId::NONE; n];
    for k in 0..n {
        let node = rank[k];
        if k < outlets {
            receiver[node] = node;
        } else {
            receiver[node] = rank[rng.random_range(0..k)];
            link[node] = LinkId(node);
        }
    }
    let cell_area = (0..n).map(|_| 0.5 + rng.random::<f64>()).collect();

    Network {
        receiver,
        proportion: None,
        link,
        max_receivers: 1,
        cell_area,
        link_length: Vec::new(),
    }
}

/// Random multi-receiver DAG over `n` nodes with `outlets` terminals and up
/// to `max_receivers` receivers per node.
///
/// Built like [`random_tree`], but each non-outlet picks between one and
/// `max_receivers` distinct lower-ranked receivers with random proportions
/// that sum to one.
pub fn random_dag(n: usize, outlets: usize, max_receivers: usize, seed: u64) -> Network {
    assert!(outlets >= 1 && outlets <= n, "need 1..=n outlets");
    assert!(max_receivers >= 1, "need at least one receiver slot");
    let k_max = max_receivers;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rank: Vec<usize> = (0..n).collect();
    rank.shuffle(&mut rng);

    let mut receiver: Vec<usize> = (0..n).flat_map(|i| std::iter::repeat_n(i, k_max)).collect();
    let mut proportion = vec![0.0; n * k_max];
    let mut link = vec![LinkId::NONE; n * k_max];

    for k in 0..n {
        let node = rank[k];
        let row = node * k_max;
        if k < outlets {
            proportion[row] = 1.0;
            continue;
        }
        let count = rng.random_range(1..=k_max.min(k));
        let picks = index::sample(&mut rng, k, count);
        let weights: Vec<f64> = (0..count).map(|_| 0.1 + rng.random::<f64>()).collect();
        let total: f64 = weights.iter().sum();
        for (slot, (pick, w)) in picks.into_iter().zip(weights).enumerate() {
            receiver[row + slot] = rank[pick];
            proportion[row + slot] = w / total;
            link[row + slot] = LinkId(row + slot);
        }
    }
    let cell_area = (0..n).map(|_| 0.5 + rng.random::<f64>()).collect();

    Network {
        receiver,
        proportion: Some(proportion),
        link,
        max_receivers: k_max,
        cell_area,
        link_length: Vec::new(),
    }
}
