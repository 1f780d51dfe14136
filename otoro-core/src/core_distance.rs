//! Core distance computation.
//!
//! A point's core distance is its distance to the `min_points`-th nearest
//! neighbour, counting the point itself, and acts as a local density proxy.
//! Each point keeps a small sorted buffer of the `min_points - 1` smallest
//! distances seen so far, so the scan is O(N·k) per point rather than a full
//! sort of the row.

use std::num::NonZeroUsize;

use rayon::prelude::*;

use crate::{DistanceSource, error::DistanceSourceError};

/// Computes the core distance of every point in the source.
///
/// `min_points == 1` considers no neighbours, so every core distance is zero.
/// When the source has fewer than `min_points - 1` other points, a point's
/// core distance falls back to the distance to its farthest neighbour.
///
/// Points are processed in parallel; the per-point result is independent of
/// evaluation order.
///
/// # Errors
/// Returns [`DistanceSourceError::EmptyData`] for an empty source and
/// propagates any failure raised by [`DistanceSource::distance`].
pub fn compute_core_distances<D: DistanceSource + Sync>(
    source: &D,
    min_points: NonZeroUsize,
) -> Result<Vec<f32>, DistanceSourceError> {
    let items = source.len();
    if items == 0 {
        return Err(DistanceSourceError::EmptyData);
    }

    let neighbours = min_points.get() - 1;
    if neighbours == 0 {
        return Ok(vec![0.0; items]);
    }

    (0..items)
        .into_par_iter()
        .map(|point| core_distance_of(source, point, items, neighbours))
        .collect()
}

fn core_distance_of<D: DistanceSource>(
    source: &D,
    point: usize,
    items: usize,
    neighbours: usize,
) -> Result<f32, DistanceSourceError> {
    // Sorted buffer of the smallest distances found so far.
    let mut nearest = vec![f32::INFINITY; neighbours];
    for neighbour in 0..items {
        if neighbour == point {
            continue;
        }
        let distance = source.distance(point, neighbour)?;
        let mut slot = neighbours;
        while slot >= 1 && distance < nearest[slot - 1] {
            slot -= 1;
        }
        if slot < neighbours {
            for shift in (slot + 1..neighbours).rev() {
                nearest[shift] = nearest[shift - 1];
            }
            nearest[slot] = distance;
        }
    }

    let core = nearest[neighbours - 1];
    if core.is_finite() {
        return Ok(core);
    }
    // Fewer real neighbours than requested; fall back to the farthest one.
    Ok(nearest
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .fold(0.0, f32::max))
}
