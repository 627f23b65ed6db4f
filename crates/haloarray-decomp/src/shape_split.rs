//! Balanced, contiguous splitting of an array shape over a Cartesian mesh.
//!
//! Mirrors `array_split.shape_split`'s default (`"N"`, near-equal) mode: each
//! axis is cut into `dims[d]` contiguous pieces whose sizes differ by at most
//! one element, with the larger pieces placed first.

use haloarray_core::{Error, IndexingExtent, Result};

/// Per-axis boundaries splitting `len` into `parts` near-equal contiguous
/// pieces, larger pieces first.
fn axis_boundaries(len: i64, parts: u32) -> Vec<i64> {
    let parts = i64::from(parts);
    let base = len / parts;
    let rem = len % parts;
    let mut boundaries = Vec::with_capacity(usize::try_from(parts).unwrap_or(0) + 1);
    boundaries.push(0);
    let mut acc = 0;
    for i in 0..parts {
        let size = base + i64::from(i < rem);
        acc += size;
        boundaries.push(acc);
    }
    boundaries
}

/// Row-major Cartesian rank -> coordinate, matching the rank ordering
/// produced by [`crate::decomposition::Decomposition`] (and the default
/// ordering of `MPI_Cart_create`): the last axis varies fastest.
#[must_use]
pub fn rank_to_coord(rank: u32, dims: &[u32]) -> Vec<u32> {
    let mut coord = vec![0; dims.len()];
    let mut rem = rank;
    for d in (0..dims.len()).rev() {
        coord[d] = rem % dims[d];
        rem /= dims[d];
    }
    coord
}

/// Inverse of [`rank_to_coord`].
#[must_use]
pub fn coord_to_rank(coord: &[u32], dims: &[u32]) -> u32 {
    let mut rank = 0;
    for d in 0..dims.len() {
        rank = rank * dims[d] + coord[d];
    }
    rank
}

/// Split `shape` into the authoritative (no-halo) boxes of a `dims`-shaped
/// Cartesian mesh, indexed by Cartesian rank (see [`rank_to_coord`]).
///
/// An axis with fewer elements than mesh cells along it is not an error:
/// the leading cells each get one element and the trailing cells get an
/// empty (zero-size) authoritative box, matching `array_split.shape_split`'s
/// treatment of over-decomposed axes.
///
/// # Errors
/// Returns [`Error::Configuration`] if `shape.len() != dims.len()`.
pub fn split_shape(shape: &[i64], dims: &[u32]) -> Result<Vec<IndexingExtent>> {
    if shape.len() != dims.len() {
        return Err(Error::configuration(format!(
            "shape has {} axes, dims has {}",
            shape.len(),
            dims.len()
        )));
    }

    let per_axis_boundaries: Vec<Vec<i64>> = shape
        .iter()
        .zip(dims)
        .map(|(&n, &k)| axis_boundaries(n, k))
        .collect();

    let num_ranks: u32 = dims.iter().product();
    (0..num_ranks)
        .map(|rank| {
            let coord = rank_to_coord(rank, dims);
            let mut start = Vec::with_capacity(dims.len());
            let mut stop = Vec::with_capacity(dims.len());
            for (d, &c) in coord.iter().enumerate() {
                start.push(per_axis_boundaries[d][c as usize]);
                stop.push(per_axis_boundaries[d][c as usize + 1]);
            }
            IndexingExtent::new(start, stop)
        })
        .collect()
}
