//! Row-major addressing helpers shared by the with-halo storage buffer.

use itertools::Itertools;

/// C-order (row-major, last axis fastest) strides for `shape`.
#[must_use]
pub fn row_major_strides(shape: &[i64]) -> Vec<i64> {
    let mut strides = vec![1i64; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// Flat offset of `idx` (relative to the same origin as `strides` was built
/// for) into a row-major buffer.
#[must_use]
pub fn flat_offset(idx: &[i64], strides: &[i64]) -> i64 {
    idx.iter().zip(strides).map(|(&i, &s)| i * s).sum()
}

/// Every coordinate within `shape` (all axes `0..shape[d]`), in row-major
/// visiting order.
pub fn row_major_indices(shape: &[i64]) -> impl Iterator<Item = Vec<i64>> + '_ {
    shape.iter().map(|&n| 0..n).multi_cartesian_product()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_3d() {
        assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
    }

    #[test]
    fn offset_matches_manual_calc() {
        let strides = row_major_strides(&[2, 3, 4]);
        assert_eq!(flat_offset(&[1, 2, 3], &strides), 1 * 12 + 2 * 4 + 3);
    }

    #[test]
    fn indices_visit_in_row_major_order() {
        let all: Vec<_> = row_major_indices(&[2, 2]).collect();
        assert_eq!(all, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
    }
}
