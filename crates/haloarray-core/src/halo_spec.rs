//! Boundary normalization of the `halo` configuration option into its
//! canonical `d x 2` matrix form (spec §9 "dynamic option handling").

use crate::error::{Error, Result};

/// The `halo` option as accepted at the configuration boundary: a single
/// scalar applied to every face, a per-axis width applied to both faces of
/// that axis, or a full `[lo, hi]` matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HaloSpec {
    /// Same non-negative width on every face of every axis.
    Scalar(u64),
    /// One non-negative width per axis, applied to both faces.
    PerAxis(Vec<u64>),
    /// Explicit `[lo, hi]` width per axis.
    Matrix(Vec<[u64; 2]>),
}

impl Default for HaloSpec {
    fn default() -> Self {
        Self::Scalar(0)
    }
}

/// Normalize a [`HaloSpec`] into the canonical `ndims`-length `[lo, hi]`
/// matrix the core operates on exclusively.
///
/// # Errors
/// Returns [`Error::Configuration`] if a `PerAxis`/`Matrix` spec's length
/// does not equal `ndims`.
pub fn normalize_halo(spec: &HaloSpec, ndims: usize) -> Result<Vec<[u64; 2]>> {
    match spec {
        HaloSpec::Scalar(w) => Ok(vec![[*w, *w]; ndims]),
        HaloSpec::PerAxis(widths) => {
            if widths.len() != ndims {
                return Err(Error::configuration(format!(
                    "halo has {} axes, expected {ndims}",
                    widths.len()
                )));
            }
            Ok(widths.iter().map(|&w| [w, w]).collect())
        }
        HaloSpec::Matrix(matrix) => {
            if matrix.len() != ndims {
                return Err(Error::configuration(format!(
                    "halo has {} axes, expected {ndims}",
                    matrix.len()
                )));
            }
            Ok(matrix.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_broadcasts() {
        assert_eq!(
            normalize_halo(&HaloSpec::Scalar(5), 3).unwrap(),
            vec![[5, 5], [5, 5], [5, 5]]
        );
    }

    #[test]
    fn per_axis_broadcasts_both_faces() {
        assert_eq!(
            normalize_halo(&HaloSpec::PerAxis(vec![10, 5]), 2).unwrap(),
            vec![[10, 10], [5, 5]]
        );
    }

    #[test]
    fn matrix_passes_through() {
        let m = vec![[10, 10], [5, 5]];
        assert_eq!(normalize_halo(&HaloSpec::Matrix(m.clone()), 2).unwrap(), m);
    }

    #[test]
    fn length_mismatch_is_configuration_error() {
        let err = normalize_halo(&HaloSpec::PerAxis(vec![1, 2, 3]), 2).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
