//! Cartesian mesh construction over locales (spec §4.4).

use haloarray_core::{Error, Result};

use crate::shared_locale::SharedLocaleInfo;
use crate::transport::{Transport, TransportGroup};

/// Deterministically fill the zero entries of `dims` with positive factors
/// so that `dims.iter().product() == num_locales`.
///
/// Canonical rule (an explicit resolution of the "canonical factorization"
/// ambiguity noted in spec §4.4 step 2): the entire remaining factor is
/// assigned to the *last* unset axis, and every other unset axis is filled
/// with `1`. This is the simplest rule that both distributes factors toward
/// later axes and is deterministic given `(num_locales, dims)`.
///
/// # Errors
/// Returns [`Error::Configuration`] if the fixed (non-zero) entries of
/// `dims` do not evenly divide `num_locales`, or (when `dims` has no zero
/// entries) if their product does not equal `num_locales` exactly.
pub fn factorize_dims(dims: &[u32], num_locales: u32) -> Result<Vec<u32>> {
    let zero_idxs: Vec<usize> = dims
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(i, _)| i)
        .collect();
    let fixed_product: u64 = dims.iter().filter(|&&d| d != 0).map(u64::from).product();

    if zero_idxs.is_empty() {
        if fixed_product != u64::from(num_locales) {
            return Err(Error::configuration(format!(
                "dims {dims:?} has product {fixed_product}, but num_locales={num_locales}"
            )));
        }
        return Ok(dims.to_vec());
    }

    if fixed_product == 0 || u64::from(num_locales) % fixed_product != 0 {
        return Err(Error::configuration(format!(
            "dims {dims:?} fixed entries do not evenly divide num_locales={num_locales}"
        )));
    }
    let remaining = u64::from(num_locales) / fixed_product;

    let mut out = dims.to_vec();
    for &i in &zero_idxs[..zero_idxs.len() - 1] {
        out[i] = 1;
    }
    let last = *zero_idxs.last().expect("zero_idxs is non-empty");
    out[last] = u32::try_from(remaining)
        .map_err(|_| Error::configuration(format!("dims factor {remaining} overflows u32")))?;
    Ok(out)
}

/// The Cartesian mesh of locales over which a [`Decomposition`] partitions
/// an array. Constructed once per distribution; immutable thereafter.
///
/// [`Decomposition`]: https://docs.rs/haloarray-decomp
#[derive(Clone)]
pub struct LocaleTopology<T: Transport> {
    shared_info: SharedLocaleInfo<T>,
    dims: Vec<u32>,
    periods: Vec<bool>,
    inter_locale_group: T::Group,
}

impl<T: Transport> LocaleTopology<T> {
    /// Build a topology over `rank_group`.
    ///
    /// Exactly one of `ndims`/`dims` may be omitted; zero entries in
    /// `dims` are auto-filled (see [`factorize_dims`]). `periods` defaults
    /// to all-`false`. `intra_locale_group`, if given, overrides automatic
    /// shared-memory detection (forcing per-process locale mode when set
    /// to a singleton group).
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] per spec §4.4: neither `ndims` nor
    /// `dims` given, `len(dims) != ndims`, or an incompatible `dims`/
    /// `num_locales` combination.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transport: &T,
        rank_group: T::Group,
        ndims: Option<usize>,
        dims: Option<Vec<u32>>,
        periods: Option<Vec<bool>>,
        intra_locale_group: Option<T::Group>,
    ) -> Result<Self> {
        let ndims = match (ndims, &dims) {
            (None, None) => {
                return Err(Error::configuration(
                    "must specify one of dims or ndims in LocaleTopology constructor",
                ))
            }
            (Some(n), Some(d)) if d.len() != n => {
                return Err(Error::configuration(format!(
                    "length of dims ({}) not equal to ndims ({n})",
                    d.len()
                )))
            }
            (Some(n), _) => n,
            (None, Some(d)) => d.len(),
        };

        let dims_in = dims.unwrap_or_else(|| vec![0; ndims]);
        let periods = periods.unwrap_or_else(|| vec![false; ndims]);
        if periods.len() != ndims {
            return Err(Error::configuration(format!(
                "length of periods ({}) not equal to ndims ({ndims})",
                periods.len()
            )));
        }

        let shared_info = match intra_locale_group {
            Some(g) => SharedLocaleInfo::from_intra_locale_group(transport, &rank_group, g),
            None => SharedLocaleInfo::new(transport, &rank_group),
        };

        let dims = factorize_dims(&dims_in, shared_info.num_locales())?;

        let is_representative = !shared_info.intra_locale_group().is_null()
            && shared_info.intra_locale_group().rank() == 0;
        let color = if is_representative { Some(0) } else { None };
        let split = transport.split_color(&rank_group, color);
        let inter_locale_group = if split.is_null() {
            split
        } else {
            transport.cart_create(&split, &dims, &periods)
        };

        tracing::info!(?dims, ?periods, num_locales = shared_info.num_locales(), "built locale topology");

        Ok(Self {
            shared_info,
            dims,
            periods,
            inter_locale_group,
        })
    }

    /// Per-axis locale counts of the mesh.
    #[must_use]
    pub fn dims(&self) -> &[u32] {
        &self.dims
    }

    /// Per-axis periodicity.
    #[must_use]
    pub fn periods(&self) -> &[bool] {
        &self.periods
    }

    /// `true` if this participant holds a non-null inter-locale handle,
    /// i.e. is the representative for its locale.
    #[must_use]
    pub fn is_representative(&self) -> bool {
        !self.inter_locale_group.is_null()
    }

    /// The inter-locale Cartesian communicator; null on non-representative
    /// participants.
    #[must_use]
    pub fn inter_locale_group(&self) -> &T::Group {
        &self.inter_locale_group
    }

    /// The `SharedLocaleInfo` this topology was built from.
    #[must_use]
    pub fn shared_locale_info(&self) -> &SharedLocaleInfo<T> {
        &self.shared_info
    }

    /// Total number of locales in the mesh.
    #[must_use]
    pub fn num_locales(&self) -> u32 {
        self.shared_info.num_locales()
    }

    /// Build a slab topology: a degenerate Cartesian mesh of `ndims` axes
    /// that splits only along `axis` (every other axis has exactly one
    /// locale). Thin wrapper over [`LocaleTopology::new`] rather than a
    /// separate algorithm: passing `dims` with `1` on every axis except
    /// `axis` (left `0` for [`factorize_dims`] to fill with the full
    /// locale count) produces exactly this mesh.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if `axis >= ndims`, or per
    /// [`LocaleTopology::new`]'s other error cases.
    pub fn slab(
        transport: &T,
        rank_group: T::Group,
        ndims: usize,
        axis: usize,
        periods: Option<Vec<bool>>,
        intra_locale_group: Option<T::Group>,
    ) -> Result<Self> {
        if axis >= ndims {
            return Err(Error::configuration(format!(
                "slab axis {axis} out of range for a {ndims}-axis mesh"
            )));
        }
        let mut dims = vec![1u32; ndims];
        dims[axis] = 0;
        Self::new(transport, rank_group, Some(ndims), Some(dims), periods, intra_locale_group)
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::factorize_dims;

    proptest! {
        /// Any all-zero `dims` of a chosen rank factorizes `num_locales`
        /// exactly: the product of the filled-in dims always equals it,
        /// and every entry is at least `1`.
        #[test]
        fn all_zero_dims_factorize_exactly(ndim in 1usize..4, num_locales in 1u32..200) {
            let dims = vec![0u32; ndim];
            let filled = factorize_dims(&dims, num_locales).unwrap();
            prop_assert_eq!(filled.len(), ndim);
            prop_assert_eq!(filled.iter().product::<u32>(), num_locales);
            prop_assert!(filled.iter().all(|&d| d >= 1));
        }

        /// A fixed axis that evenly divides `num_locales` is preserved
        /// verbatim, and the remaining axis absorbs the quotient.
        #[test]
        fn fixed_axis_is_preserved(fixed in 1u32..20, quotient in 1u32..20) {
            let num_locales = fixed * quotient;
            let filled = factorize_dims(&[fixed, 0], num_locales).unwrap();
            prop_assert_eq!(filled[0], fixed);
            prop_assert_eq!(filled[1], quotient);
        }
    }
}
