//! Axis-aligned N-D index boxes.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::side::{HI, LO};

/// An axis-aligned, half-open N-D index box `[start, stop)`.
///
/// `start`/`stop` are signed so that halo arithmetic upstream of clipping
/// (see `DecompositionExtent` in `haloarray-decomp`) can transiently produce
/// a negative `start` before it is clamped against the global shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingExtent {
    start: Vec<i64>,
    stop: Vec<i64>,
}

impl IndexingExtent {
    /// Build an extent from per-axis `start`/`stop` vectors.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if `start.len() != stop.len()`.
    pub fn new(start: Vec<i64>, stop: Vec<i64>) -> Result<Self> {
        if start.len() != stop.len() {
            return Err(Error::configuration(format!(
                "start has {} axes, stop has {}",
                start.len(),
                stop.len()
            )));
        }
        Ok(Self { start, stop })
    }

    /// Build an extent from per-axis half-open ranges.
    ///
    /// # Errors
    /// Never fails; kept fallible to mirror [`IndexingExtent::new`] and to
    /// leave room for future range validation without a signature change.
    pub fn from_slices(slices: &[Range<i64>]) -> Result<Self> {
        let start = slices.iter().map(|r| r.start).collect();
        let stop = slices.iter().map(|r| r.end).collect();
        Self::new(start, stop)
    }

    /// Number of axes.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.start.len()
    }

    /// Per-axis start coordinates.
    #[must_use]
    pub fn start(&self) -> &[i64] {
        &self.start
    }

    /// Per-axis stop coordinates (exclusive).
    #[must_use]
    pub fn stop(&self) -> &[i64] {
        &self.stop
    }

    /// Per-axis extent `stop - start`; may be zero on any axis (empty box).
    #[must_use]
    pub fn shape(&self) -> Vec<i64> {
        self.start
            .iter()
            .zip(&self.stop)
            .map(|(&s, &e)| (e - s).max(0))
            .collect()
    }

    /// Total element count, `0` if any axis is empty.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.shape().iter().map(|&n| n as u64).product()
    }

    /// `true` if the box is empty along any axis.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.iter().zip(&self.stop).any(|(&s, &e)| e <= s)
    }

    /// Per-axis half-open ranges, e.g. for slicing a buffer.
    #[must_use]
    pub fn to_slice(&self) -> Vec<Range<i64>> {
        self.start
            .iter()
            .zip(&self.stop)
            .map(|(&s, &e)| s..e)
            .collect()
    }

    /// Intersection of `self` and `other`, or `None` if disjoint on any
    /// axis. Per-axis: `max(start_a, start_b) .. min(stop_a, stop_b)`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if self.ndim() != other.ndim() {
            return None;
        }
        let mut start = Vec::with_capacity(self.ndim());
        let mut stop = Vec::with_capacity(self.ndim());
        for d in 0..self.ndim() {
            let s = self.start[d].max(other.start[d]);
            let e = self.stop[d].min(other.stop[d]);
            if s >= e {
                return None;
            }
            start.push(s);
            stop.push(e);
        }
        Some(Self { start, stop })
    }

    /// Translate `idx` (a coordinate in this extent's space) by
    /// `-self.start`, yielding a coordinate local to the box's own origin.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] if `idx.len() != self.ndim()`.
    pub fn global_to_local(&self, idx: &[i64]) -> Result<Vec<i64>> {
        if idx.len() != self.ndim() {
            return Err(Error::argument(format!(
                "index has {} axes, extent has {}",
                idx.len(),
                self.ndim()
            )));
        }
        Ok(idx.iter().zip(&self.start).map(|(&i, &s)| i - s).collect())
    }

    /// Translate `other` (a box in this extent's coordinate space) into a
    /// box local to this extent's own origin. The result is a valid local
    /// slice into a buffer allocated for `self`'s shape.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] on a dimensionality mismatch.
    pub fn global_to_local_extent(&self, other: &Self) -> Result<Self> {
        let start = self.global_to_local(&other.start)?;
        let stop = self.global_to_local(&other.stop)?;
        Self::new(start, stop)
    }
}

/// An [`IndexingExtent`] with a per-axis, per-side halo margin.
///
/// The wrapped extent is always the *authoritative* (no-halo) box; the
/// with-halo box is derived on demand from `halo`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaloIndexingExtent {
    no_halo: IndexingExtent,
    /// `halo[d][LO]`/`halo[d][HI]`, non-negative.
    halo: Vec<[u64; 2]>,
}

impl HaloIndexingExtent {
    /// Build from an authoritative box and a per-axis `[lo, hi]` halo
    /// matrix.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if `halo.len() != no_halo.ndim()`.
    pub fn new(no_halo: IndexingExtent, halo: Vec<[u64; 2]>) -> Result<Self> {
        if halo.len() != no_halo.ndim() {
            return Err(Error::configuration(format!(
                "halo has {} axes, extent has {}",
                halo.len(),
                no_halo.ndim()
            )));
        }
        Ok(Self { no_halo, halo })
    }

    /// The authoritative (no-halo) box.
    #[must_use]
    pub fn no_halo_box(&self) -> &IndexingExtent {
        &self.no_halo
    }

    /// Per-axis, per-side halo widths.
    #[must_use]
    pub fn halo(&self) -> &[[u64; 2]] {
        &self.halo
    }

    /// Number of axes.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.no_halo.ndim()
    }

    /// Authoritative start coordinates (alias of `no_halo_box().start()`).
    #[must_use]
    pub fn start_n(&self) -> &[i64] {
        self.no_halo.start()
    }

    /// Authoritative stop coordinates.
    #[must_use]
    pub fn stop_n(&self) -> &[i64] {
        self.no_halo.stop()
    }

    /// Authoritative shape.
    #[must_use]
    pub fn shape_n(&self) -> Vec<i64> {
        self.no_halo.shape()
    }

    /// Authoritative element count.
    #[must_use]
    pub fn size_n(&self) -> u64 {
        self.no_halo.size()
    }

    /// With-halo start coordinates: `start_n - halo[d][LO]`. May be
    /// negative before any outer-face clipping is applied by the caller.
    #[must_use]
    pub fn start_h(&self) -> Vec<i64> {
        self.no_halo
            .start()
            .iter()
            .zip(&self.halo)
            .map(|(&s, h)| s - h[LO] as i64)
            .collect()
    }

    /// With-halo stop coordinates: `stop_n + halo[d][HI]`.
    #[must_use]
    pub fn stop_h(&self) -> Vec<i64> {
        self.no_halo
            .stop()
            .iter()
            .zip(&self.halo)
            .map(|(&e, h)| e + h[HI] as i64)
            .collect()
    }

    /// With-halo shape.
    #[must_use]
    pub fn shape_h(&self) -> Vec<i64> {
        self.start_h()
            .iter()
            .zip(self.stop_h())
            .map(|(&s, e)| (e - s).max(0))
            .collect()
    }

    /// With-halo element count.
    #[must_use]
    pub fn size_h(&self) -> u64 {
        self.shape_h().iter().map(|&n| n as u64).product()
    }

    /// The with-halo box as a freestanding [`IndexingExtent`].
    #[must_use]
    pub fn with_halo_box(&self) -> IndexingExtent {
        IndexingExtent {
            start: self.start_h(),
            stop: self.stop_h(),
        }
    }

    /// Per-axis half-open ranges of the authoritative box.
    #[must_use]
    pub fn to_slice_n(&self) -> Vec<Range<i64>> {
        self.no_halo.to_slice()
    }

    /// Alias of [`HaloIndexingExtent::to_slice_n`].
    #[must_use]
    pub fn to_slice(&self) -> Vec<Range<i64>> {
        self.to_slice_n()
    }

    /// Per-axis half-open ranges of the with-halo box.
    #[must_use]
    pub fn to_slice_h(&self) -> Vec<Range<i64>> {
        self.start_h()
            .iter()
            .zip(self.stop_h())
            .map(|(&s, e)| s..e)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext(start: &[i64], stop: &[i64]) -> IndexingExtent {
        IndexingExtent::new(start.to_vec(), stop.to_vec()).unwrap()
    }

    #[test]
    fn shape_and_size() {
        let e = ext(&[10], &[32]);
        assert_eq!(e.shape(), vec![22]);
        assert_eq!(e.size(), 22);
    }

    #[test]
    fn intersection_1d() {
        let a = ext(&[10], &[32]);

        let b = ext(&[5], &[32]);
        assert_eq!(a.intersect(&b), Some(ext(&[10], &[32])));

        let b = ext(&[11], &[31]);
        assert_eq!(a.intersect(&b), Some(ext(&[11], &[31])));

        let b = ext(&[5], &[10]);
        assert_eq!(a.intersect(&b), None);

        let b = ext(&[32], &[55]);
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn intersection_2d_corner() {
        let a = ext(&[10, 20], &[32, 64]);
        let b = ext(&[22, 54], &[80, 90]);
        assert_eq!(a.intersect(&b), Some(ext(&[22, 54], &[32, 64])));
    }

    #[test]
    fn halo_extent_attributes() {
        let hie = HaloIndexingExtent::new(ext(&[10, 3], &[32, 20]), vec![[1, 2], [3, 4]]).unwrap();
        assert_eq!(hie.start_n(), &[10, 3]);
        assert_eq!(hie.start_h(), vec![9, 0]);
        assert_eq!(hie.stop_n(), &[32, 20]);
        assert_eq!(hie.stop_h(), vec![34, 24]);
        assert_eq!(hie.shape_n(), vec![22, 17]);
        assert_eq!(hie.shape_h(), vec![25, 24]);
        assert_eq!(hie.size_n(), 22 * 17);
        assert_eq!(hie.size_h(), 25 * 24);
    }

    #[test]
    fn halo_extent_slices() {
        let hie = HaloIndexingExtent::new(ext(&[10, 3], &[32, 20]), vec![[1, 2], [3, 4]]).unwrap();
        assert_eq!(hie.to_slice_n(), vec![10..32, 3..20]);
        assert_eq!(hie.to_slice(), vec![10..32, 3..20]);
        assert_eq!(hie.to_slice_h(), vec![9..34, 0..24]);
    }

    #[test]
    fn no_halo_round_trips_through_slices() {
        let e = ext(&[10, 25], &[32, 55]);
        let round = IndexingExtent::from_slices(&e.to_slice()).unwrap();
        assert_eq!(e, round);
    }

    #[test]
    fn global_to_local_translation() {
        let e = ext(&[9, 0], &[34, 24]);
        let inner = ext(&[10, 3], &[32, 20]);
        let local = e.global_to_local_extent(&inner).unwrap();
        assert_eq!(local, ext(&[1, 3], &[23, 20]));
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::IndexingExtent;

    fn arb_extent(max_ndim: usize, max_coord: i64) -> impl Strategy<Value = IndexingExtent> {
        (1..=max_ndim).prop_flat_map(move |ndim| {
            prop::collection::vec((-max_coord..max_coord, 0..max_coord), ndim).prop_map(|axes| {
                let start = axes.iter().map(|&(s, _)| s).collect();
                let stop = axes.iter().map(|&(s, len)| s + len).collect();
                IndexingExtent::new(start, stop).unwrap()
            })
        })
    }

    proptest! {
        /// P4: `IndexingExtent::from_slices(e.to_slice()) == e` for any box.
        #[test]
        fn round_trip_through_slices(e in arb_extent(3, 50)) {
            let round = IndexingExtent::from_slices(&e.to_slice()).unwrap();
            prop_assert_eq!(e, round);
        }

        /// Intersection is commutative and its size never exceeds either
        /// operand's.
        #[test]
        fn intersection_is_commutative_and_bounded(a in arb_extent(3, 50), b in arb_extent(3, 50)) {
            if a.ndim() == b.ndim() {
                let ab = a.intersect(&b);
                let ba = b.intersect(&a);
                prop_assert_eq!(ab.clone(), ba);
                if let Some(overlap) = ab {
                    prop_assert!(overlap.size() <= a.size());
                    prop_assert!(overlap.size() <= b.size());
                }
            }
        }
    }
}
