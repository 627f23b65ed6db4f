//! Per-tile halo geometry (spec §4.5).

use haloarray_core::{Error, HaloIndexingExtent, IndexingExtent, Result, HI, LO};

/// One locale's slice of a decomposed array: its authoritative (no-halo)
/// box, the halo actually available to it once clipped against the global
/// shape and non-periodic outer faces, and enough Cartesian-mesh context
/// (`cart_rank`/`cart_coord`/`cart_shape`) to address its neighbors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecompositionExtent {
    cart_rank: i32,
    cart_coord: Vec<u32>,
    cart_shape: Vec<u32>,
    array_shape: Vec<i64>,
    hie: HaloIndexingExtent,
}

impl DecompositionExtent {
    /// Build a tile from its Cartesian-mesh position and its requested
    /// (unclipped) `halo`. The halo actually stored is clipped so that it
    /// never reaches outside `array_shape` on a non-periodic outer face.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if `cart_coord`/`cart_shape`/
    /// `array_shape`/`halo`/`periods` have inconsistent lengths, or if
    /// `authoritative` falls outside `array_shape`.
    pub fn new(
        cart_rank: i32,
        cart_coord: Vec<u32>,
        cart_shape: Vec<u32>,
        array_shape: Vec<i64>,
        authoritative: IndexingExtent,
        halo: &[[u64; 2]],
        periods: &[bool],
    ) -> Result<Self> {
        let ndims = array_shape.len();
        if cart_coord.len() != ndims || cart_shape.len() != ndims || halo.len() != ndims || periods.len() != ndims
        {
            return Err(Error::configuration(format!(
                "inconsistent axis counts building decomposition extent: array_shape={ndims}, \
                 cart_coord={}, cart_shape={}, halo={}, periods={}",
                cart_coord.len(),
                cart_shape.len(),
                halo.len(),
                periods.len()
            )));
        }

        let mut clipped = Vec::with_capacity(ndims);
        for d in 0..ndims {
            let at_lo_face = cart_coord[d] == 0 && !periods[d];
            let at_hi_face = cart_coord[d] == cart_shape[d].saturating_sub(1) && !periods[d];

            let mut lo = if at_lo_face { 0 } else { halo[d][LO] };
            let mut hi = if at_hi_face { 0 } else { halo[d][HI] };

            if !periods[d] {
                let start_n = u64::try_from(authoritative.start()[d]).map_err(|_| {
                    Error::configuration(format!("axis {d} authoritative start is negative"))
                })?;
                lo = lo.min(start_n);

                let avail_hi = array_shape[d] - authoritative.stop()[d];
                let avail_hi = u64::try_from(avail_hi).map_err(|_| {
                    Error::configuration(format!(
                        "axis {d} authoritative stop {} exceeds array shape {}",
                        authoritative.stop()[d],
                        array_shape[d]
                    ))
                })?;
                hi = hi.min(avail_hi);
            }

            clipped.push([lo, hi]);
        }

        let hie = HaloIndexingExtent::new(authoritative, clipped)?;

        Ok(Self {
            cart_rank,
            cart_coord,
            cart_shape,
            array_shape,
            hie,
        })
    }

    /// This tile's rank in the Cartesian mesh.
    #[must_use]
    pub fn cart_rank(&self) -> i32 {
        self.cart_rank
    }

    /// This tile's coordinate in the Cartesian mesh.
    #[must_use]
    pub fn cart_coord(&self) -> &[u32] {
        &self.cart_coord
    }

    /// The mesh's per-axis locale counts.
    #[must_use]
    pub fn cart_shape(&self) -> &[u32] {
        &self.cart_shape
    }

    /// The global array shape this tile is cut from.
    #[must_use]
    pub fn array_shape(&self) -> &[i64] {
        &self.array_shape
    }

    /// The clipped per-axis, per-side halo actually carried by this tile.
    #[must_use]
    pub fn halo(&self) -> &[[u64; 2]] {
        self.hie.halo()
    }

    /// The authoritative (no-halo) box, in global coordinates.
    #[must_use]
    pub fn authoritative_box(&self) -> IndexingExtent {
        self.hie.no_halo_box().clone()
    }

    /// The authoritative box plus the clipped halo, in global coordinates.
    #[must_use]
    pub fn with_halo_box(&self) -> IndexingExtent {
        self.hie.with_halo_box()
    }

    /// The slab of the with-halo box that lies strictly on `side` of
    /// `axis`, spanning the full with-halo extent of every other axis.
    /// Empty if this tile carries no halo on that face.
    #[must_use]
    pub fn halo_slab_extent(&self, axis: usize, side: usize) -> IndexingExtent {
        let with_halo = self.hie.with_halo_box();
        let mut start = with_halo.start().to_vec();
        let mut stop = with_halo.stop().to_vec();
        let start_n = self.hie.start_n()[axis];
        let stop_n = self.hie.stop_n()[axis];
        let h = self.hie.halo()[axis];
        if side == LO {
            stop[axis] = start_n;
            start[axis] = start_n - i64::try_from(h[LO]).unwrap_or(i64::MAX);
        } else {
            start[axis] = stop_n;
            stop[axis] = stop_n + i64::try_from(h[HI]).unwrap_or(i64::MAX);
        }
        IndexingExtent::new(start, stop).expect("same ndim as with_halo box")
    }

    /// The with-halo box restricted to the authoritative range of `axis`,
    /// i.e. the with-halo box minus its halo margin on that one axis.
    #[must_use]
    pub fn no_halo_extent(&self, axis: usize) -> IndexingExtent {
        let with_halo = self.hie.with_halo_box();
        let mut start = with_halo.start().to_vec();
        let mut stop = with_halo.stop().to_vec();
        start[axis] = self.hie.start_n()[axis];
        stop[axis] = self.hie.stop_n()[axis];
        IndexingExtent::new(start, stop).expect("same ndim as with_halo box")
    }

    /// Translate a global index into this tile's local (with-halo buffer)
    /// coordinate space.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] on a dimensionality mismatch.
    pub fn global_to_local(&self, idx: &[i64]) -> Result<Vec<i64>> {
        self.hie.with_halo_box().global_to_local(idx)
    }

    /// Translate a global box into this tile's local (with-halo buffer)
    /// coordinate space.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] on a dimensionality mismatch.
    pub fn global_to_local_extent_h(&self, other: &IndexingExtent) -> Result<IndexingExtent> {
        self.hie.with_halo_box().global_to_local_extent(other)
    }
}
