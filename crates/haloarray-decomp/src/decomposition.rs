//! The full mesh of per-tile extents, and the halo-exchange plan derived
//! from it (spec §4.6).

use haloarray_core::{HaloSpec, IndexingExtent, Result, Side};
use haloarray_topology::{LocaleTopology, Transport};

use crate::extent::DecompositionExtent;
use crate::shape_split::{coord_to_rank, split_shape};

/// One inbound transfer a tile must receive to fill a single halo face.
///
/// `src_box`/`dst_box` are equal and given in *global* array coordinates;
/// the receiver translates `dst_box` into its own local buffer via
/// [`DecompositionExtent::global_to_local_extent_h`], and the sender
/// translates `src_box` into the peer's local buffer the same way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeEntry {
    /// The Cartesian rank on the other end of this transfer.
    pub peer_cart_rank: i32,
    /// The halo axis this transfer fills.
    pub axis: usize,
    /// The halo side this transfer fills.
    pub side: Side,
    /// The transferred box, in global coordinates.
    pub global_box: IndexingExtent,
}

/// The mesh of per-tile [`DecompositionExtent`]s for one `(topology, shape,
/// halo)` triple, plus on-demand halo-exchange plan computation.
#[derive(Clone)]
pub struct Decomposition<T: Transport> {
    topology: LocaleTopology<T>,
    shape: Vec<i64>,
    halo: Vec<[u64; 2]>,
    extents: Vec<DecompositionExtent>,
}

impl<T: Transport> Decomposition<T> {
    /// Build a decomposition of `shape` over `topology`'s Cartesian mesh.
    ///
    /// # Errors
    /// Returns [`haloarray_core::Error::Configuration`] if `shape`'s rank
    /// does not match the topology's, the `halo` spec's rank does not match
    /// `shape`'s, or `shape` has fewer elements along some axis than the
    /// mesh has cells.
    pub fn new(topology: LocaleTopology<T>, shape: Vec<i64>, halo_spec: &HaloSpec) -> Result<Self> {
        let halo = haloarray_core::normalize_halo(halo_spec, shape.len())?;
        let extents = Self::build_extents(&topology, &shape, &halo)?;
        Ok(Self {
            topology,
            shape,
            halo,
            extents,
        })
    }

    fn build_extents(
        topology: &LocaleTopology<T>,
        shape: &[i64],
        halo: &[[u64; 2]],
    ) -> Result<Vec<DecompositionExtent>> {
        let dims = topology.dims();
        let periods = topology.periods();
        let slices = split_shape(shape, dims)?;
        let num_ranks: u32 = dims.iter().product();
        (0..num_ranks)
            .map(|rank| {
                let coord = crate::shape_split::rank_to_coord(rank, dims);
                DecompositionExtent::new(
                    i32::try_from(rank).unwrap_or(i32::MAX),
                    coord,
                    dims.to_vec(),
                    shape.to_vec(),
                    slices[rank as usize].clone(),
                    halo,
                    periods,
                )
            })
            .collect()
    }

    /// Replace the array shape and rebuild every tile's extent.
    ///
    /// # Errors
    /// See [`Decomposition::new`].
    pub fn set_shape(&mut self, shape: Vec<i64>) -> Result<()> {
        let extents = Self::build_extents(&self.topology, &shape, &self.halo)?;
        self.shape = shape;
        self.extents = extents;
        Ok(())
    }

    /// Replace the halo spec and rebuild every tile's extent.
    ///
    /// # Errors
    /// See [`Decomposition::new`].
    pub fn set_halo(&mut self, halo_spec: &HaloSpec) -> Result<()> {
        let halo = haloarray_core::normalize_halo(halo_spec, self.shape.len())?;
        let extents = Self::build_extents(&self.topology, &self.shape, &halo)?;
        self.halo = halo;
        self.extents = extents;
        Ok(())
    }

    /// The underlying Cartesian-mesh topology.
    #[must_use]
    pub fn topology(&self) -> &LocaleTopology<T> {
        &self.topology
    }

    /// The global array shape.
    #[must_use]
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// The normalized, unclipped halo widths requested at construction.
    #[must_use]
    pub fn halo(&self) -> &[[u64; 2]] {
        &self.halo
    }

    /// Every tile's extent, indexed by Cartesian rank.
    #[must_use]
    pub fn extents(&self) -> &[DecompositionExtent] {
        &self.extents
    }

    /// The extent owned by Cartesian rank `cart_rank`.
    #[must_use]
    pub fn local_extent(&self, cart_rank: i32) -> &DecompositionExtent {
        &self.extents[cart_rank as usize]
    }

    /// The extent owned by the Cartesian coordinate `coord`.
    #[must_use]
    pub fn extent_at(&self, coord: &[u32]) -> &DecompositionExtent {
        let rank = coord_to_rank(coord, self.topology.dims());
        self.local_extent(i32::try_from(rank).unwrap_or(i32::MAX))
    }

    /// The set of inbound transfers `cart_rank` needs to fill every halo
    /// face of its tile.
    ///
    /// Implements the "onion-peel" de-duplication order of spec §4.6 step
    /// 4: axes are processed in order, and each axis's halo slab excludes
    /// the portion already covered by a lower-numbered axis's authoritative
    /// span, so a corner cell that could be filled by more than one
    /// neighbor is attributed to exactly one transfer.
    #[must_use]
    pub fn inbound_plan(&self, cart_rank: i32) -> Vec<ExchangeEntry> {
        let tile = self.local_extent(cart_rank);
        let ndims = self.shape.len();
        let mut entries = Vec::new();

        for axis in 0..ndims {
            for side in Side::ALL {
                let h = tile.halo()[axis][usize::from(side)];
                if h == 0 {
                    continue;
                }

                let mut slab = Some(tile.halo_slab_extent(axis, usize::from(side)));
                for prior_axis in 0..axis {
                    slab = slab.and_then(|s| s.intersect(&tile.no_halo_extent(prior_axis)));
                    if slab.is_none() {
                        break;
                    }
                }
                let Some(slab) = slab else { continue };
                if slab.is_empty() {
                    continue;
                }

                for peer in &self.extents {
                    if peer.cart_rank() == cart_rank {
                        continue;
                    }
                    if let Some(overlap) = slab.intersect(&peer.authoritative_box()) {
                        entries.push(ExchangeEntry {
                            peer_cart_rank: peer.cart_rank(),
                            axis,
                            side,
                            global_box: overlap,
                        });
                    }
                }
            }
        }

        entries
    }

    /// The set of outbound transfers `cart_rank` must send, derived from
    /// every other tile's [`Decomposition::inbound_plan`].
    #[must_use]
    pub fn outbound_plan(&self, cart_rank: i32) -> Vec<ExchangeEntry> {
        let mut out = Vec::new();
        for peer in &self.extents {
            if peer.cart_rank() == cart_rank {
                continue;
            }
            for entry in self.inbound_plan(peer.cart_rank()) {
                if entry.peer_cart_rank == cart_rank {
                    out.push(ExchangeEntry {
                        peer_cart_rank: peer.cart_rank(),
                        axis: entry.axis,
                        side: entry.side,
                        global_box: entry.global_box,
                    });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use haloarray_core::HaloSpec;
    use haloarray_topology::{LocalTransport, LocaleTopology};

    use super::Decomposition;

    /// Build a `Decomposition` over a trivially-available single-rank
    /// transport handle. `extents()`/`inbound_plan`/`outbound_plan` are
    /// pure functions of `(shape, dims, halo)` — they need no actual
    /// message passing between simulated ranks, so one arbitrary
    /// participant's topology handle is enough to inspect every tile.
    fn build(shape: Vec<i64>, dims: Vec<u32>, halo: u64) -> Decomposition<LocalTransport> {
        let world_size: u32 = dims.iter().product();
        let transports = LocalTransport::hub(world_size as usize);
        let transport = &transports[0];
        let world = transport.world();
        let topology = LocaleTopology::new(transport, world, None, Some(dims), None, None).unwrap();
        Decomposition::new(topology, shape, &HaloSpec::Scalar(halo)).unwrap()
    }

    proptest! {
        /// P1: authoritative boxes tile the global array exactly — pairwise
        /// disjoint, and their sizes sum to the global element count.
        #[test]
        fn authoritative_boxes_are_disjoint_and_cover_the_shape(
            len in 1i64..64, parts in 1u32..9, halo in 0u64..5,
        ) {
            let decomp = build(vec![len], vec![parts], halo);
            let extents = decomp.extents();

            for (i, a) in extents.iter().enumerate() {
                for b in &extents[i + 1..] {
                    prop_assert!(a.authoritative_box().intersect(&b.authoritative_box()).is_none());
                }
            }
            let total: i64 = extents.iter().map(|e| e.authoritative_box().shape()[0]).sum();
            prop_assert_eq!(total, len);
        }

        /// P2: a tile sitting on a non-periodic global boundary face
        /// carries zero clipped halo on that face.
        #[test]
        fn boundary_faces_carry_no_halo_when_non_periodic(
            len in 3i64..64, parts in 1u32..9, halo in 1u64..10,
        ) {
            let decomp = build(vec![len], vec![parts], halo);
            let extents = decomp.extents();
            let first = &extents[0];
            let last = &extents[extents.len() - 1];
            prop_assert_eq!(first.halo()[0][haloarray_core::LO], 0);
            prop_assert_eq!(last.halo()[0][haloarray_core::HI], 0);
        }

        /// P3: for every tile and axis, LO-slab ∪ no-halo-slab ∪ HI-slab
        /// reconstructs the with-halo box exactly, with disjoint interiors.
        #[test]
        fn halo_slabs_partition_the_with_halo_box(
            len in 3i64..64, parts in 1u32..9, halo in 0u64..10,
        ) {
            let decomp = build(vec![len], vec![parts], halo);
            for tile in decomp.extents() {
                let lo = tile.halo_slab_extent(0, haloarray_core::LO);
                let mid = tile.no_halo_extent(0);
                let hi = tile.halo_slab_extent(0, haloarray_core::HI);

                prop_assert!(lo.intersect(&mid).is_none());
                prop_assert!(mid.intersect(&hi).is_none());
                prop_assert!(lo.intersect(&hi).is_none());

                let with_halo = tile.with_halo_box();
                let total = lo.shape()[0] + mid.shape()[0] + hi.shape()[0];
                prop_assert_eq!(total, with_halo.shape()[0]);
            }
        }

        /// P5/P6: every inbound transfer is exactly covered by some peer's
        /// authoritative box, and no two entries in a tile's own plan
        /// overlap (the onion-peel rule's whole purpose).
        #[test]
        fn exchange_plan_is_exact_and_non_overlapping(
            len in 3i64..64, parts in 1u32..9, halo in 0u64..10,
        ) {
            let decomp = build(vec![len], vec![parts], halo);
            for tile in decomp.extents() {
                let plan = decomp.inbound_plan(tile.cart_rank());
                for entry in &plan {
                    let peer = decomp.local_extent(entry.peer_cart_rank);
                    prop_assert_eq!(
                        peer.authoritative_box().intersect(&entry.global_box),
                        Some(entry.global_box.clone())
                    );
                }
                for (i, a) in plan.iter().enumerate() {
                    for b in &plan[i + 1..] {
                        prop_assert!(a.global_box.intersect(&b.global_box).is_none());
                    }
                }
            }
        }
    }
}
