//! [`GlobalArray`]: the user-facing distributed array (spec §4.8).

use haloarray_core::{Error, HaloSpec, Result};
use haloarray_decomp::Decomposition;
use haloarray_exchange::HaloExchanger;
use haloarray_topology::{LocaleTopology, Transport};

use crate::layout::row_major_strides;
use crate::storage::Storage;
use crate::view::RankView;

/// A distributed array: one [`Decomposition`] tile's worth of data per
/// participant, with `update` performing the halo exchange and `copyto`
/// redistributing authoritative data into a differently-decomposed array
/// over the same [`Transport`] group.
pub struct GlobalArray<T, Tr: Transport> {
    decomposition: Decomposition<Tr>,
    transport: Tr,
    cart_rank: i32,
    storage: Storage<T>,
}

impl<T, Tr> GlobalArray<T, Tr>
where
    T: bytemuck::Pod,
    Tr: Transport,
{
    fn new_filled(transport: Tr, topology: LocaleTopology<Tr>, shape: Vec<i64>, halo: &HaloSpec, fill: T) -> Result<Self> {
        let cart_rank = topology.inter_locale_group().rank();
        let decomposition = Decomposition::new(topology, shape, halo)?;
        let with_halo_shape = decomposition.local_extent(cart_rank).with_halo_box().shape();
        Ok(Self {
            decomposition,
            transport,
            cart_rank,
            storage: Storage::filled(with_halo_shape, fill),
        })
    }

    /// Allocate a distributed array of `shape` filled with `T::default()`.
    ///
    /// # Errors
    /// See [`Decomposition::new`].
    pub fn empty(transport: Tr, topology: LocaleTopology<Tr>, shape: Vec<i64>, halo: &HaloSpec) -> Result<Self>
    where
        T: Default,
    {
        Self::new_filled(transport, topology, shape, halo, T::default())
    }

    /// Allocate a distributed array of `shape` filled with zero.
    ///
    /// # Errors
    /// See [`Decomposition::new`].
    pub fn zeros(transport: Tr, topology: LocaleTopology<Tr>, shape: Vec<i64>, halo: &HaloSpec) -> Result<Self>
    where
        T: num_traits::Zero,
    {
        Self::new_filled(transport, topology, shape, halo, T::zero())
    }

    /// Allocate a distributed array of `shape` filled with one.
    ///
    /// # Errors
    /// See [`Decomposition::new`].
    pub fn ones(transport: Tr, topology: LocaleTopology<Tr>, shape: Vec<i64>, halo: &HaloSpec) -> Result<Self>
    where
        T: num_traits::One,
    {
        Self::new_filled(transport, topology, shape, halo, T::one())
    }

    /// Allocate a new array sharing `other`'s topology, shape, and halo
    /// width, filled with `T::default()`.
    ///
    /// # Errors
    /// See [`Decomposition::new`].
    pub fn empty_like(other: &Self) -> Result<Self>
    where
        T: Default,
        Tr: Clone,
    {
        Self::new_filled(
            other.transport.clone(),
            other.decomposition.topology().clone(),
            other.decomposition.shape().to_vec(),
            &HaloSpec::Matrix(other.decomposition.halo().to_vec()),
            T::default(),
        )
    }

    /// As [`GlobalArray::empty_like`], filled with zero.
    ///
    /// # Errors
    /// See [`Decomposition::new`].
    pub fn zeros_like(other: &Self) -> Result<Self>
    where
        T: num_traits::Zero,
        Tr: Clone,
    {
        Self::new_filled(
            other.transport.clone(),
            other.decomposition.topology().clone(),
            other.decomposition.shape().to_vec(),
            &HaloSpec::Matrix(other.decomposition.halo().to_vec()),
            T::zero(),
        )
    }

    /// As [`GlobalArray::empty_like`], filled with one.
    ///
    /// # Errors
    /// See [`Decomposition::new`].
    pub fn ones_like(other: &Self) -> Result<Self>
    where
        T: num_traits::One,
        Tr: Clone,
    {
        Self::new_filled(
            other.transport.clone(),
            other.decomposition.topology().clone(),
            other.decomposition.shape().to_vec(),
            &HaloSpec::Matrix(other.decomposition.halo().to_vec()),
            T::one(),
        )
    }

    /// This participant's Cartesian rank.
    #[must_use]
    pub fn cart_rank(&self) -> i32 {
        self.cart_rank
    }

    /// The decomposition this array is built over.
    #[must_use]
    pub fn decomposition(&self) -> &Decomposition<Tr> {
        &self.decomposition
    }

    fn tile(&self) -> &haloarray_decomp::DecompositionExtent {
        self.decomposition.local_extent(self.cart_rank)
    }

    /// Read the element at global index `idx`.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] if `idx` falls outside this
    /// participant's with-halo box.
    pub fn get(&self, idx: &[i64]) -> Result<T> {
        let local = self.tile().global_to_local(idx)?;
        self.bounds_check(&local)?;
        Ok(self.storage.get(&local))
    }

    /// Write `value` at global index `idx`.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] if `idx` falls outside this
    /// participant's with-halo box.
    pub fn set(&mut self, idx: &[i64], value: T) -> Result<()> {
        let local = self.tile().global_to_local(idx)?;
        self.bounds_check(&local)?;
        self.storage.set(&local, value);
        Ok(())
    }

    fn bounds_check(&self, local: &[i64]) -> Result<()> {
        let shape = self.storage.shape();
        for (d, &i) in local.iter().enumerate() {
            if i < 0 || i >= shape[d] {
                return Err(Error::argument(format!(
                    "index out of this rank's with-halo box on axis {d}"
                )));
            }
        }
        Ok(())
    }

    /// A read-only view of this participant's authoritative (no-halo)
    /// region.
    #[must_use]
    pub fn rank_view_n(&self) -> RankView<'_, T> {
        let tile = self.tile();
        let origin = tile.global_to_local(tile.authoritative_box().start()).expect("authoritative box is within the with-halo box");
        let strides = row_major_strides(self.storage.shape());
        let offset: i64 = origin.iter().zip(&strides).map(|(&o, &s)| o * s).sum();
        RankView::new(tile.authoritative_box().shape(), offset, strides, self.storage.as_slice())
    }

    /// A read-only view of this participant's full with-halo region.
    #[must_use]
    pub fn rank_view_h(&self) -> RankView<'_, T> {
        let strides = row_major_strides(self.storage.shape());
        RankView::new(self.storage.shape().to_vec(), 0, strides, self.storage.as_slice())
    }

    /// Run one halo exchange, filling every halo face of this
    /// participant's tile from its neighbors' authoritative data.
    ///
    /// # Errors
    /// See [`HaloExchanger::exchange`].
    pub fn update(&mut self) -> Result<()> {
        HaloExchanger::exchange(&self.decomposition, self.cart_rank, &self.transport, &mut self.storage)
    }

    /// Redistribute this array's authoritative data into `dest`, whose
    /// decomposition may differ (different `dims`/halo/shape split) but
    /// which must be built over the same [`Transport`] rank group as
    /// `self`. Every source authoritative box is intersected against every
    /// destination tile's full with-halo box, so `dest`'s halo margin is
    /// populated by this call whenever a source tile's authoritative data
    /// overlaps it, not just `dest`'s no-halo interior.
    ///
    /// # Errors
    /// Returns [`Error::InternalInvariant`] if translating an overlap box
    /// into local coordinates fails (indicates `dest` is not actually over
    /// the same global shape as `self`).
    pub fn copyto(&self, dest: &mut Self) -> Result<()> {
        let my_topology = self.decomposition.topology();
        let dest_topology = dest.decomposition.topology();

        if my_topology.is_representative() {
            let my_tile = self.tile();
            let inter = my_topology.inter_locale_group();
            for dest_tile in dest.decomposition.extents() {
                if let Some(overlap) = my_tile.authoritative_box().intersect(&dest_tile.with_halo_box()) {
                    let local_box = my_tile.global_to_local_extent_h(&overlap)?;
                    let payload = haloarray_exchange::HaloBuffer::extract(&self.storage, &local_box);
                    let tag = copy_tag(my_tile.cart_rank(), dest_tile.cart_rank());
                    self.transport.send(inter, dest_tile.cart_rank(), tag, payload);
                }
            }
        }
        my_topology_barrier(my_topology, &self.transport);

        if dest_topology.is_representative() {
            let dest_rank = dest.cart_rank;
            let dest_tile = dest.decomposition.local_extent(dest_rank);
            let inter = dest_topology.inter_locale_group();
            for src_tile in self.decomposition.extents() {
                if let Some(overlap) = dest_tile.with_halo_box().intersect(&src_tile.authoritative_box()) {
                    let local_box = dest_tile.global_to_local_extent_h(&overlap)?;
                    let tag = copy_tag(src_tile.cart_rank(), dest_rank);
                    let payload = dest.transport.recv(inter, src_tile.cart_rank(), tag);
                    haloarray_exchange::HaloBuffer::inject(&mut dest.storage, &local_box, &payload);
                }
            }
        }
        my_topology_barrier(dest_topology, &dest.transport);
        Ok(())
    }
}

fn my_topology_barrier<Tr: Transport>(topology: &LocaleTopology<Tr>, transport: &Tr) {
    transport.barrier(topology.shared_locale_info().intra_locale_group());
}

/// `copyto` uses its own tag namespace (high bit set) so it can never
/// collide with a halo-exchange tag from [`haloarray_exchange`] sharing the
/// same pair of Cartesian ranks.
fn copy_tag(src: i32, dest: i32) -> u64 {
    let src = u64::from(src as u32 & 0xFFFF);
    let dest = u64::from(dest as u32 & 0xFFFF);
    (1 << 63) | (src << 32) | (dest << 16)
}
