//! The storage-agnostic seam between a decomposition's exchange plan and an
//! actual per-tile with-halo buffer.

use haloarray_core::IndexingExtent;

/// A per-tile with-halo buffer that can serialize/deserialize an arbitrary
/// sub-box of itself to/from bytes.
///
/// `haloarray-exchange` never needs to know the element type or row-major
/// layout of the buffer it drives; [`HaloExchanger`](crate::HaloExchanger)
/// only ever asks for `local_box`, expressed in the buffer's own
/// with-halo-local coordinate space (see
/// [`DecompositionExtent::global_to_local_extent_h`](haloarray_decomp::DecompositionExtent::global_to_local_extent_h)).
pub trait HaloBuffer {
    /// Serialize `local_box` (row-major over the buffer's own axis order)
    /// into a byte payload suitable for [`haloarray_topology::Transport::send`].
    fn extract(&self, local_box: &IndexingExtent) -> Vec<u8>;

    /// Deserialize `data` (as produced by a peer's
    /// [`HaloBuffer::extract`] of the same box) into `local_box`.
    fn inject(&mut self, local_box: &IndexingExtent, data: &[u8]);
}
