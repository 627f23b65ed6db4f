//! Driving a [`Decomposition`]'s exchange plan against a [`Transport`]
//! (spec §4.7): representative-only inter-locale transfers, bracketed by an
//! intra-locale barrier so non-representative participants observe a
//! consistent with-halo buffer once the barrier releases.

use haloarray_core::{Result, Side};
use haloarray_decomp::Decomposition;
use haloarray_topology::Transport;

use crate::buffer::HaloBuffer;

/// Pack `(sender, receiver, axis, side)` into a tag unique to one
/// direction of one face of one axis between one pair of Cartesian ranks.
///
/// Cartesian ranks are assumed to fit in 16 bits (64k locales); `axis` in 8
/// bits (256 axes). Both are generous beyond any realistic mesh.
fn encode_tag(sender: i32, receiver: i32, axis: usize, side: Side) -> u64 {
    let sender = u64::from(sender as u32 & 0xFFFF);
    let receiver = u64::from(receiver as u32 & 0xFFFF);
    let axis = u64::try_from(axis).unwrap_or(0) & 0xFF;
    let side = u64::from(usize::from(side) as u8);
    (sender << 32) | (receiver << 16) | (axis << 8) | side
}

/// Executes one full halo exchange for a single Cartesian rank's tile.
pub struct HaloExchanger;

impl HaloExchanger {
    /// Fill every halo face of `cart_rank`'s tile in `buffer` from its
    /// neighbors' authoritative data, and send `cart_rank`'s own
    /// authoritative data to every neighbor that needs it.
    ///
    /// Only the locale's representative (`topology.is_representative()`)
    /// touches the `Transport`; every participant, representative or not,
    /// waits on the intra-locale group's barrier both before the transfer
    /// (so no one reads a half-written buffer from the previous exchange)
    /// and after it (so no one proceeds before the representative has
    /// finished writing received halo data into the shared buffer).
    ///
    /// # Errors
    /// Returns an error if translating an exchange-plan box into the
    /// tile's local coordinate space fails (an
    /// [`haloarray_core::Error::InternalInvariant`]: the plan is expected to
    /// only ever produce boxes within the tile's with-halo extent).
    pub fn exchange<T, B>(
        decomposition: &Decomposition<T>,
        cart_rank: i32,
        transport: &T,
        buffer: &mut B,
    ) -> Result<()>
    where
        T: Transport,
        B: HaloBuffer,
    {
        let topology = decomposition.topology();
        let intra = topology.shared_locale_info().intra_locale_group();
        transport.barrier(intra);

        if topology.is_representative() {
            let tile = decomposition.local_extent(cart_rank);
            let inter = topology.inter_locale_group();

            for entry in decomposition.outbound_plan(cart_rank) {
                let local_box = tile.global_to_local_extent_h(&entry.global_box)?;
                let payload = buffer.extract(&local_box);
                let tag = encode_tag(cart_rank, entry.peer_cart_rank, entry.axis, entry.side);
                tracing::trace!(
                    dest = entry.peer_cart_rank,
                    axis = entry.axis,
                    ?entry.side,
                    bytes = payload.len(),
                    "sending halo slab"
                );
                transport.send(inter, entry.peer_cart_rank, tag, payload);
            }

            for entry in decomposition.inbound_plan(cart_rank) {
                let local_box = tile.global_to_local_extent_h(&entry.global_box)?;
                let tag = encode_tag(entry.peer_cart_rank, cart_rank, entry.axis, entry.side);
                let payload = transport.recv(inter, entry.peer_cart_rank, tag);
                tracing::trace!(
                    src = entry.peer_cart_rank,
                    axis = entry.axis,
                    ?entry.side,
                    bytes = payload.len(),
                    "received halo slab"
                );
                buffer.inject(&local_box, &payload);
            }
        }

        transport.barrier(intra);
        Ok(())
    }
}
