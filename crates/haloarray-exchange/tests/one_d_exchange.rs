//! End-to-end 1-D halo exchange over a real multi-thread `LocalTransport`.

use std::sync::mpsc;
use std::thread;

use haloarray_core::{HaloSpec, IndexingExtent};
use haloarray_decomp::Decomposition;
use haloarray_exchange::{HaloBuffer, HaloExchanger};
use haloarray_topology::{LocalTransport, LocaleTopology};

/// A 1-D with-halo buffer storing each cell's own global index, used so a
/// halo cell's post-exchange value can be checked against the neighbor's
/// global index directly.
struct IndexBuffer {
    data: Vec<f64>,
}

impl HaloBuffer for IndexBuffer {
    fn extract(&self, local_box: &IndexingExtent) -> Vec<u8> {
        let start = local_box.start()[0] as usize;
        let stop = local_box.stop()[0] as usize;
        self.data[start..stop]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    fn inject(&mut self, local_box: &IndexingExtent, data: &[u8]) {
        let start = local_box.start()[0] as usize;
        let stop = local_box.stop()[0] as usize;
        let values: Vec<f64> = data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        self.data[start..stop].copy_from_slice(&values);
    }
}

#[test]
fn halo_cells_fill_with_neighbor_global_indices() {
    const SENTINEL: f64 = -1.0;
    let transports = LocalTransport::hub(3);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for transport in transports {
            let tx = tx.clone();
            scope.spawn(move || {
                let world = transport.world();
                let topology =
                    LocaleTopology::new(&transport, world, None, Some(vec![3]), None, None).unwrap();
                let cart_rank = topology.inter_locale_group().rank();
                let decomp = Decomposition::new(topology, vec![300], &HaloSpec::Scalar(10)).unwrap();
                let tile = decomp.local_extent(cart_rank);

                let with_halo = tile.with_halo_box();
                let len = with_halo.shape()[0] as usize;
                let mut buffer = IndexBuffer {
                    data: vec![SENTINEL; len],
                };
                for g in tile.authoritative_box().to_slice()[0].clone() {
                    let local = tile.global_to_local(&[g]).unwrap()[0] as usize;
                    buffer.data[local] = g as f64;
                }

                HaloExchanger::exchange(&decomp, cart_rank, &transport, &mut buffer).unwrap();

                tx.send((cart_rank, with_halo, buffer.data)).unwrap();
            });
        }
    });
    drop(tx);

    for (_, with_halo, data) in rx {
        let start = with_halo.start()[0];
        for (i, &v) in data.iter().enumerate() {
            assert_ne!(v, -1.0, "halo cell at global index {} was never filled", start + i as i64);
            assert_eq!(
                v,
                (start + i as i64) as f64,
                "cell at global index {} holds the wrong value",
                start + i as i64
            );
        }
    }
}
