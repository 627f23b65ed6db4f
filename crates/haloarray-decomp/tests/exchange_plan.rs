//! Exchange-plan scenarios against a real multi-thread [`LocalTransport`].

use std::sync::mpsc;
use std::thread;

use haloarray_core::{HaloSpec, Side};
use haloarray_decomp::{Decomposition, ExchangeEntry};
use haloarray_topology::{LocalTransport, LocaleTopology};

fn run_decomposition<F, R>(world_size: usize, shape: Vec<i64>, dims: Vec<u32>, halo: HaloSpec, f: F) -> Vec<R>
where
    F: Fn(i32, &Decomposition<LocalTransport>) -> R + Send + Sync,
    R: Send,
{
    let transports = LocalTransport::hub(world_size);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for transport in transports {
            let tx = tx.clone();
            let shape = shape.clone();
            let dims = dims.clone();
            let halo = halo.clone();
            let f = &f;
            scope.spawn(move || {
                let world = transport.world();
                let topology = LocaleTopology::new(&transport, world, None, Some(dims), None, None)
                    .expect("topology construction");
                let rank = topology.inter_locale_group().rank();
                let decomp = Decomposition::new(topology, shape, &halo).expect("decomposition construction");
                let result = f(rank, &decomp);
                tx.send(result).unwrap();
            });
        }
    });
    drop(tx);
    rx.into_iter().collect()
}

#[test]
fn one_d_three_tiles_thick_halo_interior_gets_both_neighbors() {
    let results = run_decomposition(3, vec![300], vec![3], HaloSpec::Scalar(10), |rank, decomp| {
        (rank, decomp.inbound_plan(rank))
    });

    for (rank, plan) in results {
        match rank {
            0 => {
                assert_eq!(plan.len(), 1);
                assert_eq!(plan[0].side, Side::Hi);
                assert_eq!(plan[0].global_box.to_slice(), vec![100..110]);
            }
            1 => {
                assert_eq!(plan.len(), 2);
                let lo: Vec<_> = plan.iter().filter(|e| e.side == Side::Lo).collect();
                let hi: Vec<_> = plan.iter().filter(|e| e.side == Side::Hi).collect();
                assert_eq!(lo[0].global_box.to_slice(), vec![90..100]);
                assert_eq!(hi[0].global_box.to_slice(), vec![200..210]);
            }
            2 => {
                assert_eq!(plan.len(), 1);
                assert_eq!(plan[0].side, Side::Lo);
                assert_eq!(plan[0].global_box.to_slice(), vec![190..200]);
            }
            _ => unreachable!(),
        }
    }
}

#[test]
fn outbound_plan_is_the_transpose_of_every_inbound_plan() {
    let all: Vec<(i32, Vec<ExchangeEntry>, Vec<ExchangeEntry>)> =
        run_decomposition(3, vec![300], vec![3], HaloSpec::Scalar(10), |rank, decomp| {
            (rank, decomp.inbound_plan(rank), decomp.outbound_plan(rank))
        });

    let total_inbound: usize = all.iter().map(|(_, inb, _)| inb.len()).sum();
    let total_outbound: usize = all.iter().map(|(_, _, outb)| outb.len()).sum();
    assert_eq!(total_inbound, total_outbound);

    for (rank, _, outbound) in &all {
        for entry in outbound {
            let (_, peer_inbound, _) = all
                .iter()
                .find(|(r, _, _)| r == &entry.peer_cart_rank)
                .expect("peer present");
            assert!(peer_inbound
                .iter()
                .any(|e| e.peer_cart_rank == *rank && e.global_box == entry.global_box));
        }
    }
}

#[test]
fn two_d_corner_tile_onion_peel_avoids_double_covering_the_corner() {
    let results = run_decomposition(
        9,
        vec![300, 600],
        vec![3, 3],
        HaloSpec::Matrix(vec![[10, 10], [5, 5]]),
        |rank, decomp| (rank, decomp.inbound_plan(rank)),
    );

    let (_, corner_plan) = results.iter().find(|(r, _)| *r == 0).unwrap();

    // axis 0 entries span the *full* with-halo width of axis 1, including
    // the corner; axis 1 entries are restricted to axis 0's no-halo span,
    // so the corner cell is attributed to an axis-0 transfer exactly once,
    // even when it falls inside the diagonal neighbor's authoritative box.
    let axis0_direct = corner_plan
        .iter()
        .find(|e| e.axis == 0 && e.side == Side::Hi && e.peer_cart_rank == 3)
        .expect("axis-0 direct neighbor transfer present");
    assert_eq!(axis0_direct.global_box.to_slice(), vec![100..110, 0..200]);

    let axis0_corner_sliver = corner_plan
        .iter()
        .find(|e| e.axis == 0 && e.side == Side::Hi && e.peer_cart_rank == 4)
        .expect("axis-0 diagonal-neighbor corner sliver present");
    assert_eq!(axis0_corner_sliver.global_box.to_slice(), vec![100..110, 200..205]);

    for entry in corner_plan.iter().filter(|e| e.axis == 1) {
        assert_eq!(entry.global_box.to_slice()[0], 0..100);
    }

    // No single corner cell appears in more than one transfer.
    for (i, a) in corner_plan.iter().enumerate() {
        for b in &corner_plan[i + 1..] {
            assert!(a.global_box.intersect(&b.global_box).is_none());
        }
    }
}

#[test]
fn shrinking_halo_to_zero_empties_the_plan() {
    let results = run_decomposition(3, vec![300], vec![3], HaloSpec::Scalar(0), |rank, decomp| {
        decomp.inbound_plan(rank).len()
    });
    assert!(results.iter().all(|&n| n == 0));
}
