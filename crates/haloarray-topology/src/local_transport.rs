//! An in-process reference [`Transport`]: one OS thread per simulated
//! participant, `std::sync::Barrier` for group barriers, and
//! `crossbeam_channel` rendezvous for two-sided transfers.
//!
//! This is what the test suite and the CLI demo run against; it is not a
//! substitute for a real message-passing substrate (MPI, RDMA, ...) in
//! production, but it honors exactly the same `Transport` contract, so the
//! decomposition/halo-exchange engine above it cannot tell the difference.

use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};

use crossbeam_channel::{Receiver, Sender};

use crate::transport::{SharedWindow, Transport, TransportGroup};

/// A group handle for [`LocalTransport`]: the global participant ids that
/// belong to it, in group-rank order, plus this handle's own index into
/// that list (`-1` for the null group).
#[derive(Clone, Debug)]
pub struct LocalGroup {
    members: Vec<i32>,
    my_rank: i32,
    shared: Option<Arc<GroupShared>>,
}

#[derive(Debug)]
struct GroupShared {
    barrier: Barrier,
    accum: Mutex<u32>,
    window: Mutex<Option<SharedWindow>>,
}

impl GroupShared {
    fn new(size: usize) -> Self {
        Self {
            barrier: Barrier::new(size),
            accum: Mutex::new(0),
            window: Mutex::new(None),
        }
    }
}

impl LocalGroup {
    fn null() -> Self {
        Self {
            members: Vec::new(),
            my_rank: -1,
            shared: None,
        }
    }

    fn shared(&self) -> &GroupShared {
        self.shared
            .as_deref()
            .expect("collective called on a null group")
    }
}

impl TransportGroup for LocalGroup {
    fn rank(&self) -> i32 {
        self.my_rank
    }

    fn size(&self) -> i32 {
        self.members.len() as i32
    }

    fn is_null(&self) -> bool {
        self.my_rank < 0
    }
}

type ChannelKey = (i32, u64);
type GroupKey = (&'static str, Vec<i32>);

struct Registry {
    channels: Mutex<HashMap<ChannelKey, (Sender<Vec<u8>>, Receiver<Vec<u8>>)>>,
    groups: Mutex<HashMap<GroupKey, Arc<GroupShared>>>,
    locale_of: Vec<usize>,
}

/// A handle to the in-process simulated substrate, bound to one simulated
/// participant. Clone the `Vec<LocalTransport>` returned by
/// [`LocalTransport::hub`] across the threads standing in for each
/// participant.
#[derive(Clone)]
pub struct LocalTransport {
    global_rank: i32,
    registry: Arc<Registry>,
    world: LocalGroup,
}

impl LocalTransport {
    /// Build `world_size` transport handles, one per simulated participant,
    /// each its own locale (process-mode).
    #[must_use]
    pub fn hub(world_size: usize) -> Vec<Self> {
        Self::hub_with_locales(world_size, (0..world_size).collect())
    }

    /// Build `world_size` transport handles with an explicit
    /// rank-to-locale assignment, simulating node-mode (shared-memory)
    /// locales when two or more ranks share a locale id.
    ///
    /// # Panics
    /// Panics if `locale_of.len() != world_size`.
    #[must_use]
    pub fn hub_with_locales(world_size: usize, locale_of: Vec<usize>) -> Vec<Self> {
        assert_eq!(locale_of.len(), world_size, "one locale id per rank");

        let registry = Arc::new(Registry {
            channels: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            locale_of,
        });

        let members: Vec<i32> = (0..world_size as i32).collect();
        let world_shared = registry
            .groups
            .lock()
            .unwrap()
            .entry(("world", members.clone()))
            .or_insert_with(|| Arc::new(GroupShared::new(world_size)))
            .clone();

        (0..world_size)
            .map(|r| LocalTransport {
                global_rank: r as i32,
                registry: registry.clone(),
                world: LocalGroup {
                    members: members.clone(),
                    my_rank: r as i32,
                    shared: Some(world_shared.clone()),
                },
            })
            .collect()
    }

    fn group_with(&self, kind: &'static str, mut members: Vec<i32>) -> LocalGroup {
        members.sort_unstable();
        let Some(my_rank) = members.iter().position(|&g| g == self.global_rank) else {
            return LocalGroup::null();
        };
        let shared = self
            .registry
            .groups
            .lock()
            .unwrap()
            .entry((kind, members.clone()))
            .or_insert_with(|| Arc::new(GroupShared::new(members.len())))
            .clone();
        LocalGroup {
            members,
            my_rank: my_rank as i32,
            shared: Some(shared),
        }
    }

    /// Ordered (not sorted) variant used by [`Transport::cart_create`],
    /// which must preserve the incoming group's rank order so Cartesian
    /// coordinates are assigned consistently.
    fn ordered_group_with(&self, kind: &'static str, members: Vec<i32>) -> LocalGroup {
        let Some(my_rank) = members.iter().position(|&g| g == self.global_rank) else {
            return LocalGroup::null();
        };
        let shared = self
            .registry
            .groups
            .lock()
            .unwrap()
            .entry((kind, members.clone()))
            .or_insert_with(|| Arc::new(GroupShared::new(members.len())))
            .clone();
        LocalGroup {
            members,
            my_rank: my_rank as i32,
            shared: Some(shared),
        }
    }
}

impl Transport for LocalTransport {
    type Group = LocalGroup;

    fn world(&self) -> Self::Group {
        self.world.clone()
    }

    fn split_shared(&self, group: &Self::Group) -> Self::Group {
        if group.is_null() {
            return LocalGroup::null();
        }
        let my_locale = self.registry.locale_of[self.global_rank as usize];
        let peers: Vec<i32> = group
            .members
            .iter()
            .copied()
            .filter(|&g| self.registry.locale_of[g as usize] == my_locale)
            .collect();
        self.group_with("shared", peers)
    }

    fn split_color(&self, group: &Self::Group, color: Option<u32>) -> Self::Group {
        if group.is_null() {
            return LocalGroup::null();
        }
        let Some(color) = color else {
            return LocalGroup::null();
        };
        // Every member independently recomputes the same coloring by
        // asking every group member for its color; since `color` here is
        // only ever 0 (representatives) or None in this workspace, we can
        // special-case: the new group is "whoever is a representative",
        // i.e. every member whose own split call also passed `Some`.
        // LocalTransport cannot observe peers' colors out of band, so
        // callers must ensure `color` is a pure function of rank (true for
        // every call site in this workspace: the representative test is
        // `intra_locale.rank() == 0`, which every participant can compute
        // locally and consistently).
        let kind: &'static str = match color {
            0 => "color:0",
            _ => "color:n",
        };
        let peers: Vec<i32> = group.members.clone();
        // Only members that passed `Some` belong; a null-returning member
        // never reaches here, so `peers` over-approximates. Re-filter by
        // asking the registry which ranks actually requested this kind:
        // in practice every call site passes the same predicate on every
        // rank, so we approximate membership via a second registration
        // pass keyed by (kind, candidate) instead of full peer discovery.
        self.group_with(kind, peers_that_opted_in(&peers, self, kind))
    }

    fn allreduce_sum_u32(&self, group: &Self::Group, value: u32) -> u32 {
        let shared = group.shared();
        {
            let mut acc = shared.accum.lock().unwrap();
            *acc += value;
        }
        shared.barrier.wait();
        let total = *shared.accum.lock().unwrap();
        shared.barrier.wait();
        if group.rank() == 0 {
            *shared.accum.lock().unwrap() = 0;
        }
        shared.barrier.wait();
        total
    }

    fn cart_create(&self, group: &Self::Group, dims: &[u32], periods: &[bool]) -> Self::Group {
        let _ = periods; // metadata only; the simulator routes by rank, not by ring topology.
        if group.is_null() {
            return LocalGroup::null();
        }
        let total: u32 = dims.iter().product();
        assert_eq!(
            total as usize,
            group.members.len(),
            "cart_create dims product must equal group size"
        );
        self.ordered_group_with("cart", group.members.clone())
    }

    fn alloc_shared_window(&self, group: &Self::Group, bytes: usize) -> SharedWindow {
        let shared = group.shared();
        if group.rank() == 0 {
            *shared.window.lock().unwrap() =
                Some(SharedWindow::new(Arc::new(Mutex::new(vec![0u8; bytes]))));
        }
        shared.barrier.wait();
        let win = shared
            .window
            .lock()
            .unwrap()
            .clone()
            .expect("rank 0 installs the window before the barrier releases");
        shared.barrier.wait();
        if group.rank() == 0 {
            *shared.window.lock().unwrap() = None;
        }
        shared.barrier.wait();
        win
    }

    fn send(&self, group: &Self::Group, dest: i32, tag: u64, payload: Vec<u8>) {
        let global_dest = group.members[dest as usize];
        let (tx, _rx) = self.channel_for(global_dest, tag);
        tx.send(payload).expect("mailbox receiver dropped");
    }

    fn recv(&self, _group: &Self::Group, _src: i32, tag: u64) -> Vec<u8> {
        let (_tx, rx) = self.channel_for(self.global_rank, tag);
        rx.recv().expect("mailbox sender dropped")
    }

    fn barrier(&self, group: &Self::Group) {
        group.shared().barrier.wait();
    }
}

impl LocalTransport {
    fn channel_for(&self, owner: i32, tag: u64) -> (Sender<Vec<u8>>, Receiver<Vec<u8>>) {
        self.registry
            .channels
            .lock()
            .unwrap()
            .entry((owner, tag))
            .or_insert_with(crossbeam_channel::unbounded)
            .clone()
    }
}

/// Every call site in this workspace colors with a pure function of rank
/// (`0` for representatives, some other fixed marker otherwise), so every
/// participant can decide locally, without extra coordination, which of
/// `candidates` also opted into `kind`. We re-derive that predicate from
/// `kind` itself rather than threading a closure through the `Transport`
/// trait object: `"color:0"` keeps exactly the representatives (rank 0
/// within their `split_shared` subgroup), mirroring spec §4.4 step 3.
fn peers_that_opted_in(
    candidates: &[i32],
    transport: &LocalTransport,
    kind: &'static str,
) -> Vec<i32> {
    if kind != "color:0" {
        return candidates.to_vec();
    }
    let mut sorted = candidates.to_vec();
    sorted.sort_unstable();
    let mut seen_locales = std::collections::HashSet::new();
    sorted
        .into_iter()
        .filter(|&g| seen_locales.insert(transport.registry.locale_of[g as usize]))
        .collect()
}
