//! The message-passing substrate contract (spec §6).
//!
//! `haloarray` never talks to a concrete messaging library directly; every
//! crate above this one is generic over a [`Transport`] implementation. This
//! keeps the decomposition/halo-exchange engine testable without a real
//! multi-process substrate and lets a production deployment plug in
//! whatever the surrounding runtime already uses (MPI, a custom RDMA layer,
//! ...).

use std::fmt;
use std::sync::{Arc, Mutex};

/// A process/participant group handle, or the `COMM_NULL`-equivalent
/// sentinel (spec §6 item 8).
pub trait TransportGroup: Clone + fmt::Debug + Send + Sync {
    /// This participant's rank within the group, or a negative number if
    /// [`TransportGroup::is_null`].
    fn rank(&self) -> i32;

    /// Number of participants in the group, or `0` if
    /// [`TransportGroup::is_null`].
    fn size(&self) -> i32;

    /// `true` for the `COMM_NULL`-equivalent sentinel: a non-representative
    /// participant's inter-locale handle.
    fn is_null(&self) -> bool;
}

/// A collectively-allocated shared-memory window (spec §6 item 5).
///
/// Backed by a byte buffer reachable by every member of the allocating
/// group. Put/get are expressed over byte ranges; the caller (the storage
/// buffer layer in `haloarray-array`) is responsible for element encoding.
#[derive(Clone)]
pub struct SharedWindow {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl fmt::Debug for SharedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWindow").field("len", &self.len()).finish()
    }
}

impl SharedWindow {
    /// Wrap an existing byte buffer as a window.
    #[must_use]
    pub fn new(bytes: Arc<Mutex<Vec<u8>>>) -> Self {
        Self { bytes }
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// `true` if the window has zero length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One-sided put: overwrite `[offset, offset+data.len())` with `data`.
    pub fn put(&self, offset: usize, data: &[u8]) {
        let mut buf = self.bytes.lock().unwrap_or_else(|e| e.into_inner());
        buf[offset..offset + data.len()].copy_from_slice(data);
    }

    /// One-sided get: read `len` bytes starting at `offset`.
    #[must_use]
    pub fn get(&self, offset: usize, len: usize) -> Vec<u8> {
        let buf = self.bytes.lock().unwrap_or_else(|e| e.into_inner());
        buf[offset..offset + len].to_vec()
    }
}

/// The abstract operations the core consumes from a message-passing
/// substrate (spec §6, items 1-7; item 8 is [`TransportGroup::is_null`]).
pub trait Transport: Send + Sync {
    /// The group/communicator handle this transport works with.
    type Group: TransportGroup;

    /// The group containing every participant.
    fn world(&self) -> Self::Group;

    /// Split `group` by shared-memory-allocation capability (spec §6 item
    /// 1). Every member ends up in exactly one subgroup with the peers it
    /// can share memory with.
    fn split_shared(&self, group: &Self::Group) -> Self::Group;

    /// Split `group` by integer color (spec §6 item 2). `None` is the
    /// `MPI_UNDEFINED` convention: that member receives a null group.
    fn split_color(&self, group: &Self::Group, color: Option<u32>) -> Self::Group;

    /// All-reduce of a `u32` with `SUM` (spec §6 item 3).
    fn allreduce_sum_u32(&self, group: &Self::Group, value: u32) -> u32;

    /// Create a Cartesian topology over `group` with the given per-axis
    /// `dims` and `periods` (spec §6 item 4). Reordering is permitted.
    fn cart_create(&self, group: &Self::Group, dims: &[u32], periods: &[bool]) -> Self::Group;

    /// Collective shared-memory window allocation of `bytes` length (spec
    /// §6 item 5).
    fn alloc_shared_window(&self, group: &Self::Group, bytes: usize) -> SharedWindow;

    /// Two-sided send: deliver `payload` to `dest`, matched on `tag` (spec
    /// §6 item 6). Does not block on the matching receive.
    fn send(&self, group: &Self::Group, dest: i32, tag: u64, payload: Vec<u8>);

    /// Two-sided receive: block until a payload from `src` matching `tag`
    /// arrives (spec §6 item 6).
    fn recv(&self, group: &Self::Group, src: i32, tag: u64) -> Vec<u8>;

    /// Group barrier (spec §6 item 7).
    fn barrier(&self, group: &Self::Group);
}
