//! Read-only views over a tile's authoritative or with-halo region.

use crate::layout::{flat_offset, row_major_indices};

/// A read-only row-major view over one rectangular region of a
/// [`Storage`](crate::storage::Storage): either the authoritative
/// (no-halo) region ([`GlobalArray::rank_view_n`](crate::GlobalArray::rank_view_n))
/// or the full with-halo region
/// ([`GlobalArray::rank_view_h`](crate::GlobalArray::rank_view_h)).
///
/// The view's own shape may be smaller than the underlying buffer (the
/// no-halo region is a strict sub-box of the with-halo buffer), so
/// addressing goes through the *underlying* buffer's strides plus a fixed
/// origin offset rather than exposing a contiguous slice.
pub struct RankView<'a, T> {
    shape: Vec<i64>,
    origin_offset: i64,
    buffer_strides: Vec<i64>,
    data: &'a [T],
}

impl<'a, T: Copy> RankView<'a, T> {
    pub(crate) fn new(shape: Vec<i64>, origin_offset: i64, buffer_strides: Vec<i64>, data: &'a [T]) -> Self {
        Self {
            shape,
            origin_offset,
            buffer_strides,
            data,
        }
    }

    /// The view's own shape.
    #[must_use]
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// Read the element at coordinate `idx`, local to this view's own
    /// origin.
    #[must_use]
    pub fn get(&self, idx: &[i64]) -> T {
        let offset = self.origin_offset + flat_offset(idx, &self.buffer_strides);
        self.data[offset as usize]
    }

    /// Every element in the view, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        row_major_indices(&self.shape).map(move |idx| self.get(&idx))
    }

    /// Copy every element in the view into a flat `Vec`, in row-major
    /// order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}
