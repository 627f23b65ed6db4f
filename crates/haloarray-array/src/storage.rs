//! The with-halo backing store for one tile of a [`GlobalArray`](crate::GlobalArray).

use haloarray_core::IndexingExtent;
use haloarray_exchange::HaloBuffer;

use crate::layout::{flat_offset, row_major_indices, row_major_strides};

/// A row-major, with-halo-shaped buffer of `T`, addressed in local
/// (with-halo-origin) coordinates.
pub struct Storage<T> {
    shape: Vec<i64>,
    strides: Vec<i64>,
    data: Vec<T>,
}

impl<T: Copy> Storage<T> {
    /// Allocate a buffer of `shape` filled with `fill`.
    #[must_use]
    pub fn filled(shape: Vec<i64>, fill: T) -> Self {
        let len = shape.iter().map(|&n| n.max(0) as usize).product();
        let strides = row_major_strides(&shape);
        Self {
            shape,
            strides,
            data: vec![fill; len],
        }
    }

    /// The with-halo shape this buffer was allocated for.
    #[must_use]
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// Read the element at local coordinate `idx`.
    #[must_use]
    pub fn get(&self, idx: &[i64]) -> T {
        self.data[flat_offset(idx, &self.strides) as usize]
    }

    /// Write `value` at local coordinate `idx`.
    pub fn set(&mut self, idx: &[i64], value: T) {
        let offset = flat_offset(idx, &self.strides) as usize;
        self.data[offset] = value;
    }

    /// Every element currently stored, in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: bytemuck::Pod> HaloBuffer for Storage<T> {
    fn extract(&self, local_box: &IndexingExtent) -> Vec<u8> {
        let shape = local_box.shape();
        let values: Vec<T> = row_major_indices(&shape)
            .map(|rel| {
                let idx: Vec<i64> = rel.iter().zip(local_box.start()).map(|(&r, &s)| r + s).collect();
                self.get(&idx)
            })
            .collect();
        bytemuck::cast_slice(&values).to_vec()
    }

    fn inject(&mut self, local_box: &IndexingExtent, data: &[u8]) {
        let values: &[T] = bytemuck::cast_slice(data);
        let shape = local_box.shape();
        for (rel, &value) in row_major_indices(&shape).zip(values) {
            let idx: Vec<i64> = rel.iter().zip(local_box.start()).map(|(&r, &s)| r + s).collect();
            self.set(&idx, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haloarray_core::IndexingExtent;

    #[test]
    fn extract_then_inject_round_trips() {
        let mut a = Storage::filled(vec![4, 4], 0i32);
        for (i, idx) in row_major_indices(&[4, 4]).enumerate() {
            a.set(&idx, i as i32);
        }
        let box_ = IndexingExtent::new(vec![1, 1], vec![3, 3]).unwrap();
        let bytes = a.extract(&box_);

        let mut b = Storage::filled(vec![4, 4], -1i32);
        b.inject(&box_, &bytes);
        for idx in row_major_indices(&[2, 2]) {
            let global: Vec<i64> = idx.iter().map(|&v| v + 1).collect();
            assert_eq!(a.get(&global), b.get(&global));
        }
        assert_eq!(b.get(&[0, 0]), -1);
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use haloarray_core::IndexingExtent;
    use haloarray_exchange::HaloBuffer;

    use super::Storage;

    proptest! {
        /// Extracting an arbitrary sub-box and injecting it into a
        /// freshly-allocated buffer of the same shape reproduces every
        /// value in that sub-box exactly, and never touches cells outside
        /// it.
        #[test]
        fn extract_then_inject_reproduces_the_sub_box(
            h in 2i64..12, w in 2i64..12,
            r0 in 0i64..10, r1 in 0i64..10, c0 in 0i64..10, c1 in 0i64..10,
        ) {
            let (r0, r1) = (r0.min(h), r1.min(h));
            let (c0, c1) = (c0.min(w), c1.min(w));
            let (lo_r, hi_r) = (r0.min(r1), r0.max(r1));
            let (lo_c, hi_c) = (c0.min(c1), c0.max(c1));

            let mut a = Storage::filled(vec![h, w], 0i64);
            for i in 0..h {
                for j in 0..w {
                    a.set(&[i, j], i * 1000 + j);
                }
            }
            let sub = IndexingExtent::new(vec![lo_r, lo_c], vec![hi_r, hi_c]).unwrap();
            let bytes = a.extract(&sub);

            let mut b = Storage::filled(vec![h, w], -1i64);
            b.inject(&sub, &bytes);

            for i in 0..h {
                for j in 0..w {
                    if i >= lo_r && i < hi_r && j >= lo_c && j < hi_c {
                        prop_assert_eq!(b.get(&[i, j]), i * 1000 + j);
                    } else {
                        prop_assert_eq!(b.get(&[i, j]), -1);
                    }
                }
            }
        }
    }
}
