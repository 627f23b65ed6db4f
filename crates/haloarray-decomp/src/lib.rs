// crates/haloarray-decomp/src/lib.rs

//! Per-tile halo geometry, balanced shape splitting, and halo-exchange plan
//! computation for `haloarray`.
//!
//! [`Decomposition`] owns one [`DecompositionExtent`] per Cartesian rank and
//! answers, for any rank, the set of transfers ([`ExchangeEntry`]) needed to
//! fill every halo face of its tile without double-covering a corner cell
//! from more than one neighbor.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

mod decomposition;
mod extent;
mod shape_split;

pub use decomposition::{Decomposition, ExchangeEntry};
pub use extent::DecompositionExtent;
pub use shape_split::{coord_to_rank, rank_to_coord, split_shape};
