// crates/haloarray-array/src/lib.rs

//! `GlobalArray`: the user-facing PGAS array built on decomposition,
//! halo-exchange, and topology.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

mod global_array;
mod layout;
mod storage;
mod view;

pub use global_array::GlobalArray;
pub use storage::Storage;
pub use view::RankView;
