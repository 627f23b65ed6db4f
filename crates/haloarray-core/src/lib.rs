// crates/haloarray-core/src/lib.rs

//! Index extents, halo geometry, and the shared error taxonomy for the
//! `haloarray` decomposition and halo-exchange engine.
//!
//! This crate has no notion of ranks, communicators, or transports — it is
//! pure arithmetic over N-dimensional half-open boxes, used by every other
//! crate in the workspace.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

mod error;
mod extent;
mod halo_spec;
mod side;

pub use error::{Error, Result};
pub use extent::{HaloIndexingExtent, IndexingExtent};
pub use halo_spec::{normalize_halo, HaloSpec};
pub use side::{Side, HI, LO};
