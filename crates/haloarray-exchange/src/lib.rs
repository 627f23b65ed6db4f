// crates/haloarray-exchange/src/lib.rs

//! Executing a [`Decomposition`](haloarray_decomp::Decomposition)'s halo
//! exchange plan against a [`Transport`](haloarray_topology::Transport).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

mod buffer;
mod exchanger;

pub use buffer::HaloBuffer;
pub use exchanger::HaloExchanger;
