// crates/haloarray-topology/src/lib.rs

//! Locale/Cartesian mesh topology and the message-passing substrate
//! contract for `haloarray`.
//!
//! This crate defines the [`Transport`] trait the rest of the workspace is
//! generic over, plus the pieces of §4 that talk to it directly:
//! [`SharedLocaleInfo`] and [`LocaleTopology`]. [`LocalTransport`] is a
//! reference, in-process implementation used by tests and the CLI demo.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

mod local_transport;
mod shared_locale;
mod topology;
mod transport;

pub use local_transport::{LocalGroup, LocalTransport};
pub use shared_locale::SharedLocaleInfo;
pub use topology::{factorize_dims, LocaleTopology};
pub use transport::{SharedWindow, Transport, TransportGroup};
