//! The four error kinds every `haloarray` crate reports through.

use std::fmt;

/// Errors raised by the decomposition and halo-exchange engine.
///
/// Construction-time failures (bad `dims`/`ndims`, negative halo, shape
/// mismatches) are [`Error::Configuration`] or [`Error::Argument`];
/// anything reported by the messaging substrate is [`Error::Transport`] and
/// is terminal for the caller; a violated invariant from §3 of the design is
/// [`Error::InternalInvariant`] and indicates a bug rather than bad input.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid `dims`/`ndims` combination, negative halo, incompatible
    /// shape/locale-count, or a `dtype` mismatch.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A non-array (or shape-mismatched) operand was passed to an
    /// array-level collective such as `copyto`.
    #[error("argument error: {0}")]
    Argument(String),

    /// The messaging substrate reported a failure. Fatal for the rank
    /// group; never retried.
    #[error("transport error: {0}")]
    Transport(String),

    /// A §3 invariant was violated during construction. Indicates a bug in
    /// the engine, not in caller input.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl Error {
    /// Build a [`Error::Configuration`] from a displayable message.
    pub fn configuration(msg: impl fmt::Display) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Build a [`Error::Argument`] from a displayable message.
    pub fn argument(msg: impl fmt::Display) -> Self {
        Self::Argument(msg.to_string())
    }

    /// Build a [`Error::Transport`] from a displayable message.
    pub fn transport(msg: impl fmt::Display) -> Self {
        Self::Transport(msg.to_string())
    }

    /// Build a [`Error::InternalInvariant`] from a displayable message.
    pub fn internal_invariant(msg: impl fmt::Display) -> Self {
        Self::InternalInvariant(msg.to_string())
    }
}

/// Convenience alias used throughout the `haloarray` workspace.
pub type Result<T> = std::result::Result<T, Error>;
