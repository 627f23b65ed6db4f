//! Face naming for per-axis halo widths.

/// Index of the low-coordinate face in a `[lo, hi]` halo-width pair.
pub const LO: usize = 0;

/// Index of the high-coordinate face in a `[lo, hi]` halo-width pair.
pub const HI: usize = 1;

/// The two faces of an axis, as a type rather than a bare index.
///
/// `Side::LO`/`Side::HI` map onto the [`LO`]/[`HI`] constants so call sites
/// that prefer pattern matching and call sites that prefer array indexing
/// (`halo[axis][side as usize]`) both read naturally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// The face at the low-coordinate end of an axis.
    Lo,
    /// The face at the high-coordinate end of an axis.
    Hi,
}

impl Side {
    /// Both faces, in a fixed order, for iterating "each side of each axis".
    pub const ALL: [Side; 2] = [Side::Lo, Side::Hi];
}

impl From<Side> for usize {
    fn from(side: Side) -> usize {
        match side {
            Side::Lo => LO,
            Side::Hi => HI,
        }
    }
}
