//! Detection of shared-memory-capable peer groups (spec §4.3).

use crate::transport::{Transport, TransportGroup};

/// Info on possible shared-memory allocation within an enclosing rank
/// group: the caller's own co-located subgroup, and how many such
/// subgroups (locales) exist in total.
#[derive(Clone)]
pub struct SharedLocaleInfo<T: Transport> {
    intra_locale_group: T::Group,
    num_locales: u32,
}

impl<T: Transport> SharedLocaleInfo<T> {
    /// Split `group` by shared-memory capability and count the resulting
    /// subgroups with a `SUM` all-reduce over a per-subgroup indicator.
    #[must_use]
    pub fn new(transport: &T, group: &T::Group) -> Self {
        let intra_locale_group = transport.split_shared(group);
        Self::from_intra_locale_group(transport, group, intra_locale_group)
    }

    /// As [`SharedLocaleInfo::new`], but with a caller-supplied
    /// `intra_locale_group` (e.g. a singleton, to force per-process locale
    /// mode) instead of one detected from shared-memory capability.
    #[must_use]
    pub fn from_intra_locale_group(
        transport: &T,
        group: &T::Group,
        intra_locale_group: T::Group,
    ) -> Self {
        let is_representative = u32::from(!intra_locale_group.is_null() && intra_locale_group.rank() == 0);
        let num_locales = transport.allreduce_sum_u32(group, is_representative);
        tracing::debug!(num_locales, "computed locale count");
        Self {
            intra_locale_group,
            num_locales,
        }
    }

    /// This participant's shared-memory-capable subgroup.
    #[must_use]
    pub fn intra_locale_group(&self) -> &T::Group {
        &self.intra_locale_group
    }

    /// Total number of locales (subgroups) in the enclosing group.
    #[must_use]
    pub fn num_locales(&self) -> u32 {
        self.num_locales
    }
}
