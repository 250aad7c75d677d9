pub(crate) mod collect_sorted;
pub(crate) mod combine;
pub(crate) mod combine_global;
pub(crate) mod keyed;
