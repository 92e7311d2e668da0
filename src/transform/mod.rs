//! Pure mappers from upstream response shapes to canonical records.

pub(crate) mod trial;
