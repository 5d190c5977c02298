//! Stock Handlers

pub(crate) mod changes;
pub(crate) mod reduce;
pub(crate) mod sync_pull;
pub(crate) mod sync_push;
pub(crate) mod validate;
