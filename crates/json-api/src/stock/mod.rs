//! Stock API surface.

pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod headers;
pub(crate) mod requests;
