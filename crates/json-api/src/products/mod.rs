//! Products API surface.

pub(crate) mod handlers;
