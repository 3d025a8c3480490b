//! Models owned by optional extensions
//!
//! Each extension also ships its own migration repository under the same
//! name; see `crate::migration::EXTENSIONS`.

pub mod endpoint_filter;
pub mod federation;
pub mod oauth1;
pub mod revoke;
