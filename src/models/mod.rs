//! Data models shared by the reconciler, the org tree loader and the analytics fetcher.
//!
//! Field names follow the upstream console backend's JSON (camelCase) so records
//! pass through the gateway without translation.

mod analytics;
mod channel;
mod org;
mod viewer;

pub use analytics::*;
pub use channel::*;
pub use org::*;
pub use viewer::*;
