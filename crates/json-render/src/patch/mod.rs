//! JSON Patch (RFC 6902) operations as emitted by spec generators.
//!
//! Only the six standard operations exist. Paths are kept as raw pointer
//! strings because generators occasionally omit the leading `/`, which the
//! pointer layer accepts as relative to the root.

pub mod apply;
pub mod codec;
pub mod types;

pub use apply::{apply_patch, apply_patches};
pub use types::{Patch, PatchError};
