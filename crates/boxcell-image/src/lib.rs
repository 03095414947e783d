//! # boxcell-image
//!
//! Root-filesystem construction for containers.
//!
//! Resolves an image archive to a cached, shared, read-only extraction,
//! then produces a per-container writable root: either an overlay mount
//! layered on the cache, or a fresh extraction into an ephemeral
//! writable area (tmpfs or plain directory).

pub mod builder;
pub mod extract;
pub mod paths;

pub use builder::build_root;
