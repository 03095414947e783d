//! Container filesystem setup: mount sequencing, overlay layering, and
//! root switching.

pub mod mount;
pub mod overlayfs;
pub mod pivot_root;
