//! Overlay mount helper for layered container roots.
//!
//! Presents a shared read-only image layer and a per-container writable
//! upper layer as one merged, copy-on-write tree.

use std::path::{Path, PathBuf};

use boxcell_common::error::Result;
use nix::mount::MsFlags;

use crate::sys::Syscalls;

/// Configuration for an overlay mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Read-only lower layer (the cached image extraction).
    pub lower_dir: PathBuf,
    /// Per-container writable upper layer.
    pub upper_dir: PathBuf,
    /// Overlay work directory; must live on the same filesystem as
    /// `upper_dir`.
    pub work_dir: PathBuf,
    /// Final merged mount point.
    pub merged_dir: PathBuf,
}

impl OverlayConfig {
    /// Renders the kernel options string,
    /// `lowerdir=…,upperdir=…,workdir=…`.
    #[must_use]
    pub fn options(&self) -> String {
        format!(
            "lowerdir={},upperdir={},workdir={}",
            self.lower_dir.display(),
            self.upper_dir.display(),
            self.work_dir.display()
        )
    }
}

/// Mounts an overlay filesystem at the configured merged mount point.
///
/// The directories must already exist; creating them is the
/// filesystem builder's job.
///
/// # Errors
///
/// Returns [`MountFailure`](boxcell_common::error::BoxcellError::MountFailure)
/// if the mount syscall fails.
pub fn mount_overlay(config: &OverlayConfig, sys: &dyn Syscalls) -> Result<()> {
    let opts = config.options();
    sys.mount(
        Some("overlay"),
        &config.merged_dir,
        Some("overlay"),
        MsFlags::MS_NODEV,
        Some(opts.as_str()),
    )?;
    tracing::info!(merged = %config.merged_dir.display(), "overlayfs mounted");
    Ok(())
}

/// Convenience constructor for the standard per-container layout.
#[must_use]
pub fn overlay_for(lower: &Path, upper: &Path, work: &Path, merged: &Path) -> OverlayConfig {
    OverlayConfig {
        lower_dir: lower.to_path_buf(),
        upper_dir: upper.to_path_buf(),
        work_dir: work.to_path_buf(),
        merged_dir: merged.to_path_buf(),
    }
}
