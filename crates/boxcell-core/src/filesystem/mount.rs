//! The ordered mount sequence that turns a bare root directory into a
//! bootable-looking tree.
//!
//! Order is significant and fixed: the host's `/` is first remounted
//! recursively private so none of the following mounts leak into the
//! host mount table, then `proc`, `sysfs`, the `/dev` tmpfs, and the pty
//! filesystem are mounted, and finally the stdio symlinks are created.
//! A failing step aborts the rest; no partial-mount state is cleaned up.

use std::path::{Path, PathBuf};

use boxcell_common::error::{BoxcellError, Result};
use nix::mount::MsFlags;

use crate::sys::Syscalls;

/// One mount operation in the fixed sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    /// Mount source, if any.
    pub source: Option<String>,
    /// Mount target.
    pub target: PathBuf,
    /// Filesystem type, if any.
    pub fstype: Option<String>,
    /// Mount flags.
    pub flags: MsFlags,
    /// Options string, if any.
    pub data: Option<String>,
    /// Whether the target directory is created (if absent) before mounting.
    pub mkdir_target: bool,
}

/// Returns the fixed, ordered mount list for a container root.
#[must_use]
pub fn mount_plan(root: &Path) -> Vec<MountSpec> {
    vec![
        MountSpec {
            source: None,
            target: PathBuf::from("/"),
            fstype: None,
            flags: MsFlags::MS_PRIVATE | MsFlags::MS_REC,
            data: None,
            mkdir_target: false,
        },
        MountSpec {
            source: Some("proc".into()),
            target: root.join("proc"),
            fstype: Some("proc".into()),
            flags: MsFlags::empty(),
            data: None,
            mkdir_target: false,
        },
        MountSpec {
            source: Some("sysfs".into()),
            target: root.join("sys"),
            fstype: Some("sysfs".into()),
            flags: MsFlags::empty(),
            data: None,
            mkdir_target: false,
        },
        MountSpec {
            source: Some("tmpfs".into()),
            target: root.join("dev"),
            fstype: Some("tmpfs".into()),
            flags: MsFlags::MS_NOSUID | MsFlags::MS_STRICTATIME,
            data: Some("mode=755".into()),
            mkdir_target: false,
        },
        MountSpec {
            source: Some("devpts".into()),
            target: root.join("dev").join("pts"),
            fstype: Some("devpts".into()),
            flags: MsFlags::empty(),
            data: None,
            mkdir_target: true,
        },
    ]
}

/// Issues the fixed mount sequence for the given root, then symlinks
/// `stdin`/`stdout`/`stderr` to the corresponding `/proc/self/fd/<n>`.
///
/// The whole sequence must be re-invoked to retry; there is no
/// partial-mount recovery.
///
/// # Errors
///
/// Returns [`BoxcellError::MountFailure`] for the first failing mount, or
/// [`BoxcellError::Io`] if the pty directory or a symlink cannot be created.
pub fn prepare_mounts(root: &Path, sys: &dyn Syscalls) -> Result<()> {
    for spec in mount_plan(root) {
        if spec.mkdir_target && !spec.target.exists() {
            std::fs::create_dir_all(&spec.target).map_err(|e| BoxcellError::Io {
                path: spec.target.clone(),
                source: e,
            })?;
        }
        sys.mount(
            spec.source.as_deref(),
            &spec.target,
            spec.fstype.as_deref(),
            spec.flags,
            spec.data.as_deref(),
        )?;
    }

    for (fd, name) in ["stdin", "stdout", "stderr"].iter().enumerate() {
        sys.symlink(
            &PathBuf::from(format!("/proc/self/fd/{fd}")),
            &root.join("dev").join(name),
        )?;
    }

    tracing::info!(root = %root.display(), "virtual filesystems mounted");
    Ok(())
}
