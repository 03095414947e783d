//! Root filesystem switching.
//!
//! The primary variant uses `pivot_root(2)`, which actually swaps the
//! root mount; the reduced variant uses `chroot(2)`, which only changes
//! the process's view of `/` and can be escaped by a privileged process.
//!
//! Both require the mount sequence to have completed: the new root must
//! already contain a working `/proc`, `/dev`, and friends. The working
//! directory is invalidated by the switch, so both variants explicitly
//! re-establish it at `/` and document that as their postcondition.

use std::path::Path;

use boxcell_common::error::{BoxcellError, Result};

use crate::sys::Syscalls;

/// Directory inside the new root where the old root is parked.
pub const PUT_OLD_DIR: &str = ".pivot_root";

/// Atomically hands off from the host root to `root` via `pivot_root(2)`.
///
/// Sequence: create `<root>/.pivot_root`, pivot, chdir to `/`, lazily
/// detach the relocated old root, remove the now-empty directory.
///
/// Postcondition: the process root and working directory are both the
/// container root, and the host root is no longer reachable.
///
/// # Errors
///
/// Returns [`BoxcellError::RootSwitchFailure`] for the first failing
/// step, or [`BoxcellError::Io`] if the parking directory cannot be
/// created.
pub fn switch_root(root: &Path, sys: &dyn Syscalls) -> Result<()> {
    let put_old = root.join(PUT_OLD_DIR);
    std::fs::create_dir_all(&put_old).map_err(|e| BoxcellError::Io {
        path: put_old.clone(),
        source: e,
    })?;

    sys.pivot_root(root, &put_old)?;
    sys.chdir(Path::new("/"))?;

    // The old root is now at ./.pivot_root relative to the new root.
    let old_root = Path::new("./.pivot_root");
    sys.umount_detach(old_root)?;
    sys.remove_dir(old_root)?;

    tracing::info!(root = %root.display(), "root switched (pivot_root)");
    Ok(())
}

/// Reduced root switch: `chroot(2)` into `root` and reset the working
/// directory to `/`.
///
/// Used when no new mount namespace was taken.
///
/// # Errors
///
/// Returns [`BoxcellError::RootSwitchFailure`] if chroot or chdir fails.
pub fn enter_chroot(root: &Path, sys: &dyn Syscalls) -> Result<()> {
    sys.chroot(root)?;
    sys.chdir(Path::new("/"))?;
    tracing::info!(root = %root.display(), "root switched (chroot)");
    Ok(())
}
