//! Isolation-level to namespace-flag mapping.
//!
//! The full level takes its namespaces at clone time; the mount-only
//! level forks first and unshares its mount namespace between root
//! construction and the mount sequence; the chroot level takes none.

use boxcell_common::error::Result;
use boxcell_common::types::IsolationLevel;
use nix::sched::CloneFlags;

use crate::sys::Syscalls;

/// Namespace flags requested at clone time for the given level.
#[must_use]
pub fn clone_flags(level: IsolationLevel) -> CloneFlags {
    match level {
        IsolationLevel::Full => {
            CloneFlags::CLONE_NEWNS
                | CloneFlags::CLONE_NEWUTS
                | CloneFlags::CLONE_NEWPID
                | CloneFlags::CLONE_NEWNET
        }
        IsolationLevel::MountOnly | IsolationLevel::ChrootOnly => CloneFlags::empty(),
    }
}

/// Namespace flags unshared inside the child for the given level.
#[must_use]
pub fn unshare_flags(level: IsolationLevel) -> CloneFlags {
    match level {
        IsolationLevel::MountOnly => CloneFlags::CLONE_NEWNS,
        IsolationLevel::Full | IsolationLevel::ChrootOnly => CloneFlags::empty(),
    }
}

/// Performs the in-child namespace entry for the given level, if any.
///
/// # Errors
///
/// Returns [`NamespaceFailure`](boxcell_common::error::BoxcellError::NamespaceFailure)
/// if the unshare syscall fails.
pub fn enter_namespaces(level: IsolationLevel, sys: &dyn Syscalls) -> Result<()> {
    let flags = unshare_flags(level);
    if !flags.is_empty() {
        sys.unshare(flags)?;
        tracing::debug!(?flags, "namespaces unshared");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::recording::{RecordingSyscalls, SysOp};

    #[test]
    fn full_level_requests_all_four_namespaces_at_clone() {
        let flags = clone_flags(IsolationLevel::Full);
        assert!(flags.contains(CloneFlags::CLONE_NEWNS));
        assert!(flags.contains(CloneFlags::CLONE_NEWUTS));
        assert!(flags.contains(CloneFlags::CLONE_NEWPID));
        assert!(flags.contains(CloneFlags::CLONE_NEWNET));
        assert!(unshare_flags(IsolationLevel::Full).is_empty());
    }

    #[test]
    fn mount_only_level_unshares_mount_namespace_in_child() {
        assert!(clone_flags(IsolationLevel::MountOnly).is_empty());
        assert_eq!(unshare_flags(IsolationLevel::MountOnly), CloneFlags::CLONE_NEWNS);

        let sys = RecordingSyscalls::new();
        enter_namespaces(IsolationLevel::MountOnly, &sys).expect("enter");
        assert_eq!(sys.ops(), vec![SysOp::Unshare(CloneFlags::CLONE_NEWNS)]);
    }

    #[test]
    fn chroot_level_takes_no_namespaces() {
        assert!(clone_flags(IsolationLevel::ChrootOnly).is_empty());
        assert!(unshare_flags(IsolationLevel::ChrootOnly).is_empty());

        let sys = RecordingSyscalls::new();
        enter_namespaces(IsolationLevel::ChrootOnly, &sys).expect("enter");
        assert!(sys.ops().is_empty());
    }
}
