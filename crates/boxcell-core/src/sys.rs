//! The kernel-operations capability.
//!
//! Every privileged syscall the container setup sequence issues goes
//! through the [`Syscalls`] trait: mounts, the root switch, device node
//! creation, and namespace entry. Production code uses [`NativeSyscalls`];
//! tests substitute [`recording::RecordingSyscalls`] to assert on the
//! exact operation sequence without requiring root.

use std::path::Path;

use boxcell_common::error::{BoxcellError, Result};
use nix::mount::{MntFlags, MsFlags};
use nix::sched::CloneFlags;

/// Narrow interface over the order-sensitive kernel operations.
///
/// Implementations map each failing call onto the error variant for the
/// setup phase it belongs to, so callers propagate with `?` and the
/// supervisor reports a tagged failure reason.
pub trait Syscalls {
    /// Issues a `mount(2)`.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::MountFailure`] naming the target.
    fn mount(
        &self,
        source: Option<&str>,
        target: &Path,
        fstype: Option<&str>,
        flags: MsFlags,
        data: Option<&str>,
    ) -> Result<()>;

    /// Lazily detaches a mount with `umount2(2)` and `MNT_DETACH`.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::RootSwitchFailure`].
    fn umount_detach(&self, target: &Path) -> Result<()>;

    /// Issues a `pivot_root(2)`, relocating the old root to `put_old`.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::RootSwitchFailure`].
    fn pivot_root(&self, new_root: &Path, put_old: &Path) -> Result<()>;

    /// Issues a `chroot(2)`.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::RootSwitchFailure`].
    fn chroot(&self, path: &Path) -> Result<()>;

    /// Changes the process working directory.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::RootSwitchFailure`].
    fn chdir(&self, path: &Path) -> Result<()>;

    /// Removes an empty directory.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::Io`].
    fn remove_dir(&self, path: &Path) -> Result<()>;

    /// Creates a character special file with the given permission bits
    /// and major/minor pair.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::DeviceCreateFailure`].
    fn mknod_char(&self, node: &Path, mode: u32, major: u64, minor: u64) -> Result<()>;

    /// Creates a symbolic link at `link` pointing to `original`.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::Io`] naming the link path.
    fn symlink(&self, original: &Path, link: &Path) -> Result<()>;

    /// Sets the hostname of the current UTS namespace.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::NamespaceFailure`].
    fn sethostname(&self, name: &str) -> Result<()>;

    /// Detaches the calling process into new namespaces via `unshare(2)`.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::NamespaceFailure`].
    fn unshare(&self, flags: CloneFlags) -> Result<()>;
}

fn errno_io(errno: nix::errno::Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(errno as i32)
}

/// [`Syscalls`] implementation that issues the real kernel calls via `nix`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSyscalls;

impl Syscalls for NativeSyscalls {
    fn mount(
        &self,
        source: Option<&str>,
        target: &Path,
        fstype: Option<&str>,
        flags: MsFlags,
        data: Option<&str>,
    ) -> Result<()> {
        tracing::debug!(?source, target = %target.display(), ?fstype, ?flags, "mount");
        nix::mount::mount(source, target, fstype, flags, data).map_err(|e| {
            BoxcellError::MountFailure {
                target: target.to_path_buf(),
                source: errno_io(e),
            }
        })
    }

    fn umount_detach(&self, target: &Path) -> Result<()> {
        tracing::debug!(target = %target.display(), "umount (detach)");
        nix::mount::umount2(target, MntFlags::MNT_DETACH).map_err(|e| {
            BoxcellError::RootSwitchFailure {
                step: "umount_old_root",
                path: target.to_path_buf(),
                source: errno_io(e),
            }
        })
    }

    fn pivot_root(&self, new_root: &Path, put_old: &Path) -> Result<()> {
        tracing::debug!(new_root = %new_root.display(), put_old = %put_old.display(), "pivot_root");
        nix::unistd::pivot_root(new_root, put_old).map_err(|e| BoxcellError::RootSwitchFailure {
            step: "pivot_root",
            path: new_root.to_path_buf(),
            source: errno_io(e),
        })
    }

    fn chroot(&self, path: &Path) -> Result<()> {
        tracing::debug!(path = %path.display(), "chroot");
        nix::unistd::chroot(path).map_err(|e| BoxcellError::RootSwitchFailure {
            step: "chroot",
            path: path.to_path_buf(),
            source: errno_io(e),
        })
    }

    fn chdir(&self, path: &Path) -> Result<()> {
        nix::unistd::chdir(path).map_err(|e| BoxcellError::RootSwitchFailure {
            step: "chdir",
            path: path.to_path_buf(),
            source: errno_io(e),
        })
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        std::fs::remove_dir(path).map_err(|e| BoxcellError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn mknod_char(&self, node: &Path, mode: u32, major: u64, minor: u64) -> Result<()> {
        use nix::sys::stat::{Mode, SFlag, makedev, mknod};

        tracing::debug!(node = %node.display(), major, minor, "mknod");
        mknod(
            node,
            SFlag::S_IFCHR,
            Mode::from_bits_truncate(mode),
            makedev(major, minor),
        )
        .map_err(|e| BoxcellError::DeviceCreateFailure {
            node: node.to_path_buf(),
            source: errno_io(e),
        })
    }

    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        std::os::unix::fs::symlink(original, link).map_err(|e| BoxcellError::Io {
            path: link.to_path_buf(),
            source: e,
        })
    }

    fn sethostname(&self, name: &str) -> Result<()> {
        tracing::debug!(name, "sethostname");
        nix::unistd::sethostname(name).map_err(|e| BoxcellError::NamespaceFailure {
            operation: "sethostname",
            source: errno_io(e),
        })
    }

    fn unshare(&self, flags: CloneFlags) -> Result<()> {
        tracing::debug!(?flags, "unshare");
        nix::sched::unshare(flags).map_err(|e| BoxcellError::NamespaceFailure {
            operation: "unshare",
            source: errno_io(e),
        })
    }
}

pub mod recording {
    //! A [`Syscalls`](super::Syscalls) implementation that records every
    //! operation instead of issuing it, so unprivileged tests can assert
    //! on the exact sequence the setup code would have run.

    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    use boxcell_common::error::Result;
    use nix::mount::MsFlags;
    use nix::sched::CloneFlags;

    /// One recorded kernel operation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SysOp {
        /// A `mount(2)` call.
        Mount {
            /// Mount source, if any.
            source: Option<String>,
            /// Mount target.
            target: PathBuf,
            /// Filesystem type, if any.
            fstype: Option<String>,
            /// Mount flags.
            flags: MsFlags,
            /// Options string, if any.
            data: Option<String>,
        },
        /// A lazy-detach unmount.
        UmountDetach(PathBuf),
        /// A `pivot_root(2)` call.
        PivotRoot {
            /// The new root.
            new_root: PathBuf,
            /// Where the old root is relocated.
            put_old: PathBuf,
        },
        /// A `chroot(2)` call.
        Chroot(PathBuf),
        /// A working-directory change.
        Chdir(PathBuf),
        /// An empty-directory removal.
        RemoveDir(PathBuf),
        /// A character device node creation.
        MknodChar {
            /// Node path.
            node: PathBuf,
            /// Permission bits.
            mode: u32,
            /// Major device number.
            major: u64,
            /// Minor device number.
            minor: u64,
        },
        /// A symlink creation.
        Symlink {
            /// Link target.
            original: PathBuf,
            /// Link path.
            link: PathBuf,
        },
        /// A hostname change.
        Sethostname(String),
        /// An `unshare(2)` call.
        Unshare(CloneFlags),
    }

    /// Records operations in issue order; never touches the kernel.
    #[derive(Debug, Default)]
    pub struct RecordingSyscalls {
        ops: RefCell<Vec<SysOp>>,
    }

    impl RecordingSyscalls {
        /// Creates an empty recorder.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Returns a snapshot of the recorded operations.
        #[must_use]
        pub fn ops(&self) -> Vec<SysOp> {
            self.ops.borrow().clone()
        }

        fn push(&self, op: SysOp) {
            self.ops.borrow_mut().push(op);
        }
    }

    impl super::Syscalls for RecordingSyscalls {
        fn mount(
            &self,
            source: Option<&str>,
            target: &Path,
            fstype: Option<&str>,
            flags: MsFlags,
            data: Option<&str>,
        ) -> Result<()> {
            self.push(SysOp::Mount {
                source: source.map(str::to_owned),
                target: target.to_path_buf(),
                fstype: fstype.map(str::to_owned),
                flags,
                data: data.map(str::to_owned),
            });
            Ok(())
        }

        fn umount_detach(&self, target: &Path) -> Result<()> {
            self.push(SysOp::UmountDetach(target.to_path_buf()));
            Ok(())
        }

        fn pivot_root(&self, new_root: &Path, put_old: &Path) -> Result<()> {
            self.push(SysOp::PivotRoot {
                new_root: new_root.to_path_buf(),
                put_old: put_old.to_path_buf(),
            });
            Ok(())
        }

        fn chroot(&self, path: &Path) -> Result<()> {
            self.push(SysOp::Chroot(path.to_path_buf()));
            Ok(())
        }

        fn chdir(&self, path: &Path) -> Result<()> {
            self.push(SysOp::Chdir(path.to_path_buf()));
            Ok(())
        }

        fn remove_dir(&self, path: &Path) -> Result<()> {
            self.push(SysOp::RemoveDir(path.to_path_buf()));
            Ok(())
        }

        fn mknod_char(&self, node: &Path, mode: u32, major: u64, minor: u64) -> Result<()> {
            self.push(SysOp::MknodChar {
                node: node.to_path_buf(),
                mode,
                major,
                minor,
            });
            Ok(())
        }

        fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
            self.push(SysOp::Symlink {
                original: original.to_path_buf(),
                link: link.to_path_buf(),
            });
            Ok(())
        }

        fn sethostname(&self, name: &str) -> Result<()> {
            self.push(SysOp::Sethostname(name.to_owned()));
            Ok(())
        }

        fn unshare(&self, flags: CloneFlags) -> Result<()> {
            self.push(SysOp::Unshare(flags));
            Ok(())
        }
    }
}
