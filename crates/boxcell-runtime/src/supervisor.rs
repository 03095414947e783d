//! Child creation and exit reporting.
//!
//! The full isolation level takes its namespaces with a combined
//! clone-with-flags; the reduced levels fork and (for mount-only)
//! unshare inside the child. The parent's only job afterward is a
//! blocking wait — there is no timeout, no retry, and no rollback of
//! anything the child created before failing.

use boxcell_common::constants::SETUP_FAILURE_STATUS;
use boxcell_common::error::{BoxcellError, Result};
use boxcell_common::types::ContainerSpec;
use boxcell_core::cgroup::CgroupAssigner;
use boxcell_core::namespace;
use boxcell_core::sys::{NativeSyscalls, Syscalls};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};

/// Stack size for the cloned child.
const CHILD_STACK_SIZE: usize = 1024 * 1024;

/// Outcome of a completed container run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// Process id of the container's init process, as seen by the host.
    pub pid: i32,
    /// Exit status: the command's own code, `128 + signal` if it was
    /// killed, or [`SETUP_FAILURE_STATUS`] if container setup failed.
    pub status: i32,
}

impl ExitReport {
    /// Whether the run failed during container setup rather than in the
    /// contained command itself.
    #[must_use]
    pub const fn setup_failed(&self) -> bool {
        self.status == SETUP_FAILURE_STATUS
    }
}

/// Runs the container described by `spec` using the native kernel
/// operations, blocking until the contained command terminates.
///
/// # Errors
///
/// Returns [`BoxcellError::SpawnFailure`] if the child cannot be created
/// or awaited. Setup errors inside the child do not surface here; they
/// appear as an [`ExitReport`] with [`SETUP_FAILURE_STATUS`].
pub fn run(spec: &ContainerSpec) -> Result<ExitReport> {
    run_with(spec, &NativeSyscalls, &CgroupAssigner::new())
}

/// [`run`] with an explicit kernel-operations capability and cgroup
/// assigner, so tests can substitute a recording capability and point
/// the cgroup writes at a plain directory.
///
/// # Errors
///
/// See [`run`].
pub fn run_with(
    spec: &ContainerSpec,
    sys: &dyn Syscalls,
    cgroups: &CgroupAssigner,
) -> Result<ExitReport> {
    let pid = spawn(spec, sys, cgroups)?;
    tracing::info!(container = %spec.id, pid = pid.as_raw(), "container child spawned");
    wait(pid)
}

#[allow(unsafe_code)]
fn spawn(spec: &ContainerSpec, sys: &dyn Syscalls, cgroups: &CgroupAssigner) -> Result<Pid> {
    let flags = namespace::clone_flags(spec.isolation);

    if flags.is_empty() {
        // SAFETY: the child immediately runs the setup sequence and then
        // either execs or exits; it never returns into caller frames.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => Ok(child),
            Ok(ForkResult::Child) => {
                let code = crate::child::child_main(spec, sys, cgroups);
                #[allow(clippy::cast_possible_truncation)]
                std::process::exit(code as i32);
            }
            Err(e) => Err(spawn_err(e)),
        }
    } else {
        let mut stack = vec![0_u8; CHILD_STACK_SIZE];
        let cb = Box::new(|| crate::child::child_main(spec, sys, cgroups));
        // SAFETY: the callback only touches data owned by or borrowed
        // into this call, both processes share the address space rules
        // of clone(2) with a fresh stack, and the child terminates via
        // exec or its return code.
        unsafe { nix::sched::clone(cb, &mut stack, flags, Some(libc::SIGCHLD)) }
            .map_err(spawn_err)
    }
}

/// Blocks until the child terminates. Cannot be cancelled once begun.
fn wait(pid: Pid) -> Result<ExitReport> {
    match waitpid(pid, None) {
        Ok(WaitStatus::Exited(child, code)) => Ok(ExitReport {
            pid: child.as_raw(),
            status: code,
        }),
        Ok(WaitStatus::Signaled(child, signal, _)) => Ok(ExitReport {
            pid: child.as_raw(),
            status: 128 + signal as i32,
        }),
        Ok(other) => Err(BoxcellError::SpawnFailure {
            source: std::io::Error::other(format!("unexpected wait status: {other:?}")),
        }),
        Err(e) => Err(spawn_err(e)),
    }
}

fn spawn_err(errno: nix::errno::Errno) -> BoxcellError {
    BoxcellError::SpawnFailure {
        source: std::io::Error::from_raw_os_error(errno as i32),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use boxcell_common::types::{CgroupLimits, ContainerId, IsolationLevel};
    use boxcell_core::sys::recording::RecordingSyscalls;

    use super::*;

    #[test]
    fn setup_failure_status_is_distinguished() {
        let setup = ExitReport {
            pid: 100,
            status: SETUP_FAILURE_STATUS,
        };
        let command = ExitReport { pid: 100, status: 1 };
        let success = ExitReport { pid: 100, status: 0 };
        assert!(setup.setup_failed());
        assert!(!command.setup_failed());
        assert!(!success.setup_failed());
    }

    fn write_minimal_tar(image_dir: &Path) {
        let file = std::fs::File::create(image_dir.join("mini.tar")).expect("create tar");
        let mut builder = tar::Builder::new(file);
        let data = b"mini";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "etc/hostname", &data[..])
            .expect("append");
        builder.finish().expect("finish");
    }

    // With the recording capability the chroot is recorded rather than
    // issued, so the forked child execs the host's /bin/true and the
    // whole supervisor path runs without privileges.
    #[test]
    #[allow(clippy::print_stderr)]
    fn run_with_injected_capabilities_reports_command_exit() {
        if !Path::new("/bin/true").exists() {
            eprintln!("skipping: /bin/true not present");
            return;
        }

        let workdir = tempfile::tempdir().expect("tempdir");
        let image_dir = workdir.path().join("images");
        let container_dir = workdir.path().join("containers");
        std::fs::create_dir_all(&image_dir).expect("mkdir");
        std::fs::create_dir_all(&container_dir).expect("mkdir");
        write_minimal_tar(&image_dir);

        let cgroups = CgroupAssigner::with_hierarchies(
            workdir.path().join("cgroup/cpu"),
            workdir.path().join("cgroup/memory"),
        );
        let spec = ContainerSpec {
            id: ContainerId::generate(),
            command: vec!["/bin/true".into()],
            image_name: "mini".into(),
            image_dir,
            container_dir: container_dir.clone(),
            limits: CgroupLimits::default(),
            isolation: IsolationLevel::ChrootOnly,
            user: None,
        };
        let sys = RecordingSyscalls::new();

        let report = run_with(&spec, &sys, &cgroups).expect("run_with");

        assert_eq!(report.status, 0);
        assert!(!report.setup_failed());
        // The child's setup side effects land on the shared filesystem.
        assert!(cgroups.cpu_dir(&spec.id).join("tasks").is_file());
        assert!(cgroups.memory_dir(&spec.id).join("tasks").is_file());
        assert!(container_dir.join(spec.id.as_str()).join("rootfs/etc/hostname").exists());
    }
}
