//! The in-child setup sequence.
//!
//! Runs between namespace entry and `execvp(2)`. Every error raised by a
//! setup step is caught at the top of the child routine, reported with
//! full diagnostic context, and converted into the distinguished
//! setup-failure exit status so the parent can tell "setup failed" from
//! "the contained command exited non-zero."

use std::convert::Infallible;
use std::ffi::CString;
use std::fmt;

use boxcell_common::constants::SETUP_FAILURE_STATUS;
use boxcell_common::error::{BoxcellError, Result};
use boxcell_common::types::{ContainerSpec, IsolationLevel};
use boxcell_core::cgroup::CgroupAssigner;
use boxcell_core::filesystem::{mount, pivot_root};
use boxcell_core::sys::Syscalls;
use boxcell_core::{devices, namespace};

/// Progress marker for the per-run state machine. Terminal on `Execed`
/// (success) or on the first failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetupPhase {
    Created,
    NamespaceEntered,
    RootBuilt,
    Mounted,
    RootSwitched,
    Execed,
}

impl fmt::Display for SetupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::NamespaceEntered => write!(f, "namespace-entered"),
            Self::RootBuilt => write!(f, "root-built"),
            Self::Mounted => write!(f, "mounted"),
            Self::RootSwitched => write!(f, "root-switched"),
            Self::Execed => write!(f, "exec'd"),
        }
    }
}

/// Entry point of the isolated child. Never returns normally on
/// success — the target command replaces the process image.
pub(crate) fn child_main(
    spec: &ContainerSpec,
    sys: &dyn Syscalls,
    cgroups: &CgroupAssigner,
) -> isize {
    match setup_and_exec(spec, sys, cgroups) {
        Ok(never) => match never {},
        Err(e) => {
            tracing::error!(container = %spec.id, error = %e, "container setup failed");
            SETUP_FAILURE_STATUS as isize
        }
    }
}

fn setup_and_exec(
    spec: &ContainerSpec,
    sys: &dyn Syscalls,
    cgroups: &CgroupAssigner,
) -> Result<Infallible> {
    tracing::debug!(container = %spec.id, phase = %SetupPhase::Created, "child started");

    // Under full isolation the namespaces were taken at clone time; the
    // new UTS namespace is named after the container.
    if spec.isolation == IsolationLevel::Full {
        sys.sethostname(spec.id.as_str())?;
    }

    // Cgroup membership is inherited across exec, so assignment happens
    // before the target command replaces this process.
    cgroups.assign(&spec.id, &spec.limits, std::process::id())?;

    let root = boxcell_image::build_root(spec, sys)?;
    tracing::debug!(container = %spec.id, phase = %SetupPhase::RootBuilt, root = %root.display(), "root ready");

    namespace::enter_namespaces(spec.isolation, sys)?;
    tracing::debug!(container = %spec.id, phase = %SetupPhase::NamespaceEntered, "namespaces ready");

    mount::prepare_mounts(&root, sys)?;
    devices::provision_devices(&root, sys)?;
    tracing::debug!(container = %spec.id, phase = %SetupPhase::Mounted, "mounts ready");

    if spec.isolation.uses_pivot_root() {
        pivot_root::switch_root(&root, sys)?;
    } else {
        pivot_root::enter_chroot(&root, sys)?;
    }
    tracing::debug!(container = %spec.id, phase = %SetupPhase::RootSwitched, "root switched");

    tracing::debug!(container = %spec.id, phase = %SetupPhase::Execed, command = ?spec.command, "handing off");
    exec_command(&spec.command)
}

/// Replaces the process image with the target command.
fn exec_command(command: &[String]) -> Result<Infallible> {
    let argv = command_argv(command)?;
    match nix::unistd::execvp(&argv[0], &argv) {
        Ok(never) => match never {},
        Err(e) => Err(BoxcellError::ExecFailure {
            program: command[0].clone(),
            source: std::io::Error::from_raw_os_error(e as i32),
        }),
    }
}

pub(crate) fn command_argv(command: &[String]) -> Result<Vec<CString>> {
    if command.is_empty() {
        return Err(BoxcellError::Config {
            message: "container command must not be empty".into(),
        });
    }
    command
        .iter()
        .map(|arg| {
            CString::new(arg.as_str()).map_err(|_| BoxcellError::Config {
                message: format!("command argument contains a NUL byte: {arg:?}"),
            })
        })
        .collect()
}
