//! Cgroup v1 resource assignment.
//!
//! Creates per-container subdirectories under the CPU and memory
//! hierarchies and writes the current process id into each `tasks` file.
//! This must happen before the process execs the target command so the
//! limits apply to it — cgroup membership is inherited across fork and
//! exec. Nothing removes the directories afterward; teardown is a
//! deliberate non-goal.

pub mod cpu;
pub mod memory;

use std::path::{Path, PathBuf};

use boxcell_common::constants::{CGROUP_CPU_DIR, CGROUP_MEMORY_DIR, CGROUP_PREFIX};
use boxcell_common::error::{BoxcellError, Result};
use boxcell_common::types::{CgroupLimits, ContainerId};

/// Assigns a process to per-container CPU and memory cgroups.
#[derive(Debug, Clone)]
pub struct CgroupAssigner {
    cpu_base: PathBuf,
    memory_base: PathBuf,
}

impl Default for CgroupAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl CgroupAssigner {
    /// Targets the kernel's real v1 hierarchies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cpu_base: PathBuf::from(CGROUP_CPU_DIR),
            memory_base: PathBuf::from(CGROUP_MEMORY_DIR),
        }
    }

    /// Targets arbitrary hierarchy roots. Used by tests to point at a
    /// plain directory instead of the cgroup filesystem.
    #[must_use]
    pub fn with_hierarchies(cpu_base: impl Into<PathBuf>, memory_base: impl Into<PathBuf>) -> Self {
        Self {
            cpu_base: cpu_base.into(),
            memory_base: memory_base.into(),
        }
    }

    /// Returns this container's CPU cgroup directory.
    #[must_use]
    pub fn cpu_dir(&self, id: &ContainerId) -> PathBuf {
        self.cpu_base.join(CGROUP_PREFIX).join(id.as_str())
    }

    /// Returns this container's memory cgroup directory.
    #[must_use]
    pub fn memory_dir(&self, id: &ContainerId) -> PathBuf {
        self.memory_base.join(CGROUP_PREFIX).join(id.as_str())
    }

    /// Places `pid` into both per-container cgroups and applies any
    /// supplied limits. Unset limits leave the kernel defaults in force.
    ///
    /// # Errors
    ///
    /// Returns [`BoxcellError::CgroupWriteFailure`] if a cgroup directory
    /// cannot be created or a control file cannot be written. Permission
    /// failures and missing controllers are not distinguished; all are
    /// fatal to the run.
    pub fn assign(&self, id: &ContainerId, limits: &CgroupLimits, pid: u32) -> Result<()> {
        cpu::assign_cpu(&self.cpu_dir(id), pid, limits.cpu_shares)?;
        memory::assign_memory(
            &self.memory_dir(id),
            pid,
            limits.memory_bytes,
            limits.memory_swap_bytes,
        )?;
        tracing::info!(container = %id, pid, "cgroups assigned");
        Ok(())
    }
}

pub(crate) fn ensure_group_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| BoxcellError::CgroupWriteFailure {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

pub(crate) fn write_control(path: &Path, value: impl ToString) -> Result<()> {
    std::fs::write(path, value.to_string()).map_err(|e| BoxcellError::CgroupWriteFailure {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigner(dir: &Path) -> CgroupAssigner {
        CgroupAssigner::with_hierarchies(dir.join("cpu"), dir.join("memory"))
    }

    #[test]
    fn assign_writes_pid_into_both_tasks_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let assigner = assigner(dir.path());
        let id = ContainerId::new("c1");

        assigner
            .assign(&id, &CgroupLimits::default(), 4242)
            .expect("assign");

        let cpu_tasks = std::fs::read_to_string(assigner.cpu_dir(&id).join("tasks")).expect("read");
        let mem_tasks =
            std::fs::read_to_string(assigner.memory_dir(&id).join("tasks")).expect("read");
        assert_eq!(cpu_tasks, "4242");
        assert_eq!(mem_tasks, "4242");
    }

    #[test]
    fn unset_limits_leave_control_files_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let assigner = assigner(dir.path());
        let id = ContainerId::new("c1");

        assigner
            .assign(&id, &CgroupLimits::default(), 1)
            .expect("assign");

        assert!(!assigner.cpu_dir(&id).join("cpu.shares").exists());
        assert!(!assigner.memory_dir(&id).join("memory.limit_in_bytes").exists());
        assert!(!assigner
            .memory_dir(&id)
            .join("memory.memsw.limit_in_bytes")
            .exists());
    }

    #[test]
    fn supplied_limits_are_written_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let assigner = assigner(dir.path());
        let id = ContainerId::new("c1");
        let limits = CgroupLimits {
            cpu_shares: Some(512),
            memory_bytes: Some(268_435_456),
            memory_swap_bytes: Some(536_870_912),
        };

        assigner.assign(&id, &limits, 1).expect("assign");

        assert_eq!(
            std::fs::read_to_string(assigner.cpu_dir(&id).join("cpu.shares")).expect("read"),
            "512"
        );
        assert_eq!(
            std::fs::read_to_string(assigner.memory_dir(&id).join("memory.limit_in_bytes"))
                .expect("read"),
            "268435456"
        );
        assert_eq!(
            std::fs::read_to_string(assigner.memory_dir(&id).join("memory.memsw.limit_in_bytes"))
                .expect("read"),
            "536870912"
        );
    }

    #[test]
    fn zero_cpu_shares_is_treated_as_unset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let assigner = assigner(dir.path());
        let id = ContainerId::new("c1");
        let limits = CgroupLimits {
            cpu_shares: Some(0),
            ..CgroupLimits::default()
        };

        assigner.assign(&id, &limits, 1).expect("assign");

        assert!(!assigner.cpu_dir(&id).join("cpu.shares").exists());
    }

    #[test]
    fn distinct_container_ids_get_disjoint_group_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let assigner = assigner(dir.path());
        let a = ContainerId::generate();
        let b = ContainerId::generate();

        assigner.assign(&a, &CgroupLimits::default(), 1).expect("assign a");
        assigner.assign(&b, &CgroupLimits::default(), 2).expect("assign b");

        assert_ne!(assigner.cpu_dir(&a), assigner.cpu_dir(&b));
        assert_ne!(assigner.memory_dir(&a), assigner.memory_dir(&b));
        assert!(assigner.cpu_dir(&a).exists() && assigner.cpu_dir(&b).exists());
    }
}
