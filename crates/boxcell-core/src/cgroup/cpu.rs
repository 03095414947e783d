//! CPU cgroup (v1) assignment.
//!
//! Manages the `tasks` membership file and `cpu.shares`.

use std::path::Path;

use boxcell_common::error::Result;

/// Creates the CPU cgroup directory (if absent), writes `pid` into
/// `tasks`, and applies the shares value when supplied and non-zero.
///
/// Shares are a relative weight; zero means "not set" and leaves the
/// kernel default in force.
///
/// # Errors
///
/// Returns [`CgroupWriteFailure`](boxcell_common::error::BoxcellError::CgroupWriteFailure)
/// if directory creation or a control-file write fails.
pub fn assign_cpu(group_dir: &Path, pid: u32, shares: Option<u64>) -> Result<()> {
    super::ensure_group_dir(group_dir)?;
    super::write_control(&group_dir.join("tasks"), pid)?;

    if let Some(shares) = shares.filter(|&s| s != 0) {
        super::write_control(&group_dir.join("cpu.shares"), shares)?;
        tracing::debug!(shares, "cpu.shares set");
    }
    Ok(())
}
