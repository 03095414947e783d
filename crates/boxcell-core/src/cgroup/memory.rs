//! Memory cgroup (v1) assignment.
//!
//! Manages the `tasks` membership file, `memory.limit_in_bytes`, and
//! `memory.memsw.limit_in_bytes`.

use std::path::Path;

use boxcell_common::error::Result;

/// Creates the memory cgroup directory (if absent), writes `pid` into
/// `tasks`, and applies any supplied byte limits verbatim.
///
/// # Errors
///
/// Returns [`CgroupWriteFailure`](boxcell_common::error::BoxcellError::CgroupWriteFailure)
/// if directory creation or a control-file write fails.
pub fn assign_memory(
    group_dir: &Path,
    pid: u32,
    memory_bytes: Option<u64>,
    memory_swap_bytes: Option<u64>,
) -> Result<()> {
    super::ensure_group_dir(group_dir)?;
    super::write_control(&group_dir.join("tasks"), pid)?;

    if let Some(bytes) = memory_bytes {
        super::write_control(&group_dir.join("memory.limit_in_bytes"), bytes)?;
        tracing::debug!(bytes, "memory.limit_in_bytes set");
    }
    if let Some(bytes) = memory_swap_bytes {
        super::write_control(&group_dir.join("memory.memsw.limit_in_bytes"), bytes)?;
        tracing::debug!(bytes, "memory.memsw.limit_in_bytes set");
    }
    Ok(())
}
