//! System-wide constants and default paths.

/// Default directory for image archives and cached extractions.
pub const DEFAULT_IMAGE_DIR: &str = "/var/lib/boxcell/images";

/// Default base directory for per-container state.
pub const DEFAULT_CONTAINER_DIR: &str = "/var/lib/boxcell/containers";

/// Base path of the cgroup v1 CPU hierarchy.
pub const CGROUP_CPU_DIR: &str = "/sys/fs/cgroup/cpu";

/// Base path of the cgroup v1 memory hierarchy.
pub const CGROUP_MEMORY_DIR: &str = "/sys/fs/cgroup/memory";

/// Subdirectory under each cgroup hierarchy that namespaces our containers.
pub const CGROUP_PREFIX: &str = "boxcell";

/// Exit status reported by the child when container setup (not the target
/// command) failed. Distinct from common command exit codes so callers
/// can tell the two apart.
pub const SETUP_FAILURE_STATUS: i32 = 117;

/// Archive suffixes probed when resolving an image name, in order.
pub const IMAGE_SUFFIXES: &[&str] = &["tar", "tar.gz", "tgz"];

/// Name of the writable upper layer directory in a layered container.
pub const COW_RW_DIR: &str = "cow_rw";

/// Name of the overlay work directory in a layered container.
pub const COW_WORK_DIR: &str = "cow_workdir";

/// Name of the container's root mount point directory.
pub const ROOTFS_DIR: &str = "rootfs";

/// Application name used in CLI output.
pub const APP_NAME: &str = "boxcell";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "bxc";
