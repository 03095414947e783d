//! Domain primitive types used across the boxcell workspace.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoxcellError;

/// Unique identifier for a container instance.
///
/// A container id names every per-container resource: the writable root
/// directories, the cgroup subdirectories, and (under full isolation)
/// the container's hostname. Ids are never reused; building a second
/// root for an existing id is undefined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random container ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resource limits applied to a container's cgroups.
///
/// Any unset limit leaves the kernel default in force.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CgroupLimits {
    /// CPU shares (relative weight). Zero is treated as unset.
    pub cpu_shares: Option<u64>,
    /// Memory limit in bytes.
    pub memory_bytes: Option<u64>,
    /// Memory plus swap limit in bytes.
    pub memory_swap_bytes: Option<u64>,
}

impl CgroupLimits {
    /// Returns true if no limit is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cpu_shares.is_none() && self.memory_bytes.is_none() && self.memory_swap_bytes.is_none()
    }
}

/// How strongly the container is isolated from the host.
///
/// Each level selects the namespace flags taken at spawn time, the
/// root-construction strategy, and the root-switch primitive. Levels are
/// ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IsolationLevel {
    /// Fork only, plain directory root, `chroot(2)`. A privileged process
    /// can escape a chroot; this level trades isolation for simplicity.
    ChrootOnly,
    /// Fork plus a mount-namespace-only unshare, tmpfs root, `pivot_root(2)`.
    MountOnly,
    /// Clone with new mount, UTS, PID, and network namespaces, overlay
    /// root with a shared image layer, `pivot_root(2)`.
    Full,
}

impl IsolationLevel {
    /// Returns the root-construction strategy this level uses.
    #[must_use]
    pub const fn root_strategy(self) -> RootStrategy {
        match self {
            Self::Full => RootStrategy::Overlay,
            Self::MountOnly => RootStrategy::Tmpfs,
            Self::ChrootOnly => RootStrategy::PlainDir,
        }
    }

    /// Whether the root switch uses `pivot_root(2)` rather than `chroot(2)`.
    #[must_use]
    pub const fn uses_pivot_root(self) -> bool {
        !matches!(self, Self::ChrootOnly)
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::MountOnly => write!(f, "mount"),
            Self::ChrootOnly => write!(f, "chroot"),
        }
    }
}

impl FromStr for IsolationLevel {
    type Err = BoxcellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "mount" => Ok(Self::MountOnly),
            "chroot" => Ok(Self::ChrootOnly),
            other => Err(BoxcellError::Config {
                message: format!("unknown isolation level '{other}' (expected full, mount, or chroot)"),
            }),
        }
    }
}

/// How the container's root directory tree is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RootStrategy {
    /// Overlay mount: shared read-only image layer + per-container
    /// writable upper layer.
    Overlay,
    /// Fresh tmpfs with the image extracted straight into it.
    Tmpfs,
    /// Plain directory with the image extracted straight into it.
    PlainDir,
}

/// Everything needed to run one command in one container.
///
/// Created once per invocation and immutable afterward; owned exclusively
/// by the supervisor for the lifetime of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Unique identifier for this run.
    pub id: ContainerId,
    /// Target command: executable path followed by its arguments.
    pub command: Vec<String>,
    /// Image name, resolved to `<image_dir>/<image_name>.tar`.
    pub image_name: String,
    /// Directory holding image archives and cached extractions.
    pub image_dir: PathBuf,
    /// Base directory for per-container state.
    pub container_dir: PathBuf,
    /// Cgroup resource limits.
    pub limits: CgroupLimits,
    /// Isolation strength for this run.
    pub isolation: IsolationLevel,
    /// User specifier (`<uid>[:<gid>]`). Accepted and recorded but not
    /// applied; left to an outer layer.
    pub user: Option<String>,
}
