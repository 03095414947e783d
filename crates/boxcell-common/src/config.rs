//! Global configuration model for the boxcell runtime.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{CgroupLimits, IsolationLevel};

/// Root configuration for a boxcell invocation.
///
/// Defaults mirror the compiled-in constants; a caller may deserialize an
/// alternative from JSON and feed its fields into a `ContainerSpec`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxcellConfig {
    /// Directory holding image archives and cached extractions.
    pub image_dir: PathBuf,
    /// Base directory for per-container state.
    pub container_dir: PathBuf,
    /// Limits applied when the caller supplies none.
    pub default_limits: CgroupLimits,
    /// Isolation level used when the caller supplies none.
    pub isolation: IsolationLevel,
}

impl Default for BoxcellConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from(crate::constants::DEFAULT_IMAGE_DIR),
            container_dir: PathBuf::from(crate::constants::DEFAULT_CONTAINER_DIR),
            default_limits: CgroupLimits::default(),
            isolation: IsolationLevel::Full,
        }
    }
}
