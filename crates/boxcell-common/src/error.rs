//! Unified error types for the boxcell workspace.
//!
//! Every fallible setup step maps onto one of these variants so the
//! supervisor can stop at the first failure and report a tagged reason
//! instead of an opaque errno.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum BoxcellError {
    /// The requested image archive does not exist under the image directory.
    #[error("image '{name}' not found under {image_dir}")]
    ImageNotFound {
        /// Image name that failed to resolve.
        name: String,
        /// Directory that was searched for the archive.
        image_dir: PathBuf,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A mount syscall failed.
    #[error("mount of {target} failed: {source}")]
    MountFailure {
        /// Mount target that could not be mounted.
        target: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// Writing to a cgroup control file failed.
    #[error("cgroup write to {path} failed: {source}")]
    CgroupWriteFailure {
        /// Cgroup file or directory that could not be written.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// A device node could not be created.
    #[error("device node {node} could not be created: {source}")]
    DeviceCreateFailure {
        /// Path of the device node.
        node: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The root switch sequence failed part way through.
    #[error("root switch step '{step}' failed at {path}: {source}")]
    RootSwitchFailure {
        /// Which step of the switch sequence failed.
        step: &'static str,
        /// Path the failing step operated on.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// A namespace syscall (unshare, sethostname) failed.
    #[error("namespace operation '{operation}' failed: {source}")]
    NamespaceFailure {
        /// Name of the failing operation.
        operation: &'static str,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The target command could not replace the setup process.
    #[error("exec of '{program}' failed: {source}")]
    ExecFailure {
        /// Program that could not be executed.
        program: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The isolated child process could not be created or awaited.
    #[error("failed to spawn or wait for container process: {source}")]
    SpawnFailure {
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, BoxcellError>;
