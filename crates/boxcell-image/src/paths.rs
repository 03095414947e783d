//! Image and container directory layout.

use std::path::{Path, PathBuf};

use boxcell_common::constants::{COW_RW_DIR, COW_WORK_DIR, IMAGE_SUFFIXES, ROOTFS_DIR};
use boxcell_common::error::{BoxcellError, Result};
use boxcell_common::types::ContainerId;

/// Resolves an image name to its archive path under `image_dir`,
/// probing `<name>.tar`, `<name>.tar.gz`, and `<name>.tgz` in order.
///
/// This check runs before any namespace or mount operation, since those
/// are expensive to unwind.
///
/// # Errors
///
/// Returns [`BoxcellError::ImageNotFound`] if no candidate exists.
pub fn resolve_archive(image_dir: &Path, image_name: &str) -> Result<PathBuf> {
    for suffix in IMAGE_SUFFIXES {
        let candidate = image_dir.join(format!("{image_name}.{suffix}"));
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(BoxcellError::ImageNotFound {
        name: image_name.to_owned(),
        image_dir: image_dir.to_path_buf(),
    })
}

/// The cached, shared, read-only extraction directory for an image.
#[must_use]
pub fn image_root_path(image_dir: &Path, image_name: &str) -> PathBuf {
    image_dir.join(image_name).join(ROOTFS_DIR)
}

/// Per-container directory layout under `<container_dir>/<container_id>`.
#[derive(Debug, Clone)]
pub struct ContainerLayout {
    base: PathBuf,
}

impl ContainerLayout {
    /// Layout for one container id. Nothing is created on disk.
    #[must_use]
    pub fn new(container_dir: &Path, id: &ContainerId) -> Self {
        Self {
            base: container_dir.join(id.as_str()),
        }
    }

    /// The container's base directory.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Writable upper layer for the overlay (layered variant).
    #[must_use]
    pub fn cow_rw(&self) -> PathBuf {
        self.base.join(COW_RW_DIR)
    }

    /// Overlay work area (layered variant).
    #[must_use]
    pub fn cow_workdir(&self) -> PathBuf {
        self.base.join(COW_WORK_DIR)
    }

    /// The container's future `/`: overlay mount point or extraction
    /// target, depending on the root strategy.
    #[must_use]
    pub fn rootfs(&self) -> PathBuf {
        self.base.join(ROOTFS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_finds_plain_tar_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("ubuntu.tar"), b"").expect("write");
        std::fs::write(dir.path().join("ubuntu.tar.gz"), b"").expect("write");

        let archive = resolve_archive(dir.path(), "ubuntu").expect("resolve");
        assert_eq!(archive, dir.path().join("ubuntu.tar"));
    }

    #[test]
    fn resolve_falls_back_to_compressed_suffixes() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("alpine.tgz"), b"").expect("write");

        let archive = resolve_archive(dir.path(), "alpine").expect("resolve");
        assert_eq!(archive, dir.path().join("alpine.tgz"));
    }

    #[test]
    fn missing_archive_is_image_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolve_archive(dir.path(), "ghost").expect_err("should fail");
        assert!(matches!(err, BoxcellError::ImageNotFound { ref name, .. } if name == "ghost"));
    }

    #[test]
    fn layout_paths_are_namespaced_by_container_id() {
        let id = ContainerId::new("abc");
        let layout = ContainerLayout::new(Path::new("/var/ctr"), &id);
        assert_eq!(layout.base(), Path::new("/var/ctr/abc"));
        assert_eq!(layout.cow_rw(), PathBuf::from("/var/ctr/abc/cow_rw"));
        assert_eq!(layout.cow_workdir(), PathBuf::from("/var/ctr/abc/cow_workdir"));
        assert_eq!(layout.rootfs(), PathBuf::from("/var/ctr/abc/rootfs"));
    }

    #[test]
    fn distinct_ids_get_disjoint_layouts() {
        let a = ContainerLayout::new(Path::new("/c"), &ContainerId::generate());
        let b = ContainerLayout::new(Path::new("/c"), &ContainerId::generate());
        assert_ne!(a.base(), b.base());
    }
}
