//! Per-container root construction.
//!
//! `build_root` is not idempotent: building a second root for an id that
//! already has one is undefined, so callers use a fresh id per run.

use std::path::{Path, PathBuf};

use boxcell_common::error::{BoxcellError, Result};
use boxcell_common::types::{ContainerSpec, RootStrategy};
use boxcell_core::filesystem::overlayfs::{self, overlay_for};
use boxcell_core::sys::Syscalls;
use nix::mount::MsFlags;

use crate::extract::{ensure_image_root, extract_archive};
use crate::paths::{ContainerLayout, resolve_archive};

/// Produces the container's future `/` and returns its path.
///
/// The image archive is resolved first, so a missing image aborts the
/// run before any directory is created under the container path and
/// before any mount is issued.
///
/// # Errors
///
/// Returns [`BoxcellError::ImageNotFound`] if the archive is absent,
/// [`BoxcellError::Io`] for directory/extraction failures, or
/// [`BoxcellError::MountFailure`] if the overlay or tmpfs mount fails.
pub fn build_root(spec: &ContainerSpec, sys: &dyn Syscalls) -> Result<PathBuf> {
    let archive = resolve_archive(&spec.image_dir, &spec.image_name)?;
    let layout = ContainerLayout::new(&spec.container_dir, &spec.id);

    match spec.isolation.root_strategy() {
        RootStrategy::Overlay => build_overlay_root(spec, &archive, &layout, sys),
        RootStrategy::Tmpfs => build_scratch_root(&archive, &layout, true, sys),
        RootStrategy::PlainDir => build_scratch_root(&archive, &layout, false, sys),
    }
}

/// Layered mode: shared read-only image layer under a per-container
/// copy-on-write upper layer.
fn build_overlay_root(
    spec: &ContainerSpec,
    archive: &Path,
    layout: &ContainerLayout,
    sys: &dyn Syscalls,
) -> Result<PathBuf> {
    let image_root = ensure_image_root(&spec.image_dir, &spec.image_name, archive)?;

    let cow_rw = layout.cow_rw();
    let cow_workdir = layout.cow_workdir();
    let rootfs = layout.rootfs();
    for dir in [&cow_rw, &cow_workdir, &rootfs] {
        create_dir(dir)?;
    }

    let config = overlay_for(&image_root, &cow_rw, &cow_workdir, &rootfs);
    overlayfs::mount_overlay(&config, sys)?;

    tracing::info!(container = %spec.id, rootfs = %rootfs.display(), "layered root built");
    Ok(rootfs)
}

/// Simple mode: a fresh writable area with the image extracted straight
/// into it. `tmpfs` selects whether the area is memory-backed.
fn build_scratch_root(
    archive: &Path,
    layout: &ContainerLayout,
    tmpfs: bool,
    sys: &dyn Syscalls,
) -> Result<PathBuf> {
    let rootfs = layout.rootfs();
    create_dir(&rootfs)?;

    if tmpfs {
        sys.mount(
            Some("tmpfs"),
            &rootfs,
            Some("tmpfs"),
            MsFlags::empty(),
            Some("mode=755"),
        )?;
    }
    extract_archive(archive, &rootfs)?;

    tracing::info!(rootfs = %rootfs.display(), tmpfs, "scratch root built");
    Ok(rootfs)
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| BoxcellError::Io {
        path: dir.to_path_buf(),
        source: e,
    })
}
