//! Archive extraction with device-member exclusion and cache management.
//!
//! Tar archives may contain character and block device members; those
//! are skipped during extraction — the runtime provisions its own device
//! nodes, and faithfully recreating archived ones could grant unintended
//! device access.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use boxcell_common::error::{BoxcellError, Result};

use crate::paths::image_root_path;

/// Extracts `archive` into `target`, skipping device-typed members.
///
/// Supports plain `.tar` and gzip-compressed `.tar.gz` / `.tgz`.
///
/// # Errors
///
/// Returns [`BoxcellError::Io`] if the archive cannot be opened or a
/// member cannot be unpacked.
pub fn extract_archive(archive_path: &Path, target: &Path) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| BoxcellError::Io {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    if is_gzip_archive(archive_path) {
        unpack_members(tar::Archive::new(flate2::read::GzDecoder::new(file)), target)
    } else {
        unpack_members(tar::Archive::new(file), target)
    }
}

fn unpack_members<R: Read>(mut archive: tar::Archive<R>, target: &Path) -> Result<()> {
    archive.set_preserve_permissions(true);
    let entries = archive.entries().map_err(|e| BoxcellError::Io {
        path: target.to_path_buf(),
        source: e,
    })?;

    let mut skipped = 0_u32;
    for entry in entries {
        let mut entry = entry.map_err(|e| BoxcellError::Io {
            path: target.to_path_buf(),
            source: e,
        })?;
        let kind = entry.header().entry_type();
        if kind.is_character_special() || kind.is_block_special() {
            skipped += 1;
            continue;
        }
        let _ = entry.unpack_in(target).map_err(|e| BoxcellError::Io {
            path: target.to_path_buf(),
            source: e,
        })?;
    }

    if skipped > 0 {
        tracing::warn!(skipped, target = %target.display(), "device members excluded from extraction");
    }
    Ok(())
}

/// Returns the cached extraction for an image, extracting at most once
/// per image name.
///
/// Two runs racing to build the same cache are resolved by extracting
/// into a process-unique staging directory and atomically renaming it
/// into place; a losing racer discards its staging tree and observes the
/// winner's cache. The cache is shared and must be treated as read-only
/// by callers.
///
/// # Errors
///
/// Returns [`BoxcellError::Io`] if extraction or the rename fails for a
/// reason other than losing the race.
pub fn ensure_image_root(image_dir: &Path, image_name: &str, archive: &Path) -> Result<PathBuf> {
    let root = image_root_path(image_dir, image_name);
    if root.exists() {
        tracing::debug!(image = image_name, root = %root.display(), "image cache hit");
        return Ok(root);
    }

    let staging = image_dir
        .join(image_name)
        .join(format!(".extract-{}", std::process::id()));
    std::fs::create_dir_all(&staging).map_err(|e| BoxcellError::Io {
        path: staging.clone(),
        source: e,
    })?;
    extract_archive(archive, &staging)?;

    match std::fs::rename(&staging, &root) {
        Ok(()) => {
            tracing::info!(image = image_name, root = %root.display(), "image extracted");
        }
        Err(_) if root.exists() => {
            // Lost the race; the winner's cache stands.
            let _ = std::fs::remove_dir_all(&staging);
            tracing::debug!(image = image_name, "concurrent extraction won the race");
        }
        Err(e) => {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(BoxcellError::Io {
                path: root,
                source: e,
            });
        }
    }
    Ok(root)
}

fn is_gzip_archive(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("tgz"))
}
