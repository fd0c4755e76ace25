//! Archive extraction for downloaded tool packages.
//!
//! This module handles extracting the archive formats tool distributions
//! ship in (zip, tar.gz, tar.xz) and setting executable permissions on Unix.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use super::types::ArchiveFormat;

/// Temporary name the single top-level directory is moved to while flattening.
const FLATTEN_STAGING_DIR: &str = ".toolpin-unpack";

// ============================================================================
// Archive Extraction
// ============================================================================

/// Extracts an archive to a destination directory.
///
/// # Arguments
///
/// * `archive_path` - Path to the archive file.
/// * `dest_dir` - Directory to extract into.
/// * `format` - The archive format.
///
/// # Errors
///
/// Returns an error if extraction fails.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path, format: ArchiveFormat) -> Result<()> {
    info!(
        "Extracting {:?} archive {} to {}",
        format,
        archive_path.display(),
        dest_dir.display()
    );

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    match format {
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
        ArchiveFormat::TarXz => extract_tar_xz(archive_path, dest_dir),
    }
}

// ============================================================================
// ZIP Extraction
// ============================================================================

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open zip: {}", archive_path.display()))?;

    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read zip: {}", archive_path.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => path.to_owned(),
            None => {
                debug!("Skipping unsafe path in zip");
                continue;
            }
        };

        let dest_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut outfile = File::create(&dest_path)
                .with_context(|| format!("Failed to create: {}", dest_path.display()))?;

            io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            set_unix_permissions(&dest_path, entry.unix_mode())?;
        }
    }

    debug!("ZIP extraction complete");
    Ok(())
}

// ============================================================================
// TAR Extraction
// ============================================================================

fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open tar.gz: {}", archive_path.display()))?;

    let reader = BufReader::new(file);
    let decoder = flate2::read::GzDecoder::new(reader);
    extract_tar(decoder, dest_dir)
}

fn extract_tar_xz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open tar.xz: {}", archive_path.display()))?;

    let reader = BufReader::new(file);
    let decoder = xz2::read::XzDecoder::new(reader);
    extract_tar(decoder, dest_dir)
}

fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    let dest_dir_canonical = dest_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", dest_dir.display()))?;

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_type = entry.header().entry_type();

        if entry_type.is_hard_link() {
            warn!("Skipping hardlink in tar archive");
            continue;
        }

        let path = entry.path()?.into_owned();

        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            warn!("Skipping unsafe path in tar: {:?}", path);
            continue;
        }

        // "./" names the destination itself.
        let file_name = match path.file_name() {
            Some(name) => name.to_owned(),
            None => continue,
        };

        // Earlier entries may have created links, so the parent is resolved
        // on disk before anything is created under it.
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        let dest_parent = match resolve_on_disk(&dest_dir_canonical, parent) {
            Some(resolved) if resolved.starts_with(&dest_dir_canonical) => resolved,
            resolved => {
                warn!(
                    "Skipping path that escapes dest_dir: {:?} -> {:?}",
                    path, resolved
                );
                continue;
            }
        };
        let dest_path = dest_parent.join(&file_name);

        if entry_type.is_symlink() {
            let target = match entry.link_name()? {
                Some(target) => target.into_owned(),
                None => {
                    warn!("Skipping symlink without target: {:?}", path);
                    continue;
                }
            };

            let inside = resolve_on_disk(&dest_parent, &target)
                .is_some_and(|resolved| resolved.starts_with(&dest_dir_canonical));
            if !inside {
                warn!("Skipping symlink escaping dest_dir: {:?} -> {:?}", path, target);
                continue;
            }

            if dest_path.symlink_metadata().is_ok() {
                warn!("Skipping symlink over existing entry: {:?}", path);
                continue;
            }

            create_symlink(&target, &dest_path)?;
        } else if entry_type.is_dir() {
            fs::create_dir_all(&dest_path)?;
        } else if entry_type.is_file() {
            fs::create_dir_all(&dest_parent)?;

            // Never write through a link left by an earlier entry.
            if dest_path
                .symlink_metadata()
                .is_ok_and(|meta| meta.file_type().is_symlink())
            {
                fs::remove_file(&dest_path)
                    .with_context(|| format!("Failed to replace {}", dest_path.display()))?;
            }

            let mut outfile = File::create(&dest_path)
                .with_context(|| format!("Failed to create: {}", dest_path.display()))?;
            io::copy(&mut entry, &mut outfile)?;
            outfile.flush()?;

            #[cfg(unix)]
            {
                if let Ok(mode) = entry.header().mode() {
                    set_unix_permissions(&dest_path, Some(mode))?;
                }
            }
        }
    }

    debug!("TAR extraction complete");
    Ok(())
}

// ============================================================================
// Symbolic Links
// ============================================================================

/// Resolves `relative` against `base` the way the filesystem will, following
/// links that already exist on disk.
///
/// Returns `None` for absolute paths. Components that do not exist yet are
/// joined as written.
fn resolve_on_disk(base: &Path, relative: &Path) -> Option<PathBuf> {
    let mut resolved = base.to_path_buf();

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                if resolved.symlink_metadata().is_ok() {
                    if let Ok(canonical) = resolved.canonicalize() {
                        resolved = canonical;
                    }
                }
            }
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(resolved)
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)?;
    }
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("Failed to create symlink {}", link.display()))
}

#[cfg(not(unix))]
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    warn!(
        "Skipping symlink {} -> {} (unsupported on this platform)",
        link.display(),
        target.display()
    );
    Ok(())
}

// ============================================================================
// Layout
// ============================================================================

/// Moves the contents of a single top-level directory up into `dir`.
///
/// Distributions wrap everything in one versioned folder
/// (`node-v16.14.0-linux-x64/`). Returns true if flattening happened.
pub fn flatten_single_root(dir: &Path) -> Result<bool> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()?;

    if entries.len() != 1 {
        return Ok(false);
    }

    let root = entries[0].path();
    if !root.symlink_metadata()?.file_type().is_dir() {
        return Ok(false);
    }

    let staging = dir.join(FLATTEN_STAGING_DIR);
    fs::rename(&root, &staging)
        .with_context(|| format!("Failed to move {}", root.display()))?;

    for entry in fs::read_dir(&staging)? {
        let entry = entry?;
        let source = entry.path();
        let dest: PathBuf = dir.join(entry.file_name());
        fs::rename(&source, &dest).with_context(|| {
            format!("Failed to move {} to {}", source.display(), dest.display())
        })?;
    }

    fs::remove_dir(&staging)
        .with_context(|| format!("Failed to remove {}", staging.display()))?;

    debug!("Flattened {} into {}", root.display(), dir.display());
    Ok(true)
}

// ============================================================================
// Unix Permissions
// ============================================================================

#[cfg(unix)]
fn set_unix_permissions(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        if mode & 0o111 != 0 {
            let permissions = fs::Permissions::from_mode(mode | 0o755);
            fs::set_permissions(path, permissions)
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }
    }

    Ok(())
}

/// Sets executable permission on a file (Unix only).
///
/// On Windows, this is a no-op.
#[allow(unused_variables)]
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to get metadata for {}", path.display()))?;

        let mut permissions = metadata.permissions();
        let current_mode = permissions.mode();
        permissions.set_mode(current_mode | 0o755);

        fs::set_permissions(path, permissions).with_context(|| {
            format!("Failed to set executable permission on {}", path.display())
        })?;

        debug!("Set executable permission on {}", path.display());
    }

    Ok(())
}
