//! Filesystem preparation for a file-backed store.
//!
//! The database holds password and key material, so the directory is kept
//! owner-only and the database file plus its WAL/SHM sidecars are 0o600.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[cfg(unix)]
const DIR_MODE: u32 = 0o700;
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Files SQLite keeps next to the database in WAL mode.
#[cfg(unix)]
const SIDECARS: [&str; 2] = ["-wal", "-shm"];

/// Create the parent directory and database file with owner-only permissions.
pub(crate) fn prepare_db_path(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => secure_dir(parent)?,
        _ => {}
    }
    create_db_file(path)?;
    restrict_db_files(path)
}

fn secure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};

        let metadata = fs::metadata(dir)
            .with_context(|| format!("Failed to stat store directory: {}", dir.display()))?;
        // Someone else's directory (e.g. /tmp) is left as is.
        let owned = metadata.uid() == unsafe { libc::getuid() };
        if owned && metadata.permissions().mode() & 0o077 != 0 {
            fs::set_permissions(dir, fs::Permissions::from_mode(DIR_MODE)).with_context(|| {
                format!("Failed to restrict store directory: {}", dir.display())
            })?;
        }
    }
    Ok(())
}

fn create_db_file(path: &Path) -> Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).truncate(false).read(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    options
        .open(path)
        .map(drop)
        .with_context(|| format!("Failed to create database file: {}", path.display()))
}

/// Tighten a pre-existing database and whichever sidecars are present.
#[cfg(unix)]
fn restrict_db_files(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE))
        .with_context(|| format!("Failed to restrict database file: {}", path.display()))?;
    for sidecar in SIDECARS.map(|suffix| sidecar_path(path, suffix)) {
        if sidecar.exists() {
            fs::set_permissions(&sidecar, fs::Permissions::from_mode(FILE_MODE)).with_context(
                || format!("Failed to restrict database sidecar: {}", sidecar.display()),
            )?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_db_files(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
