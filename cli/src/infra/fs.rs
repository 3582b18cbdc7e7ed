//! Filesystem infrastructure: implements `BackupStore` for local backups.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::application::ports::BackupStore;
use crate::domain::ArchiveInfo;
use crate::domain::renewal::{LATEST_LINK, hex_encode};

/// Production `BackupStore` writing into the local destination directory.
pub struct LocalBackupStore;

impl BackupStore for LocalBackupStore {
    fn prepare_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create directory {}", dir.display()))?;
        // writability probe
        tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("directory {} is not writable", dir.display()))?;
        Ok(())
    }

    fn finalize(&self, staged: &Path, target: &Path) -> Result<ArchiveInfo> {
        // Describe the staged copy first; `target` is only touched by the rename.
        let size = std::fs::metadata(staged)
            .with_context(|| format!("cannot stat {}", staged.display()))?
            .len();
        let sha256 = sha256_file(staged)?;
        std::fs::rename(staged, target).with_context(|| {
            format!("cannot move {} to {}", staged.display(), target.display())
        })?;
        Ok(ArchiveInfo {
            path: target.to_path_buf(),
            size,
            sha256,
        })
    }

    fn discard(&self, staged: &Path) {
        let _ = std::fs::remove_file(staged);
    }

    fn update_latest_link(&self, destination: &Path, dir_name: &str) -> Result<()> {
        let link = destination.join(LATEST_LINK);
        match std::fs::symlink_metadata(&link) {
            Ok(meta) if meta.file_type().is_symlink() => {
                std::fs::remove_file(&link)
                    .with_context(|| format!("cannot remove {}", link.display()))?;
            }
            Ok(_) => anyhow::bail!("{} exists and is not a symlink", link.display()),
            Err(_) => {}
        }
        symlink(dir_name, &link)
    }
}

#[cfg(unix)]
fn symlink(target: &str, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("cannot create symlink {}", link.display()))
}

#[cfg(not(unix))]
fn symlink(_target: &str, link: &Path) -> Result<()> {
    anyhow::bail!("symlinks are not supported here: {}", link.display())
}

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large files into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}
