//! One unattended backup run driven by the persisted configuration

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::anyhow;
use qbak_archive::TarArchiver;
use qbak_core::{ArchiveCounts, BackupConfig, QbakError, QbakResult, BACKUP_EXTENSION};
use qbak_crypto::PublicKey;
use tracing::info;

use crate::create::create_backup;
use crate::retention::rotate;

/// Result of a successful [`run_backup`]
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub path: PathBuf,
    pub counts: ArchiveCounts,
    /// Size of the backup file on disk
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Rotate the destination, then write `<destination>/<unix-millis>.bk`.
///
/// Every configured path must exist before rotation removes anything.
pub fn run_backup(config: &BackupConfig) -> QbakResult<BackupReport> {
    config.validate()?;
    let public_key = PublicKey::from_base64(&config.key)?;
    let paths: Vec<PathBuf> = config.paths.iter().map(PathBuf::from).collect();
    check_paths(&paths)?;

    fs::create_dir_all(&config.destination)?;
    let removed = rotate(&config.destination, config.retention)?;
    if !removed.is_empty() {
        info!(count = removed.len(), "rotated old backups");
    }

    let path = config
        .destination
        .join(format!("{}.{}", unix_millis()?, BACKUP_EXTENSION));

    let started = Instant::now();
    let counts = create_backup(&path, &public_key, &paths, &TarArchiver, &config.compression)?;
    let bytes = fs::metadata(&path)?.len();

    info!(path = %path.display(), %counts, bytes, "backup complete");
    Ok(BackupReport {
        path,
        counts,
        bytes,
        elapsed: started.elapsed(),
    })
}

fn check_paths(paths: &[PathBuf]) -> QbakResult<()> {
    for path in paths {
        fs::metadata(path).map_err(|e| {
            QbakError::InvalidConfig(format!("backup path {}: {e}", path.display()))
        })?;
    }
    Ok(())
}

fn unix_millis() -> QbakResult<u128> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .map_err(|e| QbakError::Other(anyhow!("system clock before 1970: {e}")))
}
