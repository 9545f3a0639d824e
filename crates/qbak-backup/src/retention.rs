//! Rotation of old backups in the destination directory
//!
//! Backup names are millisecond timestamps, so reverse lexicographic order
//! is newest first. Only regular `.bk` files take part.

use std::fs;
use std::path::{Path, PathBuf};

use qbak_core::config::{validate_retention, RETENTION_DISABLED};
use qbak_core::{QbakResult, BACKUP_EXTENSION};
use tracing::info;

/// Make room for one more backup in `dir`.
///
/// When the directory already holds `retention` backups or more, everything
/// except the newest `retention - 1` is deleted. Returns the removed paths.
pub fn rotate(dir: &Path, retention: i64) -> QbakResult<Vec<PathBuf>> {
    validate_retention(retention)?;
    if retention == RETENTION_DISABLED {
        return Ok(Vec::new());
    }

    let mut backups = list_backups(dir)?;
    if (backups.len() as i64) < retention {
        return Ok(Vec::new());
    }

    backups.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    let removed = backups.split_off((retention - 1) as usize);
    for path in &removed {
        fs::remove_file(path)?;
        info!(path = %path.display(), "removed old backup");
    }
    Ok(removed)
}

fn list_backups(dir: &Path) -> QbakResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == BACKUP_EXTENSION) {
            out.push(path);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbak_core::QbakError;
    use tempfile::TempDir;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"x").unwrap();
        }
    }

    fn remaining(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_keeps_newest_minus_one() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["1000.bk", "3000.bk", "2000.bk"]);

        let removed = rotate(tmp.path(), 2).unwrap();

        assert_eq!(removed.len(), 2);
        assert_eq!(remaining(tmp.path()), vec!["3000.bk"]);
    }

    #[test]
    fn test_below_limit_is_untouched() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["1000.bk", "2000.bk"]);
        assert!(rotate(tmp.path(), 3).unwrap().is_empty());
        assert_eq!(remaining(tmp.path()).len(), 2);
    }

    #[test]
    fn test_disabled_keeps_everything() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["1.bk", "2.bk", "3.bk", "4.bk"]);
        assert!(rotate(tmp.path(), -1).unwrap().is_empty());
        assert_eq!(remaining(tmp.path()).len(), 4);
    }

    #[test]
    fn test_other_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["1000.bk", "2000.bk", "notes.txt", "9999.tar.zst"]);
        fs::create_dir(tmp.path().join("9999.bk")).unwrap();

        rotate(tmp.path(), 1).unwrap();

        assert_eq!(remaining(tmp.path()), vec!["9999.bk", "9999.tar.zst", "notes.txt"]);
    }

    #[test]
    fn test_invalid_retention_is_rejected() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["1.bk"]);
        for bad in [0, -2, -100] {
            let err = rotate(tmp.path(), bad).unwrap_err();
            assert!(matches!(err, QbakError::InvalidRetentionValue(v) if v == bad));
        }
        assert_eq!(remaining(tmp.path()).len(), 1);
    }
}
