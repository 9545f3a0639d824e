//! Persisted configuration: TOML, obscured with a static key, in `config.bc`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use qbak_core::{BackupConfig, QbakError, QbakResult};
use qbak_crypto::obscure::{obscure, reveal};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "config.bc";

/// `config.bc` next to the running executable.
pub fn default_config_path() -> QbakResult<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| QbakError::InvalidConfig(format!("{} has no parent", exe.display())))?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load the configuration, or `None` on first run when the file is absent.
pub fn load_config(path: &Path) -> QbakResult<Option<BackupConfig>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let plain = reveal(&raw)?;
    let text = String::from_utf8(plain)
        .map_err(|_| QbakError::InvalidConfig(format!("{} is not a qbak config", path.display())))?;
    let config = BackupConfig::from_toml(&text)?;
    debug!(path = %path.display(), paths = config.paths.len(), "loaded config");
    Ok(Some(config))
}

pub fn save_config(path: &Path, config: &BackupConfig) -> QbakResult<()> {
    let text = config.to_toml()?;
    fs::write(path, obscure(text.as_bytes())?)?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}
