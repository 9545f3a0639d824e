pub mod config;
pub mod error;
pub mod types;

pub use config::{BackupConfig, CompressionConfig};
pub use error::{KeyKind, QbakError, QbakResult};
pub use types::{ArchiveCounts, Stage};

/// Extension appended to every backup file name
pub const BACKUP_EXTENSION: &str = "bk";
