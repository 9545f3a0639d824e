//! qbak-backup: sequencing of the encrypted archive format
//!
//! File layout:
//! ```text
//! [64 bytes: BLAKE3 keyed tag][3 × 1568 bytes: ML-KEM ciphertexts][AES-CTR(zstd(tar))]
//! ```
//!
//! The tag covers every byte after it. Restore checks it over the whole file
//! before a single byte is decrypted.

pub mod create;
pub mod job;
pub mod multi_writer;
pub mod restore;
pub mod retention;
pub mod settings;

pub use create::create_backup;
pub use job::{run_backup, BackupReport};
pub use multi_writer::MultiWriter;
pub use restore::{restore_backup, RestoreMode, RestoreOutcome};
pub use retention::rotate;
pub use settings::{default_config_path, load_config, save_config, CONFIG_FILE_NAME};
