//! qbak-archive: the collaborators on either side of the cipher
//!
//! # Overview
//! - `tarball`: directory tree to byte stream and back, with file/folder counts
//! - `compress`: zstd streaming encoder (multithreaded) and decoder (single-threaded)
//! - `fmt`: human-readable byte counts for progress output

pub mod compress;
pub mod fmt;
pub mod tarball;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use qbak_core::{ArchiveCounts, QbakResult};

pub use compress::{compressor, decompressor, Compressor, Decompressor};
pub use fmt::fmt_bytes;
pub use tarball::TarArchiver;

/// Serializes a set of filesystem paths into a stream and restores it.
///
/// Implementations must write a self-terminating stream: `extract` stops at
/// the archive's own end marker and never relies on the source hitting EOF.
pub trait Archiver {
    /// Write every path in `paths` into `out`. Returns what was written.
    fn archive(&self, paths: &[PathBuf], out: &mut dyn Write) -> QbakResult<ArchiveCounts>;

    /// Read entries from `input` and materialize them under `dest`.
    fn extract(&self, input: &mut dyn Read, dest: &Path) -> QbakResult<ArchiveCounts>;
}
