//! Restore side of the pipeline
//!
//! Two passes over the file. The first hashes everything after the tag and
//! touches nothing else. Only when the tag matches does the second pass
//! decrypt, decompress and extract.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use qbak_archive::{decompressor, Archiver};
use qbak_core::{ArchiveCounts, QbakError, QbakResult, Stage};
use qbak_crypto::{read_header, CipherReader, Header, IntegrityMac, PrivateKey, DATA_OFFSET, MAC_SIZE};
use tracing::{debug, info, warn};

/// What to do with the decrypted stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreMode {
    /// Decompress and unpack into `<dest>/<stem>/`.
    #[default]
    Extract,
    /// Write the decrypted, still compressed stream to `<dest>/<stem>.tar.zst`.
    RawStream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub counts: ArchiveCounts,
    /// Directory (extract) or file (raw stream) that was written
    pub output: PathBuf,
}

/// Verify `backup` with `private_key` and restore it under `dest`.
///
/// A wrong key and a tampered file are indistinguishable: both end in
/// [`QbakError::IntegrityFailure`] with nothing written to `dest`.
pub fn restore_backup<A: Archiver + ?Sized>(
    backup: &Path,
    dest: &Path,
    private_key: &PrivateKey,
    archiver: &A,
    mode: RestoreMode,
) -> QbakResult<RestoreOutcome> {
    debug!(stage = %Stage::Init, path = %backup.display(), "restoring backup");
    let stem = backup.file_stem().map(PathBuf::from).ok_or_else(|| {
        QbakError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no file name in {}", backup.display()),
        ))
    })?;
    let mut file = File::open(backup)?;

    let mut expected = [0u8; MAC_SIZE];
    file.read_exact(&mut expected).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            QbakError::InvalidHeader("file too short to contain a tag".into())
        }
        _ => QbakError::Io(e),
    })?;

    let (mut header, mac) = read_header(&mut file, private_key)?;
    debug!(stage = %Stage::HeaderRead, "header decapsulated");

    let opened = verify_and_open(file, &header, mac, &expected);
    // the keystream is already expanded inside the reader
    header.destroy();
    let reader = match opened {
        Ok(reader) => reader,
        Err(e) => {
            warn!(stage = %Stage::Aborted, error = %e, "restore aborted");
            return Err(e);
        }
    };

    debug!(stage = %Stage::Streaming, ?mode, "decrypting");

    let outcome = match mode {
        RestoreMode::Extract => extract(reader, dest.join(&stem), archiver),
        RestoreMode::RawStream => {
            let mut name = stem.into_os_string();
            name.push(".tar.zst");
            write_raw(reader, dest, dest.join(name))
        }
    };

    match &outcome {
        Ok(o) => debug!(stage = %Stage::Finalized, counts = %o.counts, "restore finished"),
        Err(e) => warn!(stage = %Stage::Aborted, error = %e, "restore aborted"),
    }
    outcome
}

fn verify_and_open(
    mut file: File,
    header: &Header,
    mut mac: IntegrityMac,
    expected: &[u8; MAC_SIZE],
) -> QbakResult<CipherReader<BufReader<File>>> {
    debug!(stage = %Stage::Verifying, "checking integrity");
    io::copy(&mut file, &mut mac)?;
    if !IntegrityMac::compare(expected, &mac.sum()) {
        return Err(QbakError::IntegrityFailure);
    }
    info!("integrity verified");

    file.seek(SeekFrom::Start(DATA_OFFSET))?;
    CipherReader::new(header.aes_key(), header.iv(), BufReader::new(file))
}

fn extract<R: Read, A: Archiver + ?Sized>(
    reader: R,
    target: PathBuf,
    archiver: &A,
) -> QbakResult<RestoreOutcome> {
    let mut decoder = decompressor(reader)?;
    let counts = archiver.extract(&mut decoder, &target)?;
    Ok(RestoreOutcome {
        counts,
        output: target,
    })
}

fn write_raw<R: Read>(mut reader: R, dest: &Path, target: PathBuf) -> QbakResult<RestoreOutcome> {
    fs::create_dir_all(dest)?;
    let mut out = File::create(&target)?;
    io::copy(&mut reader, &mut out)?;
    out.sync_all()?;
    Ok(RestoreOutcome {
        counts: ArchiveCounts::new(1, 0),
        output: target,
    })
}
