//! Create side of the pipeline
//!
//! ```text
//! paths → archiver → zstd → AES-CTR ─┬→ file
//!                                    └→ MAC
//! ```
//! The encrypted header goes through the same tee ahead of the ciphertext,
//! so the tag covers it too.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use qbak_archive::{compressor, Archiver};
use qbak_core::{ArchiveCounts, CompressionConfig, QbakResult, Stage};
use qbak_crypto::{
    gen_header, CipherWriter, EncryptedHeader, Header, IntegrityMac, PublicKey, MAC_SIZE,
};
use tracing::{debug, warn};

use crate::multi_writer::MultiWriter;

/// Write a new backup of `paths` to `out_path`, sealed for `public_key`.
///
/// Refuses to overwrite an existing `out_path`. On any later failure the
/// partially written file is removed before the error is returned.
pub fn create_backup<A: Archiver + ?Sized>(
    out_path: &Path,
    public_key: &PublicKey,
    paths: &[PathBuf],
    archiver: &A,
    compression: &CompressionConfig,
) -> QbakResult<ArchiveCounts> {
    debug!(stage = %Stage::Init, path = %out_path.display(), "creating backup");
    let mut file = File::options()
        .write(true)
        .create_new(true)
        .open(out_path)?;

    match write_backup(&mut file, public_key, paths, archiver, compression) {
        Ok(counts) => {
            debug!(stage = %Stage::Finalized, %counts, "backup written");
            Ok(counts)
        }
        Err(e) => {
            warn!(stage = %Stage::Aborted, error = %e, "backup failed");
            drop(file);
            if let Err(rm) = fs::remove_file(out_path) {
                warn!(path = %out_path.display(), error = %rm, "could not remove partial backup");
            }
            Err(e)
        }
    }
}

fn write_backup<A: Archiver + ?Sized>(
    file: &mut File,
    public_key: &PublicKey,
    paths: &[PathBuf],
    archiver: &A,
    compression: &CompressionConfig,
) -> QbakResult<ArchiveCounts> {
    // placeholder for the tag
    file.write_all(&[0u8; MAC_SIZE])?;

    let (mut header, encrypted) = gen_header(public_key)?;
    let streamed = stream_payload(file, &header, &encrypted, paths, archiver, compression);
    header.destroy();
    let (counts, tag) = streamed?;

    file.seek(SeekFrom::Start(0))?;
    file.write_all(&tag)?;
    file.sync_all()?;
    Ok(counts)
}

fn stream_payload<A: Archiver + ?Sized>(
    file: &mut File,
    header: &Header,
    encrypted: &EncryptedHeader,
    paths: &[PathBuf],
    archiver: &A,
    compression: &CompressionConfig,
) -> QbakResult<(ArchiveCounts, [u8; MAC_SIZE])> {
    let mut mac = IntegrityMac::new(header.mac_key())?;

    let counts = {
        let mut tee = MultiWriter::new(vec![file as &mut dyn Write, &mut mac]);
        tee.write_all(&encrypted.to_bytes())?;
        debug!(stage = %Stage::HeaderWritten, "encrypted header written");

        let cipher = CipherWriter::new(header.aes_key(), header.iv(), &mut tee)?;
        let mut encoder = compressor(cipher, compression)?;
        debug!(stage = %Stage::Streaming, paths = paths.len(), "archiving");
        let counts = archiver.archive(paths, &mut encoder)?;
        encoder.finish()?.flush()?;
        counts
    };

    Ok((counts, mac.sum()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbak_archive::TarArchiver;
    use qbak_core::QbakError;
    use qbak_crypto::{generate_keypair, DATA_OFFSET};
    use tempfile::TempDir;

    #[test]
    fn test_tag_placeholder_is_overwritten() {
        let tmp = TempDir::new().unwrap();
        let kp = generate_keypair().unwrap();
        let out = tmp.path().join("1.bk");

        create_backup(&out, &kp.public, &[], &TarArchiver, &CompressionConfig::default())
            .unwrap();

        let bytes = fs::read(&out).unwrap();
        assert!(bytes.len() as u64 > DATA_OFFSET);
        assert_ne!(&bytes[..MAC_SIZE], &[0u8; MAC_SIZE][..]);
    }

    #[test]
    fn test_failed_create_leaves_no_file() {
        let tmp = TempDir::new().unwrap();
        let kp = generate_keypair().unwrap();
        let out = tmp.path().join("2.bk");
        let missing = vec![tmp.path().join("does-not-exist")];

        let err = create_backup(&out, &kp.public, &missing, &TarArchiver, &CompressionConfig::default())
            .unwrap_err();

        assert!(matches!(err, QbakError::Io(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_existing_file_is_left_alone() {
        let tmp = TempDir::new().unwrap();
        let kp = generate_keypair().unwrap();
        let out = tmp.path().join("3.bk");
        fs::write(&out, b"unrelated").unwrap();

        let err = create_backup(&out, &kp.public, &[], &TarArchiver, &CompressionConfig::default())
            .unwrap_err();

        match err {
            QbakError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists),
            other => panic!("expected already exists, got {other}"),
        }
        assert_eq!(fs::read(&out).unwrap(), b"unrelated");
    }
}
