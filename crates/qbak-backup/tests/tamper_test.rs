//! Integrity failures: tampering and wrong keys must never produce output.

use std::fs;
use std::path::Path;

use qbak_archive::TarArchiver;
use qbak_backup::{create_backup, restore_backup, RestoreMode};
use qbak_core::{CompressionConfig, QbakError};
use qbak_crypto::{generate_keypair, KeyPair, DATA_OFFSET, ENCRYPTED_HEADER_SIZE, MAC_SIZE};
use tempfile::TempDir;

fn make_backup(dir: &Path, kp: &KeyPair) -> Vec<u8> {
    let src = dir.join("src");
    fs::create_dir_all(src.join("nested")).unwrap();
    fs::write(src.join("a.txt"), b"alpha").unwrap();
    fs::write(src.join("nested/b.txt"), vec![b'b'; 20_000]).unwrap();

    let backup = dir.join("orig.bk");
    create_backup(&backup, &kp.public, &[src], &TarArchiver, &CompressionConfig::default()).unwrap();
    fs::read(backup).unwrap()
}

fn assert_rejected(bytes: &[u8], kp: &KeyPair, mode: RestoreMode) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("t.bk");
    fs::write(&path, bytes).unwrap();
    let dest = tmp.path().join("out");

    let err = restore_backup(&path, &dest, &kp.private, &TarArchiver, mode).unwrap_err();
    assert!(err.is_integrity_failure(), "expected IntegrityFailure, got {err}");
    assert!(!dest.exists(), "output written despite failed verification");
}

#[test]
fn single_bit_flips_are_detected_everywhere() {
    let work = TempDir::new().unwrap();
    let kp = generate_keypair().unwrap();
    let original = make_backup(work.path(), &kp);
    let len = original.len();
    let data = DATA_OFFSET as usize;

    let offsets = [
        0,
        MAC_SIZE - 1,
        // one hit in each of the three KEM ciphertexts
        MAC_SIZE,
        MAC_SIZE + ENCRYPTED_HEADER_SIZE / 3 + 7,
        data - 1,
        // payload
        data,
        data + (len - data) / 2,
        len - 1,
    ];

    for (i, offset) in offsets.into_iter().enumerate() {
        let mut tampered = original.clone();
        tampered[offset] ^= 1 << (i % 8);
        assert_rejected(&tampered, &kp, RestoreMode::Extract);
    }
}

#[test]
fn truncated_and_extended_payloads_are_detected() {
    let work = TempDir::new().unwrap();
    let kp = generate_keypair().unwrap();
    let original = make_backup(work.path(), &kp);

    assert_rejected(&original[..original.len() - 1], &kp, RestoreMode::Extract);

    let mut extended = original.clone();
    extended.push(0);
    assert_rejected(&extended, &kp, RestoreMode::RawStream);
}

#[test]
fn wrong_private_key_is_integrity_failure() {
    let work = TempDir::new().unwrap();
    let owner = generate_keypair().unwrap();
    let stranger = generate_keypair().unwrap();
    let original = make_backup(work.path(), &owner);

    assert_rejected(&original, &stranger, RestoreMode::Extract);
    assert_rejected(&original, &stranger, RestoreMode::RawStream);
}

#[test]
fn header_only_file_fails_integrity_not_parse() {
    let work = TempDir::new().unwrap();
    let kp = generate_keypair().unwrap();
    let original = make_backup(work.path(), &kp);

    // a well-formed prefix with the payload cut off entirely
    assert_rejected(&original[..DATA_OFFSET as usize], &kp, RestoreMode::Extract);

    let short = &original[..DATA_OFFSET as usize - 1];
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("s.bk");
    fs::write(&path, short).unwrap();
    let err = restore_backup(&path, tmp.path(), &kp.private, &TarArchiver, RestoreMode::Extract)
        .unwrap_err();
    assert!(matches!(err, QbakError::InvalidHeader(_)));
}
