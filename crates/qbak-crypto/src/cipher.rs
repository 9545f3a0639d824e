//! AES-256-CTR stream filters
//!
//! `CipherWriter` encrypts on the way into a sink, `CipherReader` decrypts on
//! the way out of a source. Both are pure pass-through: every byte is XORed
//! with the keystream and forwarded immediately, so there is never pending
//! state to drain. A filter carries one running keystream and must not be
//! reused for a second archive.

use std::io::{self, Read, Write};

use ctr::cipher::{KeyIvInit, StreamCipher};
use qbak_core::{KeyKind, QbakError, QbakResult};

use crate::{IV_SIZE, KEY_SIZE};

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// Upper bound on the scratch buffer used to encrypt one write call
const SCRATCH_SIZE: usize = 64 * 1024;

fn keystream(key: &[u8], iv: &[u8]) -> QbakResult<Aes256Ctr> {
    if key.len() != KEY_SIZE {
        return Err(QbakError::InvalidKeyLength {
            kind: KeyKind::Symmetric,
            expected: KEY_SIZE,
            actual: key.len(),
        });
    }
    if iv.len() != IV_SIZE {
        return Err(QbakError::InvalidKeyLength {
            kind: KeyKind::Nonce,
            expected: IV_SIZE,
            actual: iv.len(),
        });
    }
    Aes256Ctr::new_from_slices(key, iv)
        .map_err(|e| QbakError::Other(anyhow::anyhow!("AES-CTR init failed: {e}")))
}

/// Encrypting sink: plaintext in, ciphertext out to `inner`.
pub struct CipherWriter<W> {
    inner: W,
    stream: Aes256Ctr,
    scratch: Vec<u8>,
}

impl<W: Write> CipherWriter<W> {
    pub fn new(key: &[u8], iv: &[u8], inner: W) -> QbakResult<Self> {
        Ok(Self {
            inner,
            stream: keystream(key, iv)?,
            scratch: Vec::new(),
        })
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Give back the downstream sink. Nothing is buffered, so nothing is lost.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CipherWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The keystream advances as soon as it is applied, so the whole
        // ciphertext must reach `inner` for the stream to stay in sync.
        for piece in buf.chunks(SCRATCH_SIZE) {
            self.scratch.clear();
            self.scratch.extend_from_slice(piece);
            self.stream.apply_keystream(&mut self.scratch);
            self.inner.write_all(&self.scratch)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Decrypting source: ciphertext from `inner`, plaintext out.
pub struct CipherReader<R> {
    inner: R,
    stream: Aes256Ctr,
}

impl<R: Read> CipherReader<R> {
    pub fn new(key: &[u8], iv: &[u8], inner: R) -> QbakResult<Self> {
        Ok(Self {
            inner,
            stream: keystream(key, iv)?,
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CipherReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.stream.apply_keystream(&mut buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KEY: [u8; KEY_SIZE] = [0x11; KEY_SIZE];
    const IV: [u8; IV_SIZE] = [0x22; IV_SIZE];

    fn encrypt(data: &[u8]) -> Vec<u8> {
        let mut w = CipherWriter::new(&KEY, &IV, Vec::new()).unwrap();
        w.write_all(data).unwrap();
        w.into_inner()
    }

    fn decrypt(data: &[u8]) -> Vec<u8> {
        let mut r = CipherReader::new(&KEY, &IV, data).unwrap();
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn ciphertext_differs_and_length_is_preserved() {
        let plain = b"counter mode keeps the length";
        let ct = encrypt(plain);
        assert_eq!(ct.len(), plain.len());
        assert_ne!(ct.as_slice(), plain.as_slice());
        assert_eq!(decrypt(&ct), plain);
    }

    #[test]
    fn write_is_forwarded_immediately() {
        let mut w = CipherWriter::new(&KEY, &IV, Vec::new()).unwrap();
        w.write_all(b"abc").unwrap();
        assert_eq!(w.get_ref().len(), 3);
    }

    #[test]
    fn matches_aes_ctr_test_vector() {
        // NIST SP 800-38A F.5.5 CTR-AES256.Encrypt, first block
        let key = [
            0x60, 0x3d, 0xeb, 0x10, 0x15, 0xca, 0x71, 0xbe, 0x2b, 0x73, 0xae, 0xf0, 0x85, 0x7d,
            0x77, 0x81, 0x1f, 0x35, 0x2c, 0x07, 0x3b, 0x61, 0x08, 0xd7, 0x2d, 0x98, 0x10, 0xa3,
            0x09, 0x14, 0xdf, 0xf4,
        ];
        let iv = [
            0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa, 0xfb, 0xfc, 0xfd,
            0xfe, 0xff,
        ];
        let plain = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a,
        ];
        let expected = [
            0x60, 0x1e, 0xc3, 0x13, 0x77, 0x57, 0x89, 0xa5, 0xb7, 0xa7, 0xf5, 0x04, 0xbb, 0xf3,
            0xd2, 0x28,
        ];

        let mut w = CipherWriter::new(&key, &iv, Vec::new()).unwrap();
        w.write_all(&plain).unwrap();
        assert_eq!(w.into_inner(), expected);
    }

    #[test]
    fn bad_key_length_is_rejected_at_construction() {
        let err = CipherWriter::new(&[0u8; 16], &IV, Vec::new()).err().unwrap();
        assert!(matches!(
            err,
            QbakError::InvalidKeyLength {
                kind: KeyKind::Symmetric,
                ..
            }
        ));
    }

    #[test]
    fn bad_iv_length_is_rejected_at_construction() {
        let err = CipherReader::new(&KEY, &[0u8; 32], &b""[..]).err().unwrap();
        assert!(matches!(
            err,
            QbakError::InvalidKeyLength {
                kind: KeyKind::Nonce,
                ..
            }
        ));
    }

    proptest! {
        #[test]
        fn split_writes_equal_single_write(
            data in proptest::collection::vec(any::<u8>(), 0..=8192),
            split in 0usize..=8192,
        ) {
            let split = split.min(data.len());
            let mut w = CipherWriter::new(&KEY, &IV, Vec::new()).unwrap();
            w.write_all(&data[..split]).unwrap();
            w.write_all(&data[split..]).unwrap();
            prop_assert_eq!(w.into_inner(), encrypt(&data));
        }

        #[test]
        fn reader_inverts_writer(data in proptest::collection::vec(any::<u8>(), 0..=70000)) {
            prop_assert_eq!(decrypt(&encrypt(&data)), data);
        }
    }
}
