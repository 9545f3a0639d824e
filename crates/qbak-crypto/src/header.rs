//! Encrypted header: three independent ML-KEM encapsulations
//!
//! On-disk layout (immediately after the 64-byte tag):
//! ```text
//! [1568 bytes: ciphertext → AES key][1568 bytes: ciphertext → IV secret][1568 bytes: ciphertext → MAC key]
//! ```
//!
//! Each secret comes from its own encapsulation, so learning one tells
//! nothing about the others. The IV is the first 16 bytes of its 32-byte
//! secret.

use std::io::{self, Read};

use qbak_core::{QbakError, QbakResult};
use tracing::debug;

use crate::kem::{decapsulate, encapsulate, PrivateKey, PublicKey, CIPHERTEXT_SIZE};
use crate::mac::IntegrityMac;
use crate::secret::SecretBytes;
use crate::{CIPHER_SIZE, ENCRYPTED_HEADER_SIZE, IV_SIZE, KEY_SIZE};

/// Plaintext symmetric secrets for one archive. In memory only.
///
/// Dropping a `Header` zeroes every key buffer; [`Header::destroy`] does the
/// same earlier, as soon as the secrets are no longer needed.
#[derive(Debug)]
pub struct Header {
    aes_key: SecretBytes<KEY_SIZE>,
    iv: SecretBytes<IV_SIZE>,
    mac_key: SecretBytes<KEY_SIZE>,
}

impl Header {
    pub fn aes_key(&self) -> &[u8; KEY_SIZE] {
        self.aes_key.as_bytes()
    }

    pub fn iv(&self) -> &[u8; IV_SIZE] {
        self.iv.as_bytes()
    }

    pub fn mac_key(&self) -> &[u8; KEY_SIZE] {
        self.mac_key.as_bytes()
    }

    pub fn destroy(&mut self) {
        self.aes_key.destroy();
        self.iv.destroy();
        self.mac_key.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.aes_key.is_destroyed() && self.iv.is_destroyed() && self.mac_key.is_destroyed()
    }
}

/// The three KEM ciphertexts, in file order.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedHeader {
    aes_key: Box<[u8; CIPHER_SIZE]>,
    iv: Box<[u8; CIPHER_SIZE]>,
    mac_key: Box<[u8; CIPHER_SIZE]>,
}

impl EncryptedHeader {
    /// Concatenate AES-key, IV and MAC-key ciphertexts (`3 × CIPHER_SIZE` bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCRYPTED_HEADER_SIZE);
        out.extend_from_slice(self.aes_key.as_slice());
        out.extend_from_slice(self.iv.as_slice());
        out.extend_from_slice(self.mac_key.as_slice());
        out
    }

    /// Decapsulate all three secrets.
    ///
    /// There is no failure path: a structurally valid but wrong private key
    /// silently produces wrong keys, which the integrity check rejects.
    pub fn decrypt_keys(&self, private_key: &PrivateKey) -> Header {
        let aes_key = decapsulate(&self.aes_key, private_key);
        let iv_secret = decapsulate(&self.iv, private_key);
        let mac_key = decapsulate(&self.mac_key, private_key);

        Header {
            aes_key,
            iv: SecretBytes::from_prefix(iv_secret.as_bytes()),
            mac_key,
        }
    }
}

impl std::fmt::Debug for EncryptedHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedHeader")
            .field("len", &ENCRYPTED_HEADER_SIZE)
            .finish()
    }
}

/// Create fresh per-archive secrets for `public_key`.
pub fn gen_header(public_key: &PublicKey) -> QbakResult<(Header, EncryptedHeader)> {
    let aes = encapsulate(public_key)?;
    let iv = encapsulate(public_key)?;
    let mac = encapsulate(public_key)?;

    let header = Header {
        aes_key: aes.secret,
        iv: SecretBytes::from_prefix(iv.secret.as_bytes()),
        mac_key: mac.secret,
    };
    let encrypted = EncryptedHeader {
        aes_key: aes.ciphertext,
        iv: iv.ciphertext,
        mac_key: mac.ciphertext,
    };

    debug!(bytes = ENCRYPTED_HEADER_SIZE, "generated archive header");
    Ok((header, encrypted))
}

/// Split raw header bytes into the three ciphertexts.
pub fn parse_header(bytes: &[u8]) -> QbakResult<EncryptedHeader> {
    if bytes.len() != ENCRYPTED_HEADER_SIZE {
        return Err(QbakError::InvalidHeader(format!(
            "expected {ENCRYPTED_HEADER_SIZE} bytes, got {}",
            bytes.len()
        )));
    }

    let slot = |i: usize| -> Box<[u8; CIPHERTEXT_SIZE]> {
        let mut ct = Box::new([0u8; CIPHERTEXT_SIZE]);
        ct.copy_from_slice(&bytes[i * CIPHER_SIZE..(i + 1) * CIPHER_SIZE]);
        ct
    };

    Ok(EncryptedHeader {
        aes_key: slot(0),
        iv: slot(1),
        mac_key: slot(2),
    })
}

/// Read the encrypted header from `reader` and recover the archive secrets.
///
/// Returns the keys and a MAC already fed with the raw header bytes, so the
/// caller only has to stream the remaining ciphertext into it.
pub fn read_header<R: Read>(
    reader: &mut R,
    private_key: &PrivateKey,
) -> QbakResult<(Header, IntegrityMac)> {
    let mut raw = vec![0u8; ENCRYPTED_HEADER_SIZE];
    reader.read_exact(&mut raw).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            QbakError::InvalidHeader("file too short to contain a header".into())
        }
        _ => QbakError::Io(e),
    })?;

    let encrypted = parse_header(&raw)?;
    let header = encrypted.decrypt_keys(private_key);

    let mut mac = IntegrityMac::new(header.mac_key())?;
    mac.update(&raw);

    Ok((header, mac))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kem::generate_keypair;

    #[test]
    fn test_header_roundtrip() {
        let kp = generate_keypair().unwrap();
        let (header, encrypted) = gen_header(&kp.public).unwrap();

        let bytes = encrypted.to_bytes();
        assert_eq!(bytes.len(), 3 * CIPHER_SIZE);

        let parsed = parse_header(&bytes).unwrap();
        assert_eq!(parsed, encrypted);

        let recovered = parsed.decrypt_keys(&kp.private);
        assert_eq!(recovered.aes_key(), header.aes_key());
        assert_eq!(recovered.iv(), header.iv());
        assert_eq!(recovered.mac_key(), header.mac_key());
    }

    #[test]
    fn test_secrets_are_independent() {
        let kp = generate_keypair().unwrap();
        let (header, _) = gen_header(&kp.public).unwrap();
        assert_ne!(header.aes_key(), header.mac_key());
        assert_ne!(&header.aes_key()[..IV_SIZE], header.iv().as_slice());
    }

    #[test]
    fn test_ciphertext_order_is_fixed() {
        let kp = generate_keypair().unwrap();
        let (_, encrypted) = gen_header(&kp.public).unwrap();
        let bytes = encrypted.to_bytes();

        assert_eq!(&bytes[..CIPHER_SIZE], encrypted.aes_key.as_slice());
        assert_eq!(&bytes[CIPHER_SIZE..2 * CIPHER_SIZE], encrypted.iv.as_slice());
        assert_eq!(&bytes[2 * CIPHER_SIZE..], encrypted.mac_key.as_slice());
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        for len in [0, ENCRYPTED_HEADER_SIZE - 1, ENCRYPTED_HEADER_SIZE + 1] {
            let err = parse_header(&vec![0u8; len]).unwrap_err();
            assert!(matches!(err, QbakError::InvalidHeader(_)));
        }
    }

    #[test]
    fn test_read_header_short_read() {
        let kp = generate_keypair().unwrap();
        let short = vec![0u8; ENCRYPTED_HEADER_SIZE - 10];
        let err = read_header(&mut short.as_slice(), &kp.private).unwrap_err();
        assert!(matches!(err, QbakError::InvalidHeader(_)));
    }

    #[test]
    fn test_read_header_primes_mac_with_header_bytes() {
        let kp = generate_keypair().unwrap();
        let (header, encrypted) = gen_header(&kp.public).unwrap();
        let bytes = encrypted.to_bytes();

        let mut expected = IntegrityMac::new(header.mac_key()).unwrap();
        expected.update(&bytes);

        let (_, mac) = read_header(&mut bytes.as_slice(), &kp.private).unwrap();
        assert_eq!(mac.sum(), expected.sum());
    }

    #[test]
    fn test_destroy_zeroes_all_keys() {
        let kp = generate_keypair().unwrap();
        let (mut header, _) = gen_header(&kp.public).unwrap();
        assert!(!header.is_destroyed());

        header.destroy();

        assert!(header.aes_key().iter().all(|b| *b == 0));
        assert!(header.iv().iter().all(|b| *b == 0));
        assert!(header.mac_key().iter().all(|b| *b == 0));
        assert!(header.is_destroyed());
    }
}
