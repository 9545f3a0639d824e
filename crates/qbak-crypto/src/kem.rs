//! ML-KEM-1024 (FIPS 203) key encapsulation via libcrux
//!
//! Decapsulation never reports a wrong key: ML-KEM uses implicit rejection,
//! so a mismatched private key yields a different, random-looking secret.
//! The integrity tag is what catches that case.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use libcrux_ml_kem::mlkem1024::{self, MlKem1024Ciphertext, MlKem1024PrivateKey, MlKem1024PublicKey};
use qbak_core::{KeyKind, QbakError, QbakResult};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use zeroize::{Zeroize, Zeroizing};

use crate::secret::SecretBytes;

/// ML-KEM-1024 public key length in bytes
pub const PUBLIC_KEY_SIZE: usize = 1568;

/// ML-KEM-1024 private key length in bytes
pub const PRIVATE_KEY_SIZE: usize = 3168;

/// ML-KEM-1024 ciphertext length in bytes
pub const CIPHERTEXT_SIZE: usize = 1568;

/// Shared secret length in bytes
pub const SECRET_SIZE: usize = 32;

const KEYGEN_SEED_SIZE: usize = 64;
const ENCAPS_RAND_SIZE: usize = 32;

/// Distributable half of a keypair.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: Box<[u8; PUBLIC_KEY_SIZE]>,
}

/// Secret half of a keypair. Never written to disk by qbak; zeroized on drop.
pub struct PrivateKey {
    bytes: Box<[u8; PRIVATE_KEY_SIZE]>,
}

pub struct KeyPair {
    pub private: PrivateKey,
    pub public: PublicKey,
}

/// One encapsulation: the ciphertext goes into the header, the secret is single-use.
pub struct EncapsulatedSecret {
    pub ciphertext: Box<[u8; CIPHERTEXT_SIZE]>,
    pub secret: SecretBytes<SECRET_SIZE>,
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> QbakResult<Self> {
        let arr: [u8; PUBLIC_KEY_SIZE] =
            bytes.try_into().map_err(|_| QbakError::InvalidKeyLength {
                kind: KeyKind::Public,
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            })?;

        if !mlkem1024::validate_public_key(&MlKem1024PublicKey::from(arr)) {
            return Err(QbakError::Kem(
                "public key failed ML-KEM-1024 validation".into(),
            ));
        }

        Ok(Self {
            bytes: Box::new(arr),
        })
    }

    /// Decode the unpadded base64 form stored in the config file.
    pub fn from_base64(encoded: &str) -> QbakResult<Self> {
        let raw = decode_base64(encoded)?;
        Self::from_bytes(&raw)
    }

    pub fn to_base64(&self) -> String {
        STANDARD_NO_PAD.encode(self.bytes.as_slice())
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("len", &PUBLIC_KEY_SIZE)
            .finish()
    }
}

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> QbakResult<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(QbakError::InvalidKeyLength {
                kind: KeyKind::Private,
                expected: PRIVATE_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut boxed = Box::new([0u8; PRIVATE_KEY_SIZE]);
        boxed.copy_from_slice(bytes);
        Ok(Self { bytes: boxed })
    }

    /// Decode a base64 private key (from `PRIV_KEY` or the prompt).
    ///
    /// The decoded intermediate buffer is zeroized before returning.
    pub fn from_base64(encoded: &SecretString) -> QbakResult<Self> {
        let raw = Zeroizing::new(decode_base64(encoded.expose_secret())?);
        Self::from_bytes(&raw)
    }

    /// Base64 form, shown once to the user at key generation time.
    pub fn to_base64(&self) -> SecretString {
        SecretString::from(STANDARD_NO_PAD.encode(self.bytes.as_slice()))
    }

    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyPair(***)")
    }
}

/// Generate a fresh ML-KEM-1024 keypair from OS randomness.
pub fn generate_keypair() -> QbakResult<KeyPair> {
    let mut seed = [0u8; KEYGEN_SEED_SIZE];
    OsRng
        .try_fill_bytes(&mut seed)
        .map_err(|e| QbakError::Kem(format!("entropy source failed: {e}")))?;

    let kp = mlkem1024::generate_key_pair(seed);
    seed.zeroize();

    let private = PrivateKey::from_bytes(kp.sk())?;
    let public = PublicKey {
        bytes: Box::new(*kp.pk()),
    };

    Ok(KeyPair { private, public })
}

/// Derive a fresh shared secret and its ciphertext for `public_key`.
pub fn encapsulate(public_key: &PublicKey) -> QbakResult<EncapsulatedSecret> {
    let mut randomness = [0u8; ENCAPS_RAND_SIZE];
    OsRng
        .try_fill_bytes(&mut randomness)
        .map_err(|e| QbakError::Kem(format!("entropy source failed: {e}")))?;

    let pk = MlKem1024PublicKey::from(public_key.as_bytes());
    let (ct, mut ss) = mlkem1024::encapsulate(&pk, randomness);
    randomness.zeroize();

    let mut ciphertext = Box::new([0u8; CIPHERTEXT_SIZE]);
    ciphertext.copy_from_slice(ct.as_ref());
    let secret = SecretBytes::from_bytes(ss);
    ss.zeroize();

    Ok(EncapsulatedSecret { ciphertext, secret })
}

/// Recover the shared secret carried by `ciphertext`.
pub fn decapsulate(
    ciphertext: &[u8; CIPHERTEXT_SIZE],
    private_key: &PrivateKey,
) -> SecretBytes<SECRET_SIZE> {
    let sk = MlKem1024PrivateKey::from(private_key.as_bytes());
    let ct = MlKem1024Ciphertext::from(ciphertext);
    let mut ss = mlkem1024::decapsulate(&sk, &ct);
    let secret = SecretBytes::from_bytes(ss);
    ss.zeroize();
    secret
}

/// Decode unpadded standard base64, tolerating padding and surrounding quotes.
fn decode_base64(encoded: &str) -> QbakResult<Vec<u8>> {
    let cleaned = encoded
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim_end_matches('=');
    STANDARD_NO_PAD
        .decode(cleaned)
        .map_err(|e| QbakError::InvalidConfig(format!("key is not valid base64: {e}")))
}
