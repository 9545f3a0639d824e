//! qbak-crypto: envelope encryption for qbak backup files
//!
//! Architecture: encrypt-then-MAC over a single counter-mode stream
//!
//! Create: tar → zstd → AES-256-CTR → file, every file byte also fed to BLAKE3 (keyed)
//!
//! Key material per backup:
//! ```text
//! ML-KEM-1024 public key
//!   ├── encapsulation #1 → AES-256 key   (32 bytes)
//!   ├── encapsulation #2 → CTR IV        (first 16 bytes of the shared secret)
//!   └── encapsulation #3 → BLAKE3 key    (32 bytes, tag covers header + ciphertext)
//! ```
//!
//! The three ciphertexts form the encrypted header. Only the private key
//! holder can recover the secrets, and the tag is checked before anything
//! is decrypted.

pub mod cipher;
pub mod header;
pub mod kem;
pub mod mac;
pub mod obscure;
pub mod secret;

pub use cipher::{CipherReader, CipherWriter};
pub use header::{gen_header, parse_header, read_header, EncryptedHeader, Header};
pub use kem::{decapsulate, encapsulate, generate_keypair, EncapsulatedSecret, KeyPair, PrivateKey, PublicKey};
pub use mac::IntegrityMac;
pub use secret::{destroy_key, SecretBytes};

/// Size of the AES-256 key and of the BLAKE3 MAC key
pub const KEY_SIZE: usize = 32;

/// Size of the AES-CTR initial counter block
pub const IV_SIZE: usize = 16;

/// Size of the integrity tag stored at the start of a backup file
pub const MAC_SIZE: usize = 64;

/// Size of one KEM ciphertext inside the encrypted header
pub const CIPHER_SIZE: usize = kem::CIPHERTEXT_SIZE;

/// Size of the encrypted header (three KEM ciphertexts)
pub const ENCRYPTED_HEADER_SIZE: usize = 3 * CIPHER_SIZE;

/// Offset of the ciphertext stream inside a backup file
pub const DATA_OFFSET: u64 = (MAC_SIZE + ENCRYPTED_HEADER_SIZE) as u64;
