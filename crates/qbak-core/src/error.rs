use std::fmt;

use thiserror::Error;

pub type QbakResult<T> = Result<T, QbakError>;

/// Which half of a keypair a length check was performed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Public,
    Private,
    Symmetric,
    Nonce,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Public => f.write_str("public"),
            KeyKind::Private => f.write_str("private"),
            KeyKind::Symmetric => f.write_str("symmetric"),
            KeyKind::Nonce => f.write_str("nonce"),
        }
    }
}

#[derive(Debug, Error)]
pub enum QbakError {
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid {kind} key length: {actual} bytes (expected {expected}). Is it the right key?")]
    InvalidKeyLength {
        kind: KeyKind,
        expected: usize,
        actual: usize,
    },

    #[error("integrity check failed: the file has been tampered with or the key is wrong")]
    IntegrityFailure,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(
        "invalid retention value {0}: use a positive integer to limit stored backups, or -1 to disable rotation"
    )]
    InvalidRetentionValue(i64),

    #[error("key encapsulation error: {0}")]
    Kem(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QbakError {
    /// True when the error means the backup must not be trusted
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, QbakError::IntegrityFailure)
    }
}
