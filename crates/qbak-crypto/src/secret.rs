//! Deterministic zeroing of in-memory key material

use zeroize::Zeroize;

/// Overwrite a key buffer with zeros.
pub fn destroy_key(key: &mut [u8]) {
    key.zeroize();
}

/// A fixed-size secret. Zeroized on drop, or earlier through [`SecretBytes::destroy`].
#[derive(Clone)]
pub struct SecretBytes<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> SecretBytes<N> {
    pub fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// Copy the first `N` bytes of a longer secret.
    ///
    /// Panics if `secret` is shorter than `N`; callers pass fixed-size KEM
    /// secrets, so this is a programming error rather than an input error.
    pub fn from_prefix(secret: &[u8]) -> Self {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&secret[..N]);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    pub fn destroy(&mut self) {
        destroy_key(&mut self.bytes);
    }

    /// True once every byte reads as zero
    pub fn is_destroyed(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }
}

impl<const N: usize> Drop for SecretBytes<N> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<const N: usize> std::fmt::Debug for SecretBytes<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBytes")
            .field("len", &N)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
