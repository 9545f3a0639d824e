//! BLAKE3 keyed MAC with a 64-byte extended output

use std::io::{self, Write};

use qbak_core::{KeyKind, QbakError, QbakResult};
use subtle::ConstantTimeEq;

use crate::{KEY_SIZE, MAC_SIZE};

/// Running tag computation over everything written into it.
///
/// Used as the second sink of the create-side tee and as the only sink of
/// the restore-side verification pass.
#[derive(Clone)]
pub struct IntegrityMac {
    hasher: blake3::Hasher,
}

impl IntegrityMac {
    /// BLAKE3 keyed mode takes exactly a 32-byte key.
    pub fn new(key: &[u8]) -> QbakResult<Self> {
        let key: &[u8; KEY_SIZE] = key.try_into().map_err(|_| QbakError::InvalidKeyLength {
            kind: KeyKind::Symmetric,
            expected: KEY_SIZE,
            actual: key.len(),
        })?;
        Ok(Self {
            hasher: blake3::Hasher::new_keyed(key),
        })
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finalize into a 64-byte tag. Does not consume or reset the accumulator.
    pub fn sum(&self) -> [u8; MAC_SIZE] {
        let mut tag = [0u8; MAC_SIZE];
        self.hasher.finalize_xof().fill(&mut tag);
        tag
    }

    /// Constant-time tag comparison. Tags of different length never match.
    pub fn compare(a: &[u8], b: &[u8]) -> bool {
        a.ct_eq(b).into()
    }
}

impl Write for IntegrityMac {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for IntegrityMac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IntegrityMac(..)")
    }
}
