//! Static obscuring of the on-disk configuration file
//!
//! WARNING: the key and IV below are compiled into every qbak binary. Anyone
//! holding the binary can read the configuration. This keeps the file from
//! being casually readable and nothing more: it is not a security boundary
//! and never protects backup content. The configuration only holds a public
//! key and path names.

use std::io::Write;

use qbak_core::QbakResult;

use crate::cipher::CipherWriter;
use crate::secret::destroy_key;
use crate::{IV_SIZE, KEY_SIZE};

const CONFIG_KEY: [u8; KEY_SIZE] = [
    0x68, 0x53, 0x3b, 0x0b, 0x46, 0x7f, 0x36, 0x29, 0xf3, 0x7b, 0x9a, 0x08, 0xe3, 0xaf, 0x9b, 0x3c,
    0xc5, 0x4d, 0x41, 0xfa, 0xd6, 0xb9, 0x9d, 0x2d, 0x40, 0x55, 0xab, 0xb3, 0xc2, 0xff, 0x07, 0x46,
];

const CONFIG_IV: [u8; IV_SIZE] = [
    0x81, 0x59, 0xc9, 0x8b, 0x35, 0xf8, 0xe7, 0x17, 0x88, 0x4a, 0x02, 0x01, 0x5e, 0x5b, 0x0a, 0xc4,
];

/// XOR `data` with the static keystream. Applying it twice restores the input.
pub fn obscure(data: &[u8]) -> QbakResult<Vec<u8>> {
    let mut key = CONFIG_KEY;
    let mut iv = CONFIG_IV;
    let result = apply(&key, &iv, data);
    destroy_key(&mut key);
    destroy_key(&mut iv);
    result
}

/// Inverse of [`obscure`].
pub fn reveal(data: &[u8]) -> QbakResult<Vec<u8>> {
    obscure(data)
}

fn apply(key: &[u8], iv: &[u8], data: &[u8]) -> QbakResult<Vec<u8>> {
    let mut writer = CipherWriter::new(key, iv, Vec::with_capacity(data.len()))?;
    writer.write_all(data)?;
    Ok(writer.into_inner())
}
