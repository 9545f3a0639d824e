//! zstd streaming compression
//!
//! The encoder may hand blocks to a worker pool; zstd still emits frames in
//! input order. The decoder always runs on the calling thread.

use std::io::{BufReader, Read, Write};

use qbak_core::{CompressionConfig, QbakResult};
use tracing::debug;

pub type Compressor<W> = zstd::stream::write::Encoder<'static, W>;
pub type Decompressor<R> = zstd::stream::read::Decoder<'static, BufReader<R>>;

/// Wrap `sink` in a zstd encoder. Call `finish()` to flush the last frame and
/// get the sink back.
pub fn compressor<W: Write>(sink: W, config: &CompressionConfig) -> QbakResult<Compressor<W>> {
    let mut encoder = zstd::stream::write::Encoder::new(sink, config.level)?;
    if config.workers > 1 {
        encoder.multithread(config.workers)?;
    }
    debug!(level = config.level, workers = config.workers, "zstd encoder ready");
    Ok(encoder)
}

/// Wrap `source` in a single-threaded zstd decoder.
pub fn decompressor<R: Read>(source: R) -> QbakResult<Decompressor<R>> {
    Ok(zstd::stream::read::Decoder::new(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn compress(data: &[u8], workers: u32) -> Vec<u8> {
        let config = CompressionConfig { level: 3, workers };
        let mut enc = compressor(Vec::new(), &config).unwrap();
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn decompress(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        decompressor(data).unwrap().read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_repetitive_data_shrinks() {
        let data = b"backup ".repeat(10_000);
        let packed = compress(&data, 1);
        assert!(packed.len() < data.len() / 10);
        assert_eq!(decompress(&packed), data);
    }

    #[test]
    fn test_multithreaded_output_decodes_in_order() {
        // large enough that the worker pool splits it into several jobs
        let data: Vec<u8> = (0..4 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
        let packed = compress(&data, 4);
        assert_eq!(decompress(&packed), data);
    }

    #[test]
    fn test_empty_input_is_valid_frame() {
        let packed = compress(b"", 4);
        assert!(!packed.is_empty());
        assert!(decompress(&packed).is_empty());
    }

    proptest! {
        #[test]
        fn prop_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..=32768)) {
            prop_assert_eq!(decompress(&compress(&data, 2)), data);
        }
    }
}
