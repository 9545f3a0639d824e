use std::io::Write;

use qbak_crypto::{CipherWriter, IntegrityMac};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_ctr_encrypt(bencher: divan::Bencher, size: usize) {
    let key = [0xABu8; 32];
    let iv = [0x01u8; 16];
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            let mut w = CipherWriter::new(&key, &iv, Vec::with_capacity(size)).unwrap();
            w.write_all(divan::black_box(&data)).unwrap();
            w.into_inner()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_mac(bencher: divan::Bencher, size: usize) {
    let key = [0xCDu8; 32];
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            let mut mac = IntegrityMac::new(&key).unwrap();
            mac.update(divan::black_box(&data));
            mac.sum()
        });
}

fn main() {
    divan::main();
}
