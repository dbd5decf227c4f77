//! Writer and reader throughput benchmarks.

use blockwal_bench::sequential_payload;
use blockwal_core::{WalOptions, WalReader, WalWriter};
use blockwal_store::{LogStore, MemStore};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark record writes across payload sizes.
fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("wal_write");

    for size in [64, 256, 512, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut writer =
                WalWriter::new(Box::new(MemStore::new()), WalOptions::default()).unwrap();
            let payload = sequential_payload(size);

            b.iter(|| {
                writer.write(black_box(&payload)).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark a full read pass over a prebuilt stream.
fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("wal_read");

    for size in [64, 512, 4096].iter() {
        let mut writer = WalWriter::new(Box::new(MemStore::new()), WalOptions::default()).unwrap();
        let payload = sequential_payload(*size);
        for _ in 0..128 {
            writer.write(&payload).unwrap();
        }
        let store = writer.into_store();
        let total = store.size().unwrap();
        let data = store.read_at(0, total as usize).unwrap();

        group.throughput(Throughput::Bytes(total));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let reader = WalReader::new(
                    Box::new(MemStore::with_data(data.clone())),
                    WalOptions::default(),
                )
                .unwrap();
                let mut count = 0;
                for record in reader {
                    black_box(record.unwrap());
                    count += 1;
                }
                assert_eq!(count, 128);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write, bench_read);
criterion_main!(benches);
