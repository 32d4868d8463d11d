//! Compression throughput benchmarks.
//!
//! Run: cargo bench
//!
//! Covered:
//! - one-shot encode per container format (compressible and random payloads)
//! - one-shot decode per container format
//! - chunk-size sensitivity of the streaming reader
//! - encode followed by decode through a pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use streamflate::codec::{make_decoder, make_encoder, Format};
use streamflate::config::Config;
use streamflate::pipeline::Pipeline;
use streamflate::reader::{decode_all, encode_all, TransformReader};
use streamflate::source::SliceSource;

/// Repeating pattern, compresses well.
fn create_compressible_data(size: usize) -> Vec<u8> {
    let pattern =
        b"streamed payload with repeated structure and timestamps 2026-08-26T12:00:00Z ";
    pattern.iter().cycle().take(size).copied().collect()
}

/// Arithmetic noise, compresses poorly.
fn create_random_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| ((i * 17 + 31) % 256) as u8).collect()
}

fn config(format: Format) -> Config {
    Config { format, ..Config::default() }
}

const FORMATS: [(&str, Format); 3] =
    [("raw", Format::Raw), ("zlib", Format::Zlib), ("gzip", Format::Gzip)];

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let sizes = [1024, 10_240, 102_400]; // 1KB, 10KB, 100KB
    for size in sizes {
        let data = create_compressible_data(size);
        group.throughput(Throughput::Bytes(size as u64));

        for (name, format) in FORMATS {
            group.bench_with_input(
                BenchmarkId::new(name, format!("{}KB", size / 1024)),
                &data,
                |b, data| {
                    b.iter(|| black_box(encode_all(data, config(format)).unwrap()));
                },
            );
        }
    }

    let random = create_random_data(65_536);
    group.throughput(Throughput::Bytes(65_536));
    group.bench_function("zlib/random_64KB", |b| {
        b.iter(|| black_box(encode_all(&random, config(Format::Zlib)).unwrap()));
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let data = create_compressible_data(65_536);
    group.throughput(Throughput::Bytes(65_536));

    for (name, format) in FORMATS {
        let encoded = encode_all(&data, config(format)).unwrap();
        group.bench_with_input(
            BenchmarkId::new(name, "64KB"),
            &encoded,
            |b, encoded| {
                b.iter(|| black_box(decode_all(encoded, config(format)).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_size");

    let data = create_compressible_data(65_536);
    group.throughput(Throughput::Bytes(65_536));

    for chunk_size in [64usize, 1024, 8192] {
        let cfg = Config { chunk_size, ..Config::default() };
        group.bench_with_input(
            BenchmarkId::new("encode", format!("{}B", chunk_size)),
            &data,
            |b, data| {
                b.iter(|| {
                    let mut reader =
                        TransformReader::encoder(SliceSource::new(data), cfg).unwrap();
                    black_box(reader.read_to_vec().unwrap())
                });
            },
        );
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    let data = create_compressible_data(65_536);
    group.throughput(Throughput::Bytes(65_536));

    group.bench_function("encode_decode/64KB", |b| {
        b.iter(|| {
            let mut pipeline = Pipeline::new();
            pipeline.push(make_encoder(&config(Format::Gzip)));
            pipeline.push(make_decoder(&config(Format::Gzip)));
            let mut reader =
                TransformReader::new(SliceSource::new(&data), pipeline);
            black_box(reader.read_to_vec().unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_chunk_sizes, bench_pipeline);
criterion_main!(benches);
