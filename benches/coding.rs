//! Benchmarks for PPMH modelling and coding performance

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ppmh::{
    pack, parse_symbols, Codebook, ContextModel, Decoder, Encoder, EncoderConfig, PackedStream,
    Symbol,
};

fn generate_test_text(count: usize) -> Vec<Symbol> {
    let sentence = "a finite context model predicts the next symbol\nand a prefix code spends the bits ";
    let text: String = sentence.chars().cycle().take(count).collect();
    parse_symbols(&text).unwrap()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");

    let text = generate_test_text(10_000);
    group.throughput(Throughput::Elements(text.len() as u64));

    for order in [0, 2, 5] {
        group.bench_function(format!("train_order_{}", order), |b| {
            b.iter(|| {
                let mut model = ContextModel::with_order(order).unwrap();
                model.train(black_box(&text));
                black_box(model);
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    let text = generate_test_text(10_000);
    let mut model = ContextModel::with_order(4).unwrap();
    model.train(&text);

    group.throughput(Throughput::Elements(1000));

    group.bench_function("predict_1000", |b| {
        b.iter(|| {
            for index in 0..1000 {
                let prediction = model.predict_at(&text, index);
                black_box(prediction).ok();
            }
        })
    });

    group.finish();
}

fn bench_codebook(c: &mut Criterion) {
    let mut group = c.benchmark_group("codebook");

    let weights: Vec<(Symbol, f64)> = Symbol::all()
        .enumerate()
        .map(|(i, s)| (s, 1.0 + (i * 7 % 13) as f64))
        .collect();

    group.bench_function("build_28_symbols", |b| {
        b.iter(|| {
            let codebook = Codebook::build(black_box(weights.clone()));
            black_box(codebook).ok();
        })
    });

    group.finish();
}

fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");

    let text = generate_test_text(10_000);
    group.throughput(Throughput::Elements(text.len() as u64));

    group.bench_function("static_order_3", |b| {
        let encoder = Encoder::new(EncoderConfig::static_mode(3));
        b.iter(|| black_box(encoder.compress(&text)).ok())
    });

    group.bench_function("per_position_order_3", |b| {
        let encoder = Encoder::new(EncoderConfig::per_position(3));
        b.iter(|| black_box(encoder.compress(&text)).ok())
    });

    group.finish();
}

fn bench_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");

    let text = generate_test_text(10_000);
    group.throughput(Throughput::Elements(text.len() as u64));

    let stat = Encoder::new(EncoderConfig::static_mode(3))
        .compress(&text)
        .unwrap();
    group.bench_function("static_order_3", |b| {
        b.iter(|| black_box(Decoder::new().decode(&stat.artifact)).ok())
    });

    let adaptive = Encoder::new(EncoderConfig::per_position(3))
        .compress(&text)
        .unwrap();
    group.bench_function("per_position_order_3", |b| {
        let decoder = Decoder::with_model(&adaptive.model);
        b.iter(|| black_box(decoder.decode(&adaptive.artifact)).ok())
    });

    group.finish();
}

fn bench_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("packing");

    let text = generate_test_text(10_000);
    let result = Encoder::new(EncoderConfig::static_mode(2))
        .compress(&text)
        .unwrap();

    group.bench_function("pack_bits", |b| {
        b.iter(|| black_box(pack(result.artifact.bits())))
    });

    group.bench_function("container_roundtrip", |b| {
        b.iter(|| {
            let bytes = PackedStream::from_artifact(&result.artifact).to_bytes();
            black_box(PackedStream::from_bytes(&bytes)).ok();
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_training,
    bench_prediction,
    bench_codebook,
    bench_encoding,
    bench_decoding,
    bench_packing,
);

criterion_main!(benches);
