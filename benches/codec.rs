use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use voxline::{decode_audio_data, decode_frame, encode_frame};

/// Synthesize one frame of speech-shaped samples.
fn frame(samples: usize) -> Vec<f32> {
    (0..samples)
        .map(|i| (i as f32 * 0.013).sin() * 0.8)
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");
    for &samples in &[1024usize, 4096, 16384] {
        let input = frame(samples);
        group.bench_with_input(BenchmarkId::from_parameter(samples), &input, |b, input| {
            b.iter(|| encode_frame(black_box(input)));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_audio_data");
    for &samples in &[1024usize, 4096, 16384] {
        let encoded = encode_frame(&frame(samples));
        group.bench_with_input(
            BenchmarkId::from_parameter(samples),
            &encoded,
            |b, encoded| {
                b.iter(|| {
                    let bytes = decode_frame(black_box(encoded)).expect("valid payload");
                    decode_audio_data(&bytes, 24_000, 1).expect("valid pcm")
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
