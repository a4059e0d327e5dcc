//! Benchmarks for markup stripping, dialogue parsing, and the decode loop.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use subcue::{
    BackendRegistry, MarkupStripper, MediaKind, MemorySource, Packet, SubtitleDecoder, TimeBase,
    TrackDescriptor, dialogue,
};

const PLAIN_RECORD: &str = "Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,Plain dialogue line";
const TAGGED_RECORD: &str = r"Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,{\an8\pos(320,50)\c&H00FFFF&}Top {\i1}italic{\i0}\Nsecond line";
const DRAWING_RECORD: &str = r"Dialogue: 0,0:00:01.00,0:00:04.00,Sign,,0,0,0,,{\p1}m 0 0 l 100 0 100 100 0 100{\p0}Sign text";

fn benchmark_markup_stripping(criterion: &mut Criterion) {
    let stripper = MarkupStripper::default();
    let mut group = criterion.benchmark_group("strip markup");

    for (name, input) in [
        ("plain", PLAIN_RECORD),
        ("tagged", TAGGED_RECORD),
        ("drawing", DRAWING_RECORD),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |bencher, input| {
            bencher.iter(|| stripper.strip(black_box(input)));
        });
    }

    let long_line = TAGGED_RECORD.repeat(16);
    group.bench_function("truncated", |bencher| {
        bencher.iter(|| stripper.strip(black_box(&long_line)));
    });

    group.finish();
}

fn benchmark_dialogue_parsing(criterion: &mut Criterion) {
    criterion.bench_function("extract dialogue (field count)", |bencher| {
        bencher.iter(|| dialogue::extract(black_box(PLAIN_RECORD)));
    });

    criterion.bench_function("extract dialogue (Default marker)", |bencher| {
        let line = "Dialogue: 0,0:42:29.20,0:42:31.08,Default,Chinese\nEnglish";
        bencher.iter(|| dialogue::extract(black_box(line)));
    });

    criterion.bench_function("strip and extract", |bencher| {
        bencher.iter(|| dialogue::plain_text_from_ass(black_box(TAGGED_RECORD), 511));
    });
}

fn benchmark_decode_loop(criterion: &mut Criterion) {
    let mut source = MemorySource::new()
        .with_track(MediaKind::Subtitle, TrackDescriptor::new("ass", TimeBase::new(1, 1000)));
    for index in 0..1000 {
        let event = format!(r"{index},0,Default,,0,0,0,,{{\i1}}Line {index}{{\i0}}\Nsecond");
        source = source.with_packet(Packet::new(0, event, index as f64, 2.0));
    }

    let registry = BackendRegistry::with_builtin();
    criterion.bench_function("decode 1000 ASS packets", |bencher| {
        bencher.iter(|| {
            let mut decoder = SubtitleDecoder::new(&registry);
            decoder.process(&mut source).unwrap();
            black_box(decoder.frames().len())
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_markup_stripping,
    benchmark_dialogue_parsing,
    benchmark_decode_loop,
);
criterion::criterion_main!(benches);
