//! Benchmark suite for the concealment pipelines.
//!
//! Measures whole-stream embed and extract over synthetic covers, plus the
//! capacity scan on its own.
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gifweave_benches::{generate_cover_gif, sizes};
use gifweave_types::conceal::{Concealer, Options, capacity};
use std::hint::black_box;

const MESSAGE: &[u8] = b"The quick brown fox jumps over the lazy dog.";

fn bench_embed(c: &mut Criterion) {
	let mut group = c.benchmark_group("embed");

	for (name, (width, height)) in
		[("tiny", sizes::TINY), ("small", sizes::SMALL), ("medium", sizes::MEDIUM)]
	{
		let cover = generate_cover_gif(8, width, height);
		group.throughput(Throughput::Bytes(cover.len() as u64));

		group.bench_with_input(BenchmarkId::new("plain", name), &cover, |b, cover| {
			let concealer = Concealer::new(Options::default(), None);
			b.iter(|| {
				let mut out = Vec::with_capacity(cover.len());
				concealer
					.embed(&mut black_box(MESSAGE), &mut cover.as_slice(), &mut out)
					.expect("cover is large enough");
				black_box(out)
			});
		});

		group.bench_with_input(BenchmarkId::new("keyed", name), &cover, |b, cover| {
			let concealer = Concealer::new(Options::default(), Some("benchmark"));
			b.iter(|| {
				let mut out = Vec::with_capacity(cover.len());
				concealer
					.embed(&mut black_box(MESSAGE), &mut cover.as_slice(), &mut out)
					.expect("cover is large enough");
				black_box(out)
			});
		});
	}

	group.finish();
}

fn bench_extract(c: &mut Criterion) {
	let mut group = c.benchmark_group("extract");

	for (name, (width, height)) in [("tiny", sizes::TINY), ("small", sizes::SMALL)] {
		let cover = generate_cover_gif(8, width, height);
		let concealer = Concealer::new(Options::default(), Some("benchmark"));
		let mut embedded = Vec::new();
		concealer
			.embed(&mut &MESSAGE[..], &mut cover.as_slice(), &mut embedded)
			.expect("cover is large enough");

		group.bench_with_input(BenchmarkId::from_parameter(name), &embedded, |b, embedded| {
			b.iter(|| {
				let mut message = Vec::new();
				concealer
					.extract(&mut black_box(embedded).as_slice(), &mut message)
					.expect("stream was just embedded");
				black_box(message)
			});
		});
	}

	group.finish();
}

fn bench_capacity(c: &mut Criterion) {
	let cover = generate_cover_gif(8, 64, 64);

	c.bench_function("capacity", |b| {
		b.iter(|| capacity(&mut black_box(&cover).as_slice()).expect("valid cover"));
	});
}

criterion_group!(benches, bench_embed, bench_extract, bench_capacity);
criterion_main!(benches);
