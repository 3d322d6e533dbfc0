use criterion::{
	black_box, criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, BenchmarkId, Criterion,
	SamplingMode,
};
use hexad::{ClusterOptions, PaletteOptions, ReduceOptions, SampleSet};
use image::{DynamicImage, Rgb, RgbImage};
use std::time::Duration;

const SIZES: [(u32, u32); 3] = [(64, 64), (480, 270), (1280, 720)];

fn gradient(width: u32, height: u32) -> DynamicImage {
	#[allow(clippy::cast_possible_truncation)]
	let image = RgbImage::from_fn(width, height, |x, y| {
		Rgb([
			(x * 255 / width) as u8,
			(y * 255 / height) as u8,
			((x + y) * 255 / (width + height)) as u8,
		])
	});
	DynamicImage::ImageRgb8(image)
}

fn create_group<'a>(c: &'a mut Criterion, name: &'a str) -> BenchmarkGroup<'a, WallTime> {
	let mut group = c.benchmark_group(name);
	group
		.sample_size(30)
		.noise_threshold(0.05)
		.sampling_mode(SamplingMode::Flat)
		.warm_up_time(Duration::from_millis(500));
	group
}

fn sampling(c: &mut Criterion) {
	let mut group = create_group(c, "sampling");

	for (width, height) in SIZES {
		let image = gradient(width, height);
		group.bench_with_input(BenchmarkId::from_parameter(format!("{width}x{height}")), &image, |b, image| {
			b.iter(|| SampleSet::from_image(black_box(image)).expect("nonempty image"));
		});
	}
}

fn kmeans(c: &mut Criterion) {
	let mut group = create_group(c, "kmeans");
	group.measurement_time(Duration::from_secs(2));

	let samples = SIZES
		.into_iter()
		.map(|(width, height)| {
			let samples = SampleSet::from_image(&gradient(width, height)).expect("nonempty image");
			(format!("{width}x{height}"), samples)
		})
		.collect::<Vec<_>>();

	for k in [6, 8, 11, 16] {
		for (name, samples) in &samples {
			let options = ClusterOptions { k, ..ClusterOptions::default() };
			group.bench_with_input(BenchmarkId::new(format!("k={k}"), name), samples, |b, samples| {
				b.iter(|| hexad::cluster(samples, black_box(&options), &mut hexad::seeded_rng(0)));
			});
		}
	}
}

fn reduction(c: &mut Criterion) {
	let mut group = create_group(c, "reduction");

	let samples = SampleSet::from_image(&gradient(64, 64)).expect("nonempty image");
	for k in [8, 16] {
		let options = ClusterOptions { k, ..ClusterOptions::default() };
		let centers = hexad::cluster(&samples, &options, &mut hexad::seeded_rng(0))
			.expect("valid k")
			.centers;

		group.bench_with_input(BenchmarkId::from_parameter(k), &centers, |b, centers| {
			b.iter(|| hexad::reduce::reduce(black_box(centers.clone()), ReduceOptions::default()));
		});
	}
}

fn all_steps(c: &mut Criterion) {
	let mut group = create_group(c, "all steps");
	group.measurement_time(Duration::from_secs(4));

	for (width, height) in SIZES {
		let image = gradient(width, height);
		group.bench_with_input(BenchmarkId::from_parameter(format!("{width}x{height}")), &image, |b, image| {
			b.iter(|| hexad::from_image(image, black_box(&PaletteOptions::default()), &mut hexad::seeded_rng(0)));
		});
	}
}

criterion_group!(benches, sampling, kmeans, reduction, all_steps);
criterion_main!(benches);
