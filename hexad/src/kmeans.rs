//! Provides the implementation for (sort) k-means over sRGB samples
//!
//! Centers are seeded with k-means++ and refined with Lloyd iterations.
//! The assignment step skips centers that provably cannot be closer,
//! using the sorted distances between every pair of centers.

use crate::{
	sample::{SampleSet, UniqueColors},
	Error, Result,
};
use image::RgbImage;
use palette::Srgb;
use rand::Rng;

/// The smallest number of clusters k-means will run with
pub const MIN_K: u8 = 4;

/// The largest number of clusters k-means will run with
pub const MAX_K: u8 = 16;

/// The range the default, randomly chosen k is drawn from
pub const RANDOM_K: std::ops::RangeInclusive<u8> = 8..=11;

/// Squared Euclidean distance between two colors
#[inline]
pub(crate) fn squared_distance(x: Srgb, y: Srgb) -> f32 {
	let dr = x.red - y.red;
	let dg = x.green - y.green;
	let db = x.blue - y.blue;
	dr * dr + dg * dg + db * db
}

/// Arguments for the cluster engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
	/// The number of clusters to find, in `MIN_K..=MAX_K`
	pub k: u8,
	/// The number of k-means runs, keeping the one with the lowest variance
	pub trials: u32,
	/// The maximum number of iterations per run
	pub max_iter: u32,
	/// Runs stop once the summed movement of all centers is at most this value
	pub convergence_threshold: f32,
}

impl Default for ClusterOptions {
	fn default() -> Self {
		Self {
			k: 8,
			trials: 3,
			max_iter: 10,
			convergence_threshold: 0.0,
		}
	}
}

/// Pick a k uniformly from [`RANDOM_K`]
pub fn random_k(rng: &mut impl Rng) -> u8 {
	rng.gen_range(RANDOM_K)
}

/// Bookkeeping for each distinct color
struct PointData {
	/// Center assignment for this color
	assignment: Vec<u8>,
	/// Squared distance to the closest chosen centroid, used by k-means++
	weight: Vec<f32>,
}

impl PointData {
	/// Create a [`PointData`] with the given number of distinct colors
	fn new(n: usize) -> Self {
		Self {
			assignment: vec![0; n],
			weight: vec![f32::INFINITY; n],
		}
	}

	/// Reset data for the next k-means trial
	fn reset(&mut self) {
		// assignments are recomputed from scratch each trial
		self.weight.fill(f32::INFINITY);
	}
}

/// Data for each center/centroid
struct CenterData {
	/// The centroid point
	centroid: Vec<Srgb>,
	/// Vector sum for all colors in this center
	sum: Vec<Srgb<f64>>,
	/// Number of samples in this center
	count: Vec<u32>,
}

impl CenterData {
	/// Create a [`CenterData`] with the given number of centers
	fn new(k: u8) -> Self {
		let k = usize::from(k);
		Self {
			centroid: Vec::with_capacity(k),
			sum: vec![Srgb::new(0.0, 0.0, 0.0); k],
			count: vec![0; k],
		}
	}

	/// Reset data for the next k-means trial
	fn reset(&mut self) {
		self.centroid.clear();
		self.sum.fill(Srgb::new(0.0, 0.0, 0.0));
		self.count.fill(0);
	}
}

/// Holds all the state used by k-means
struct KmeansState {
	/// Data for each center
	centers: CenterData,
	/// One fourth of the squared distance between each pair of centers
	distances: Vec<(u8, f32)>,
	/// Data for each distinct color
	points: PointData,
}

impl KmeansState {
	/// Initialize a new [`KmeansState`] with `k` centers and `n` distinct colors
	fn new(k: u8, n: usize) -> Self {
		Self {
			centers: CenterData::new(k),
			distances: vec![(0, 0.0); usize::from(k) * usize::from(k)],
			points: PointData::new(n),
		}
	}
}

/// The result of clustering a [`SampleSet`]
#[derive(Debug, Clone)]
pub struct Clusters {
	/// The `k` cluster centers, possibly with duplicates if the image has fewer than `k` distinct colors
	pub centers: Vec<Srgb>,
	/// Number of samples in each center
	pub counts: Vec<u32>,
	/// For each sample, the index of its center
	pub assignments: Vec<u8>,
	/// Summed squared distance from each sample to its center
	pub variance: f64,
	/// Number of elapsed iterations in the chosen trial
	pub iterations: u32,
}

impl Clusters {
	/// Repaint every sample with the color of its center.
	///
	/// Returns `None` if these clusters were not computed from `samples`.
	#[must_use]
	pub fn posterize(&self, samples: &SampleSet) -> Option<RgbImage> {
		if self.assignments.len() != samples.len() {
			return None;
		}

		let centers = self
			.centers
			.iter()
			.map(|color| color.into_format::<u8>())
			.collect::<Vec<Srgb<u8>>>();

		let mut buf = Vec::with_capacity(samples.len() * 3);
		for &center in &self.assignments {
			let color = centers.get(usize::from(center))?;
			buf.extend_from_slice(&[color.red, color.green, color.blue]);
		}

		let (width, height) = samples.dimensions();
		RgbImage::from_raw(width, height, buf)
	}
}

/// Choose the starting centroids using the k-means++ algorithm
///
/// If every distinct color becomes a centroid before `k` are chosen,
/// the remaining centroids duplicate randomly chosen existing ones.
fn kmeans_plus_plus(
	k: u8,
	rng: &mut impl Rng,
	unique: &UniqueColors,
	centroids: &mut Vec<Srgb>,
	weights: &mut [f32],
) {
	use rand::{
		distributions::{WeightedError::*, WeightedIndex},
		prelude::Distribution,
	};

	let colors = &unique.colors;

	// Pick the first centroid with probability proportional to its number of samples
	match WeightedIndex::new(&unique.counts) {
		Ok(sampler) => centroids.push(colors[sampler.sample(rng)]),
		Err(AllWeightsZero | InvalidWeight | NoItem | TooMany) => {
			unreachable!("counts are > 0 and colors.len() is in 1..=2.pow(24)")
		},
	}

	// Pick each next centroid with a weighted probability based off the squared distance to its closest centroid
	for i in 1..usize::from(k) {
		let centroid = centroids[i - 1];
		for (weight, &color) in weights.iter_mut().zip(colors) {
			*weight = f32::min(*weight, squared_distance(color, centroid));
		}

		#[allow(clippy::cast_precision_loss)]
		let weighted = weights.iter().zip(&unique.counts).map(|(&w, &n)| w * n as f32);

		match WeightedIndex::new(weighted) {
			Ok(sampler) => centroids.push(colors[sampler.sample(rng)]),
			Err(AllWeightsZero) => {
				// all colors exactly match a centroid
				while centroids.len() < usize::from(k) {
					let duplicate = centroids[rng.gen_range(0..centroids.len())];
					centroids.push(duplicate);
				}
				return;
			},
			Err(InvalidWeight | NoItem | TooMany) => {
				unreachable!("distances are >= 0 and colors.len() is in 1..=2.pow(24)")
			},
		}
	}
}

/// Index of the closest centroid, preferring the earliest on ties
// centroids.len() <= MAX_K
#[allow(clippy::cast_possible_truncation)]
fn nearest(color: Srgb, centroids: &[Srgb]) -> u8 {
	let mut min_dist = f32::INFINITY;
	let mut min_center = 0;
	for (i, &centroid) in centroids.iter().enumerate() {
		let dist = squared_distance(color, centroid);
		if dist < min_dist {
			min_dist = dist;
			min_center = i as u8;
		}
	}
	min_center
}

/// Assign each color to its closest starting centroid and initialize the center sums and counts
fn compute_initial_sums(unique: &UniqueColors, centers: &mut CenterData, points: &mut PointData) {
	for ((color, n), center) in unique.pairs().zip(&mut points.assignment) {
		*center = nearest(color, &centers.centroid);
		let i = usize::from(*center);
		let nf = f64::from(n);
		let sum = &mut centers.sum[i];
		sum.red += nf * f64::from(color.red);
		sum.green += nf * f64::from(color.green);
		sum.blue += nf * f64::from(color.blue);
		centers.count[i] += n;
	}
}

/// For each pair of centers, update their distances and sort each center's row by increasing distance
// i and j are < centroids.len() <= MAX_K
#[allow(clippy::cast_possible_truncation)]
fn update_distances(centroids: &[Srgb], distances: &mut [(u8, f32)]) {
	let k = centroids.len();
	for i in 0..k {
		let ci = centroids[i];
		distances[i * k + i] = (i as u8, 0.0);
		for j in (i + 1)..k {
			let cj = centroids[j];
			let dist = squared_distance(ci, cj) / 4.0;
			distances[j * k + i] = (i as u8, dist);
			distances[i * k + j] = (j as u8, dist);
		}
	}

	// the center itself goes first, even next to a duplicate at distance 0
	for (i, row) in distances.chunks_exact_mut(k).enumerate() {
		row.sort_by(|&(a, x), &(b, y)| {
			f32::total_cmp(&x, &y).then((usize::from(a) != i).cmp(&(usize::from(b) != i)))
		});
	}
}

/// For each color, move it to its closest center, preferring the earliest on ties
fn update_assignments(
	unique: &UniqueColors,
	centers: &mut CenterData,
	distances: &[(u8, f32)],
	points: &mut PointData,
) {
	let k = centers.centroid.len();
	for ((color, n), center) in unique.pairs().zip(&mut points.assignment) {
		let ci = usize::from(*center);
		let dist = squared_distance(color, centers.centroid[ci]);

		// Find the closest center
		let mut min_dist = dist;
		let mut min_center = *center;
		for &(other_center, quarter_dist) in &distances[(ci * k + 1)..((ci + 1) * k)] {
			if dist < quarter_dist {
				break;
			}

			// equally close centers go to the earliest one, like the initial assignment
			let other_dist = squared_distance(color, centers.centroid[usize::from(other_center)]);
			if other_dist < min_dist || (other_dist <= min_dist && other_center < min_center) {
				min_dist = other_dist;
				min_center = other_center;
			}
		}

		// Move this color to its new center
		if min_center != *center {
			let nf = f64::from(n);
			let r = nf * f64::from(color.red);
			let g = nf * f64::from(color.green);
			let b = nf * f64::from(color.blue);

			let old_sum = &mut centers.sum[ci];
			old_sum.red -= r;
			old_sum.green -= g;
			old_sum.blue -= b;
			centers.count[ci] -= n;

			let cj = usize::from(min_center);

			let new_sum = &mut centers.sum[cj];
			new_sum.red += r;
			new_sum.green += g;
			new_sum.blue += b;
			centers.count[cj] += n;

			*center = min_center;
		}
	}
}

/// For each center, update its centroid using the vector sums and return the total movement
///
/// A center with no samples keeps its previous centroid.
fn update_centroids(centers: &mut CenterData) -> f32 {
	let mut total_delta = 0.0;
	for ((centroid, &n), sum) in centers.centroid.iter_mut().zip(&centers.count).zip(&centers.sum) {
		if n == 0 {
			continue;
		}

		let n = f64::from(n);
		// Sums may need greater precision, but the average can fall back down to a reduced precision
		#[allow(clippy::cast_possible_truncation)]
		let new_centroid = Srgb::new(
			(sum.red / n) as f32,
			(sum.green / n) as f32,
			(sum.blue / n) as f32,
		);

		total_delta += squared_distance(*centroid, new_centroid).sqrt();
		*centroid = new_centroid;
	}

	total_delta
}

/// The outcome of a single k-means trial, in terms of distinct colors
struct Trial {
	/// Final centroids
	centroids: Vec<Srgb>,
	/// Number of samples per centroid
	counts: Vec<u32>,
	/// Center assignment for each distinct color
	assignment: Vec<u8>,
	/// Summed squared distance to the assigned centers
	variance: f64,
	/// Number of elapsed iterations
	iterations: u32,
}

/// Run a trial of sort k-means
fn kmeans(
	unique: &UniqueColors,
	KmeansState { centers, distances, points }: &mut KmeansState,
	k: u8,
	max_iter: u32,
	convergence: f32,
	rng: &mut impl Rng,
) -> Trial {
	kmeans_plus_plus(k, rng, unique, &mut centers.centroid, &mut points.weight);
	compute_initial_sums(unique, centers, points);

	let mut iterations = 0;
	let mut total_delta = f32::INFINITY;
	while iterations < max_iter && total_delta > convergence {
		total_delta = update_centroids(centers);
		update_distances(&centers.centroid, distances);
		update_assignments(unique, centers, distances, points);
		iterations += 1;
	}

	let variance = unique
		.pairs()
		.zip(&points.assignment)
		.map(|((color, n), &center)| {
			f64::from(n) * f64::from(squared_distance(color, centers.centroid[usize::from(center)]))
		})
		.sum();

	let trial = Trial {
		centroids: centers.centroid.clone(),
		counts: centers.count.clone(),
		assignment: points.assignment.clone(),
		variance,
		iterations,
	};

	centers.reset();
	points.reset();

	trial
}

/// Partition the samples into `k` clusters, taking the trial with the lowest variance
///
/// # Errors
/// Returns [`Error::Clustering`] if `k` is outside of `MIN_K..=MAX_K`,
/// `k` is larger than the number of samples, or `trials` is 0.
pub fn cluster(samples: &SampleSet, options: &ClusterOptions, rng: &mut impl Rng) -> Result<Clusters> {
	let ClusterOptions { k, trials, max_iter, convergence_threshold } = *options;

	if !(MIN_K..=MAX_K).contains(&k) {
		return Err(Error::Clustering(format!("k = {k} is outside of {MIN_K}..={MAX_K}")));
	}
	if usize::from(k) > samples.len() {
		return Err(Error::Clustering(format!(
			"k = {k} is larger than the number of samples ({})",
			samples.len()
		)));
	}

	let unique = UniqueColors::new(samples);
	tracing::debug!(samples = samples.len(), distinct = unique.num_colors(), "deduplicated samples");

	let mut state = KmeansState::new(k, unique.num_colors());

	let best = (0..trials)
		.map(|i| {
			let trial = kmeans(&unique, &mut state, k, max_iter, convergence_threshold, &mut *rng);
			tracing::debug!(trial = i, variance = trial.variance, iterations = trial.iterations, "k-means trial");
			trial
		})
		.min_by(|x, y| f64::total_cmp(&x.variance, &y.variance))
		.ok_or_else(|| Error::Clustering("at least one trial is needed".to_owned()))?;

	let assignments = unique
		.indices
		.iter()
		.map(|&index| best.assignment[index as usize])
		.collect();

	Ok(Clusters {
		centers: best.centroids,
		counts: best.counts,
		assignments,
		variance: best.variance,
		iterations: best.iterations,
	})
}
