//! Extract a six color palette from an image.
//!
//! The pipeline samples every pixel, runs k-means to find `k` dominant colors,
//! repeatedly drops one member of the closest pair of colors until six remain,
//! and finally orders them from brightest to darkest.
//!
//! # Examples
//!
//! ## Read an image file and get its palette.
//!
//! ```no_run
//! let image = hexad::load_image("some image")?;
//! let mut rng = hexad::seeded_rng(42);
//! let generated = hexad::from_image(&image, &hexad::PaletteOptions::default(), &mut rng)?;
//! println!("{}", generated.palette);
//! # Ok::<(), hexad::Error>(())
//! ```
//!
//! ## Toggle a display overlay without losing the original colors.
//!
//! ```no_run
//! # let image = hexad::load_image("some image")?;
//! # let mut rng = hexad::seeded_rng(42);
//! let generated = hexad::from_image(&image, &hexad::PaletteOptions::default(), &mut rng)?;
//! let mut state = hexad::OverlayState::new(generated.palette);
//!
//! state.enable(hexad::OverlayParams { saturation_boost: 70, lightness_boost: 40 });
//! state.disable();
//! assert_eq!(*state.displayed(), generated.palette);
//! # Ok::<(), hexad::Error>(())
//! ```
//!
//! # Arguments
//!
//! ## K
//!
//! The number of clusters k-means looks for before reduction, in `4..=16`.
//! It must also be at least six, plus one for each skip flag.
//! [`random_k`] picks a value in `8..=11`, which leaves a few rounds of reduction.
//!
//! ## Skip darkest / skip lightest
//!
//! Each flag keeps one extra color through reduction.
//! After ordering, the darkest or lightest color is then left out of the palette.
//!
//! ## Trials, max iterations, convergence threshold
//!
//! k-means runs `trials` times from the same random number generator,
//! keeping the run with the lowest variance.
//! Each run stops after `max_iter` iterations,
//! or once the centers move less than the convergence threshold in total.
//!
//! ## Randomness
//!
//! k-means++ seeding is random, so different seeds may give different (but similar) palettes.
//! Pass a generator from [`seeded_rng`] with a fixed seed to get reproducible results.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::cargo)]
#![warn(clippy::use_debug, clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![warn(clippy::unwrap_used, clippy::unwrap_in_result)]
#![warn(clippy::unneeded_field_pattern, clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::str_to_string, clippy::string_to_string, clippy::string_slice)]
#![warn(missing_docs, clippy::missing_docs_in_private_items, rustdoc::all)]
#![warn(clippy::float_cmp_const, clippy::lossy_float_literal)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::unreadable_literal)]

use image::DynamicImage;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

pub mod compose;
mod error;
pub mod export;
mod kmeans;
pub mod order;
pub mod overlay;
pub mod reduce;
mod sample;
mod swatch;

pub use compose::{render_composite, save_composite, CompositeLayout};
pub use error::{Error, Result};
pub use kmeans::{cluster, random_k, ClusterOptions, Clusters, MAX_K, MIN_K, RANDOM_K};
pub use overlay::{apply_overlay, OverlayParams, OverlayState};
pub use reduce::{ReduceOptions, PALETTE_SIZE};
pub use sample::{load_image, thumbnail, SampleSet};
pub use swatch::{hex, Palette};

/// The random number generator used by the pipeline
pub type PaletteRng = Xoshiro256PlusPlus;

/// Create a generator from a fixed seed
#[must_use]
pub fn seeded_rng(seed: u64) -> PaletteRng {
	Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// A seed taken from the current time, for when reproducibility is not needed
#[must_use]
// only the low bits of the timestamp are kept
#[allow(clippy::cast_possible_truncation)]
pub fn time_seed() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map_or(0, |elapsed| elapsed.as_nanos() as u64)
}

/// All arguments for generating a palette
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteOptions {
	/// The number of clusters to find before reduction
	pub k: u8,
	/// The number of k-means runs
	pub trials: u32,
	/// The maximum number of iterations per k-means run
	pub max_iter: u32,
	/// Runs stop once the summed center movement is at most this value
	pub convergence_threshold: f32,
	/// Leave the darkest color out of the palette
	pub skip_darkest: bool,
	/// Leave the lightest color out of the palette
	pub skip_lightest: bool,
}

impl Default for PaletteOptions {
	fn default() -> Self {
		let ClusterOptions { k, trials, max_iter, convergence_threshold } = ClusterOptions::default();
		Self {
			k,
			trials,
			max_iter,
			convergence_threshold,
			skip_darkest: false,
			skip_lightest: false,
		}
	}
}

impl PaletteOptions {
	/// The arguments for the cluster engine
	#[must_use]
	pub const fn cluster_options(&self) -> ClusterOptions {
		ClusterOptions {
			k: self.k,
			trials: self.trials,
			max_iter: self.max_iter,
			convergence_threshold: self.convergence_threshold,
		}
	}

	/// The arguments for the reducer and orderer
	#[must_use]
	pub const fn reduce_options(&self) -> ReduceOptions {
		ReduceOptions {
			skip_darkest: self.skip_darkest,
			skip_lightest: self.skip_lightest,
		}
	}
}

/// The output of the pipeline
#[derive(Debug, Clone)]
pub struct Generated {
	/// The six ordered colors
	pub palette: Palette,
	/// The clusters before reduction, e.g. for [`Clusters::posterize`]
	pub clusters: Clusters,
}

/// Generate a palette from a set of samples
///
/// # Errors
/// Returns [`Error::InsufficientClusters`] if `k` is too small for six colors and the skip flags,
/// or [`Error::Clustering`] if `k` does not fit the samples.
pub fn generate(samples: &SampleSet, options: &PaletteOptions, rng: &mut impl Rng) -> Result<Generated> {
	let reduce_options = options.reduce_options();
	let required = reduce_options.required_clusters();
	if usize::from(options.k) < required {
		return Err(Error::InsufficientClusters { k: usize::from(options.k), required });
	}

	let clusters = kmeans::cluster(samples, &options.cluster_options(), rng)?;
	tracing::debug!(
		k = clusters.centers.len(),
		variance = clusters.variance,
		iterations = clusters.iterations,
		"clustered samples"
	);

	let reduced = reduce::reduce(clusters.centers.clone(), reduce_options)?;
	let palette = order::arrange(reduced, reduce_options)?;
	tracing::debug!(%palette, "generated palette");

	Ok(Generated { palette, clusters })
}

/// Sample an image and generate its palette
///
/// # Errors
/// Returns [`Error::EmptyImage`] for an image with no pixels, otherwise the same errors as [`generate`].
pub fn from_image(image: &DynamicImage, options: &PaletteOptions, rng: &mut impl Rng) -> Result<Generated> {
	generate(&SampleSet::from_image(image)?, options, rng)
}
