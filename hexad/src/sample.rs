//! Turns decoded images into normalized color samples

use crate::{Error, Result};
use image::{DynamicImage, GenericImageView, RgbImage};
use palette::Srgb;
use std::{collections::HashMap, path::Path};

/// One sRGB color per source pixel, with channels normalized to `0.0..=1.0`
///
/// Channels are always stored in R, G, B order.
#[derive(Debug, Clone)]
pub struct SampleSet {
	/// Pixel colors in row-major order
	colors: Vec<Srgb>,
	/// Width of the source image
	width: u32,
	/// Height of the source image
	height: u32,
}

impl SampleSet {
	/// Sample every pixel of a decoded image.
	///
	/// # Errors
	/// Returns [`Error::EmptyImage`] if the image has zero area.
	pub fn from_image(image: &DynamicImage) -> Result<Self> {
		Self::from_rgb_image(&image.to_rgb8())
	}

	/// Sample every pixel of an RGB8 buffer.
	///
	/// # Errors
	/// Returns [`Error::EmptyImage`] if the image has zero area.
	pub fn from_rgb_image(image: &RgbImage) -> Result<Self> {
		let (width, height) = image.dimensions();
		if width == 0 || height == 0 {
			return Err(Error::EmptyImage);
		}

		let srgb: &[Srgb<u8>] = palette::cast::from_component_slice(image.as_raw());
		let colors = srgb.iter().map(|color| color.into_format()).collect();

		Ok(Self { colors, width, height })
	}

	/// The sampled colors in row-major order
	#[must_use]
	pub fn colors(&self) -> &[Srgb] {
		&self.colors
	}

	/// The number of samples, equal to the number of pixels
	#[must_use]
	pub fn len(&self) -> usize {
		self.colors.len()
	}

	/// Always `false`, since empty images are rejected on construction
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}

	/// Width and height of the source image
	#[must_use]
	pub const fn dimensions(&self) -> (u32, u32) {
		(self.width, self.height)
	}
}

/// Deduplicated samples, so that k-means scales with the number of distinct colors
#[derive(Debug, Clone)]
pub(crate) struct UniqueColors {
	/// Distinct colors in order of first appearance
	pub(crate) colors: Vec<Srgb>,
	/// The number of samples for each distinct color
	pub(crate) counts: Vec<u32>,
	/// For each sample, the index of its distinct color
	pub(crate) indices: Vec<u32>,
}

impl UniqueColors {
	/// Group identical samples together
	pub(crate) fn new(samples: &SampleSet) -> Self {
		let mut unique = Self {
			colors: Vec::new(),
			counts: Vec::new(),
			indices: Vec::with_capacity(samples.len()),
		};

		// Bit pattern -> unique index
		let mut memo: HashMap<[u32; 3], u32> = HashMap::new();

		for &color in samples.colors() {
			let key = [color.red.to_bits(), color.green.to_bits(), color.blue.to_bits()];
			let index = *memo.entry(key).or_insert_with(|| {
				// at most 2^24 distinct colors come from an 8-bit image
				#[allow(clippy::cast_possible_truncation)]
				let index = unique.colors.len() as u32;
				unique.colors.push(color);
				unique.counts.push(0);
				index
			});

			unique.counts[index as usize] += 1;
			unique.indices.push(index);
		}

		unique
	}

	/// The number of distinct colors
	pub(crate) fn num_colors(&self) -> usize {
		self.colors.len()
	}

	/// Iterate over each distinct color and its sample count
	pub(crate) fn pairs(&self) -> impl Iterator<Item = (Srgb, u32)> + '_ {
		self.colors.iter().copied().zip(self.counts.iter().copied())
	}
}

/// Load and decode the image at the given path
///
/// # Errors
/// Returns [`Error::Decode`] if the file cannot be read or decoded.
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
	let path = path.as_ref();
	image::open(path).map_err(|source| Error::Decode { path: path.to_path_buf(), source })
}

/// Create a thumbnail with at most `max_pixels` pixels if the image has more than `max_pixels` pixels
#[must_use]
pub fn thumbnail(image: DynamicImage, max_pixels: u32) -> DynamicImage {
	// The number of pixels should be < u64::MAX, since image dimensions are (u32, u32)
	let (width, height) = image.dimensions();
	let pixels = u64::from(width) * u64::from(height);
	if pixels <= u64::from(max_pixels) {
		tracing::debug!(pixels, max_pixels, "skipping thumbnail");
		image
	} else {
		// (u64 as f64) only gives innaccurate results for very large u64
		#[allow(clippy::cast_precision_loss)]
		let scale = (f64::from(max_pixels) / pixels as f64).sqrt();

		// multiplying by a positive factor < 1, but keep at least one pixel
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		let (thumb_width, thumb_height) = (
			((f64::from(width) * scale) as u32).max(1),
			((f64::from(height) * scale) as u32).max(1),
		);

		tracing::debug!(thumb_width, thumb_height, "creating thumbnail");
		image.thumbnail_exact(thumb_width, thumb_height)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::Rgb;

	fn checkerboard(width: u32, height: u32) -> RgbImage {
		RgbImage::from_fn(width, height, |x, y| {
			if (x + y) % 2 == 0 {
				Rgb([255, 0, 0])
			} else {
				Rgb([0, 0, 255])
			}
		})
	}

	#[test]
	fn one_sample_per_pixel() {
		let samples = SampleSet::from_rgb_image(&checkerboard(5, 3)).unwrap();
		assert_eq!(samples.len(), 15);
		assert_eq!(samples.dimensions(), (5, 3));
	}

	#[test]
	fn keeps_channel_order() {
		let image = RgbImage::from_pixel(1, 1, Rgb([255, 128, 0]));
		let samples = SampleSet::from_rgb_image(&image).unwrap();
		let color = samples.colors()[0];

		assert!((color.red - 1.0).abs() < f32::EPSILON);
		assert!((color.green - 128.0 / 255.0).abs() < 1e-6);
		assert!(color.blue.abs() < f32::EPSILON);
	}

	#[test]
	fn zero_area_is_rejected() {
		assert!(matches!(
			SampleSet::from_rgb_image(&RgbImage::new(0, 4)),
			Err(Error::EmptyImage)
		));
		assert!(matches!(
			SampleSet::from_image(&DynamicImage::new_rgb8(3, 0)),
			Err(Error::EmptyImage)
		));
	}

	#[test]
	fn missing_file_is_decode_error() {
		let result = load_image("this/path/does/not/exist.png");
		assert!(matches!(result, Err(Error::Decode { .. })));
	}

	#[test]
	fn unique_colors_group_duplicates() {
		let samples = SampleSet::from_rgb_image(&checkerboard(4, 4)).unwrap();
		let unique = UniqueColors::new(&samples);

		assert_eq!(unique.num_colors(), 2);
		assert_eq!(unique.counts, vec![8, 8]);
		assert_eq!(unique.indices.len(), 16);

		for (&index, &sample) in unique.indices.iter().zip(samples.colors()) {
			assert_eq!(unique.colors[index as usize], sample);
		}
	}

	#[test]
	fn thumbnail_has_at_most_max_pixels() {
		let image = DynamicImage::ImageRgb8(checkerboard(40, 30));

		let same = thumbnail(image.clone(), 40 * 30);
		assert_eq!(same.dimensions(), (40, 30));

		let max_pixels = 300;
		let thumb = thumbnail(image, max_pixels);
		let (width, height) = thumb.dimensions();
		assert!(width * height <= max_pixels);
		assert!(width > 0 && height > 0);
	}
}
