//! Renders a shareable image: the source picture above a row of swatches

use crate::{reduce::PALETTE_SIZE, Error, Palette, Result};
use image::{imageops, imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use std::path::Path;

/// Padding around the whole composite
pub const BORDER: u32 = 20;

/// Gap between the source thumbnail and the swatch row
pub const MARGIN: u32 = 20;

/// Gap between neighboring swatches
pub const SPACING: u32 = 10;

/// Background color of the composite
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Size of each swatch rectangle, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeLayout {
	/// Width of each swatch
	pub swatch_width: u32,
	/// Height of each swatch
	pub swatch_height: u32,
}

impl Default for CompositeLayout {
	fn default() -> Self {
		Self { swatch_width: 96, swatch_height: 96 }
	}
}

impl CompositeLayout {
	/// Width of the swatch row, which is also the width of the thumbnail
	#[must_use]
	pub const fn row_width(self) -> u32 {
		#[allow(clippy::cast_possible_truncation)]
		let n = PALETTE_SIZE as u32;
		n * self.swatch_width + (n - 1) * SPACING
	}

	/// Height of the thumbnail for a source image, keeping its aspect ratio
	#[must_use]
	pub fn thumbnail_height(self, (width, height): (u32, u32)) -> u32 {
		// rounding a positive value that is at most the scaled image height
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		let scaled = (f64::from(height) / f64::from(width.max(1)) * f64::from(self.row_width())).round() as u32;
		scaled.max(1)
	}

	/// Width and height of the composite for a source image
	#[must_use]
	pub fn dimensions(self, source: (u32, u32)) -> (u32, u32) {
		(
			BORDER + self.row_width() + BORDER,
			BORDER + self.thumbnail_height(source) + MARGIN + self.swatch_height + BORDER,
		)
	}
}

/// Render the source thumbnail with the palette below it
#[must_use]
pub fn render_composite(source: &DynamicImage, palette: &Palette, layout: CompositeLayout) -> RgbImage {
	let (width, height) = layout.dimensions(source.dimensions());
	let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

	let thumb_width = layout.row_width();
	let thumb_height = layout.thumbnail_height(source.dimensions());
	let thumb = source
		.resize_exact(thumb_width, thumb_height, FilterType::Triangle)
		.into_rgb8();
	imageops::replace(&mut canvas, &thumb, i64::from(BORDER), i64::from(BORDER));

	let y = BORDER + thumb_height + MARGIN;
	for (i, color) in (0..).zip(palette.colors()) {
		let swatch = RgbImage::from_pixel(
			layout.swatch_width,
			layout.swatch_height,
			Rgb([color.red, color.green, color.blue]),
		);
		let x = BORDER + i * (layout.swatch_width + SPACING);
		imageops::replace(&mut canvas, &swatch, i64::from(x), i64::from(y));
	}

	canvas
}

/// Render the composite and save it, choosing the format from the file extension
///
/// # Errors
/// Returns [`Error::Io`] if the image cannot be encoded or written.
pub fn save_composite(
	path: impl AsRef<Path>,
	source: &DynamicImage,
	palette: &Palette,
	layout: CompositeLayout,
) -> Result<()> {
	let path = path.as_ref();
	render_composite(source, palette, layout)
		.save(path)
		.map_err(|e| Error::image_io(path, e))?;
	tracing::debug!(path = %path.display(), "saved composite image");
	Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use palette::Srgb;

	fn test_palette() -> Palette {
		Palette::new([
			Srgb::new(250, 10, 10),
			Srgb::new(10, 250, 10),
			Srgb::new(10, 10, 250),
			Srgb::new(200, 200, 0),
			Srgb::new(0, 200, 200),
			Srgb::new(30, 30, 30),
		])
	}

	fn source() -> DynamicImage {
		DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([0, 0, 0])))
	}

	fn small() -> CompositeLayout {
		CompositeLayout { swatch_width: 40, swatch_height: 30 }
	}

	#[test]
	fn layout_dimensions() {
		let layout = small();
		assert_eq!(layout.row_width(), 6 * 40 + 5 * 10);
		assert_eq!(layout.thumbnail_height((200, 100)), 145);
		assert_eq!(layout.dimensions((200, 100)), (20 + 290 + 20, 20 + 145 + 20 + 30 + 20));
	}

	#[test]
	fn swatches_are_painted_in_order() {
		let layout = small();
		let palette = test_palette();
		let composite = render_composite(&source(), &palette, layout);

		assert_eq!(composite.dimensions(), layout.dimensions((200, 100)));

		let y = BORDER + 145 + MARGIN + layout.swatch_height / 2;
		for (i, color) in (0..).zip(palette.colors()) {
			let x = BORDER + i * (layout.swatch_width + SPACING) + layout.swatch_width / 2;
			assert_eq!(*composite.get_pixel(x, y), Rgb([color.red, color.green, color.blue]));
		}
	}

	#[test]
	fn border_spacing_and_thumbnail() {
		let layout = small();
		let composite = render_composite(&source(), &test_palette(), layout);

		// outer border and margin stay white
		assert_eq!(*composite.get_pixel(5, 5), BACKGROUND);
		assert_eq!(*composite.get_pixel(BORDER + 10, BORDER + 145 + MARGIN / 2), BACKGROUND);
		// gap between the first two swatches
		let gap_x = BORDER + layout.swatch_width + SPACING / 2;
		assert_eq!(*composite.get_pixel(gap_x, BORDER + 145 + MARGIN + 5), BACKGROUND);
		// inside the black thumbnail
		assert_eq!(*composite.get_pixel(BORDER + 100, BORDER + 70), Rgb([0, 0, 0]));
	}

	#[test]
	fn save_and_reload() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("composite.png");
		let layout = small();

		save_composite(&path, &source(), &test_palette(), layout).unwrap();
		let reloaded = image::open(&path).unwrap();

		assert_eq!(reloaded.dimensions(), layout.dimensions((200, 100)));
	}

	#[test]
	fn unwritable_path_is_io_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("missing").join("composite.png");

		assert!(matches!(
			save_composite(path, &source(), &test_palette(), small()),
			Err(Error::Io { .. })
		));
	}
}
