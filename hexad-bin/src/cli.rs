//! Specifies the CLI and handles arg parsing

use clap::{Parser, ValueEnum};
use hexad::{overlay::BOOST_MAX, CompositeLayout, OverlayParams, MAX_K, MIN_K};
use std::{
	fmt::{Debug, Display},
	num::ParseFloatError,
	ops::RangeBounds,
	path::PathBuf,
	str::FromStr,
};

/// The number of bundled default images
pub const BUILTIN_IMAGES: u8 = 3;

/// Supported output formats for the final colors
#[derive(Copy, Clone, ValueEnum)]
pub enum FormatOutput {
	/// sRGB hexcode
	Hex,
	/// sRGB (r,g,b) triple
	Rgb,
	/// Whitespace with true color background
	Swatch,
}

/// Ways to colorize the output text
#[derive(Copy, Clone, ValueEnum)]
pub enum ColorizeOutput {
	/// Foreground
	Fg,
	/// Background
	Bg,
}

/// Generate a six color palette for an image.
///
/// The image is clustered into k colors with k-means,
/// the closest colors are dropped until six remain,
/// and the result is printed from brightest to darkest.
#[allow(clippy::struct_excessive_bools)]
#[derive(Parser)]
#[command(version)]
pub struct Options {
	/// The path to the input image
	#[arg(required_unless_present_any = ["import", "builtin"])]
	pub image: Option<PathBuf>,

	/// Use one of the bundled default images instead of an image file
	#[arg(long, value_parser = clap::value_parser!(u8).range(1..=i64::from(BUILTIN_IMAGES)), conflicts_with_all = ["image", "import"])]
	pub builtin: Option<u8>,

	/// Print the palette stored in a .flclr file instead of reading an image
	#[arg(long, conflicts_with_all = ["image", "export", "poster", "save"])]
	pub import: Option<PathBuf>,

	/// The format to print the colors in
	#[arg(short, long, default_value = "hex")]
	pub output: FormatOutput,

	/// Color the foreground or background for each printed color
	#[arg(short, long)]
	pub colorize: Option<ColorizeOutput>,

	/// The number of colors to find before reducing them to six
	///
	/// Must be in [4, 16] and at least 6 plus one for each of --skip-darkest and --skip-lightest.
	/// If not provided, a random value in [8, 11] is used.
	#[arg(short, value_parser = clap::value_parser!(u8).range(i64::from(MIN_K)..=i64::from(MAX_K)))]
	pub k: Option<u8>,

	/// Leave the darkest color out of the palette
	#[arg(long)]
	pub skip_darkest: bool,

	/// Leave the lightest color out of the palette
	#[arg(long)]
	pub skip_lightest: bool,

	/// The number of trials of k-means to run
	///
	/// k-means can get stuck in a local minimum, so you may want to run a few or more trials to get better results.
	/// The trial with the lowest variance is picked.
	#[arg(short = 'n', long, default_value_t = 3)]
	pub trials: u32,

	/// The maximum number of iterations for each k-means trial
	#[arg(short = 'i', long, default_value_t = 10)]
	pub max_iter: u32,

	/// The threshold number used to determine k-means convergence
	///
	/// A trial stops once its centers move by at most this much in total.
	/// The default of 0.0 only stops early once the centers no longer move at all.
	#[arg(short = 'e', long, default_value_t = 0.0, value_parser = parse_valid_convergence)]
	pub convergence_threshold: f32,

	/// The maximum image size, in number of pixels, before a thumbnail is created
	///
	/// This option is intended for reducing the time needed for large images,
	/// at the cost of some color accuracy.
	#[arg(short = 'p', long, default_value_t = u32::MAX)]
	pub max_pixels: u32,

	/// The seed value used for the random number generator
	///
	/// If not provided, the seed is taken from the current time.
	#[arg(long)]
	pub seed: Option<u64>,

	/// Show the palette with the saturation and lightness boosts applied
	#[arg(long)]
	pub overlay: bool,

	/// Saturation boost for --overlay, in [0, 100]
	///
	/// 50 leaves saturation unchanged, lower values mute and higher values intensify.
	#[arg(long, default_value_t = 50, value_parser = parse_boost)]
	pub saturation_boost: u8,

	/// Lightness boost for --overlay, in [0, 100]
	///
	/// 50 leaves lightness unchanged, lower values darken and higher values brighten.
	#[arg(long, default_value_t = 50, value_parser = parse_boost)]
	pub lightness_boost: u8,

	/// Randomly reorder the colors before printing and saving
	#[arg(long)]
	pub shuffle: bool,

	/// Save the image together with its palette to this path
	///
	/// The image format is chosen from the file extension.
	#[arg(long)]
	pub save: Option<PathBuf>,

	/// The size of each swatch in the --save image, as WIDTHxHEIGHT
	#[arg(long, default_value = "96x96", value_parser = parse_swatch_size)]
	pub swatch_size: CompositeLayout,

	/// Save the image with every pixel replaced by its cluster color to this path
	#[arg(long)]
	pub poster: Option<PathBuf>,

	/// Write the palette to a .flclr file at this path
	#[arg(long)]
	pub export: Option<PathBuf>,

	/// Print additional information, such as timings and the number of k-means iterations
	#[arg(short, long)]
	pub verbose: bool,
}

impl Options {
	/// The overlay parameters from the boost options
	pub fn overlay_params(&self) -> OverlayParams {
		OverlayParams {
			saturation_boost: self.saturation_boost,
			lightness_boost: self.lightness_boost,
		}
	}
}

/// Parse a float value and ensure it in the provided, valid range
fn parse_float_in_range<T>(s: &str, range: impl RangeBounds<T> + Debug) -> Result<T, String>
where
	T: FromStr<Err = ParseFloatError> + Display + PartialOrd,
{
	let value: T = s.parse().map_err(|e| format!("{e}"))?;
	if range.contains(&value) {
		Ok(value)
	} else {
		Err(format!("{value} is not in {range:?}"))
	}
}

/// Parse the convergence number and ensure it is >= `0.0`
fn parse_valid_convergence(s: &str) -> Result<f32, String> {
	parse_float_in_range(s, 0.0..)
}

/// Parse a boost value and ensure it is in `0..=BOOST_MAX`
fn parse_boost(s: &str) -> Result<u8, String> {
	let value: u8 = s.parse().map_err(|e| format!("{e}"))?;
	if value <= BOOST_MAX {
		Ok(value)
	} else {
		Err(format!("{value} is not in 0..={BOOST_MAX}"))
	}
}

/// Parse a swatch size of the form `WIDTHxHEIGHT`, both nonzero
fn parse_swatch_size(s: &str) -> Result<CompositeLayout, String> {
	let (width, height) = s
		.split_once(['x', 'X'])
		.ok_or_else(|| format!("expected WIDTHxHEIGHT, but got {s}"))?;

	let parse = |v: &str| match v.trim().parse::<u32>() {
		Ok(0) => Err("swatch dimensions must be nonzero".to_owned()),
		Ok(v) => Ok(v),
		Err(e) => Err(format!("{e}")),
	};

	Ok(CompositeLayout {
		swatch_width: parse(width)?,
		swatch_height: parse(height)?,
	})
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn cli_is_well_formed() {
		Options::command().debug_assert();
	}

	#[test]
	fn defaults() {
		let options = Options::try_parse_from(["hexad", "image.png"]).unwrap();
		assert_eq!(options.image, Some(PathBuf::from("image.png")));
		assert_eq!(options.k, None);
		assert_eq!(options.trials, 3);
		assert_eq!(options.max_iter, 10);
		assert_eq!(options.overlay_params(), OverlayParams::default());
		assert_eq!(options.swatch_size, CompositeLayout::default());
	}

	#[test]
	fn image_or_import_is_required() {
		assert!(Options::try_parse_from(["hexad"]).is_err());
		assert!(Options::try_parse_from(["hexad", "--import", "palette.flclr"]).is_ok());
		assert!(Options::try_parse_from(["hexad", "image.png", "--import", "palette.flclr"]).is_err());
	}

	#[test]
	fn builtin_replaces_the_image() {
		let options = Options::try_parse_from(["hexad", "--builtin", "2"]).unwrap();
		assert_eq!(options.builtin, Some(2));
		assert_eq!(options.image, None);

		assert!(Options::try_parse_from(["hexad", "--builtin", "0"]).is_err());
		assert!(Options::try_parse_from(["hexad", "--builtin", "4"]).is_err());
		assert!(Options::try_parse_from(["hexad", "image.png", "--builtin", "1"]).is_err());
		assert!(Options::try_parse_from(["hexad", "--import", "palette.flclr", "--builtin", "1"]).is_err());
	}

	#[test]
	fn import_rejects_outputs_that_need_an_image() {
		for flag in ["--save", "--poster", "--export"] {
			assert!(Options::try_parse_from(["hexad", "--import", "palette.flclr", flag, "out"]).is_err());
		}
	}

	#[test]
	fn k_is_range_checked() {
		assert!(Options::try_parse_from(["hexad", "image.png", "-k", "3"]).is_err());
		assert!(Options::try_parse_from(["hexad", "image.png", "-k", "17"]).is_err());
		let options = Options::try_parse_from(["hexad", "image.png", "-k", "16"]).unwrap();
		assert_eq!(options.k, Some(16));
	}

	#[test]
	fn boosts_are_range_checked() {
		assert!(parse_boost("100").is_ok());
		assert!(parse_boost("101").is_err());
		assert!(parse_boost("-1").is_err());
	}

	#[test]
	fn swatch_sizes() {
		assert_eq!(
			parse_swatch_size("40x30").unwrap(),
			CompositeLayout { swatch_width: 40, swatch_height: 30 }
		);
		assert!(parse_swatch_size("40").is_err());
		assert!(parse_swatch_size("0x30").is_err());
		assert!(parse_swatch_size("40xabc").is_err());
	}

	#[test]
	fn negative_convergence_is_rejected() {
		assert!(parse_valid_convergence("-0.5").is_err());
		assert!(parse_valid_convergence("0.01").is_ok());
	}
}
