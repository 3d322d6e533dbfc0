//! Generate a six color palette from an image.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
	clippy::pedantic,
	clippy::cargo,
	clippy::use_debug,
	clippy::dbg_macro,
	clippy::todo,
	clippy::unimplemented,
	clippy::unwrap_used,
	clippy::unwrap_in_result,
	clippy::unneeded_field_pattern,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::unnecessary_self_imports,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::string_slice,
	missing_docs,
	clippy::missing_docs_in_private_items,
	rustdoc::all,
	clippy::float_cmp_const,
	clippy::lossy_float_literal
)]
#![allow(clippy::doc_markdown, clippy::module_name_repetitions, clippy::unreadable_literal)]

mod cli;

#[allow(clippy::wildcard_imports)]
use cli::*;

use std::{
	path::{Path, PathBuf},
	process::ExitCode,
	time::Instant,
};

use clap::Parser;
use colored::Colorize;
use image::{
	error::{ParameterError, ParameterErrorKind},
	DynamicImage, ImageError,
};
use hexad::{export, OverlayState, Palette, PaletteOptions, SampleSet};
use palette::Srgb;
use tracing_subscriber::EnvFilter;

/// Record the running time of a function and log the elapsed time
macro_rules! time {
	($name: literal, $func_call: expr) => {{
		let start = Instant::now();
		let result = $func_call;
		tracing::info!("{} took {}ms", $name, start.elapsed().as_millis());
		result
	}};
}

fn main() -> ExitCode {
	let options = Options::parse();
	init_logging(options.verbose);

	let result = if let Some(path) = &options.import {
		import_and_print_palette(path, &options)
	} else {
		generate_and_print_palette(&options)
	};

	// Returning Result<_> uses Debug printing instead of Display
	if let Err(e) = result {
		eprintln!("{e}");
		ExitCode::FAILURE
	} else {
		ExitCode::SUCCESS
	}
}

/// Install the log subscriber, reading the filter from `RUST_LOG` if set
fn init_logging(verbose: bool) {
	let default = if verbose { "info,hexad=debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

/// Load an image, generate its palette, and print and save the result using the given options
fn generate_and_print_palette(options: &Options) -> hexad::Result<()> {
	let seed = options.seed.unwrap_or_else(hexad::time_seed);
	tracing::info!(seed, "seeded random number generator");
	let mut rng = hexad::seeded_rng(seed);

	// Input
	let source = time!("Image loading", load_source(options))?;
	let thumbnail = time!("Image thumbnail", hexad::thumbnail(source.clone(), options.max_pixels));
	let samples = SampleSet::from_image(&thumbnail)?;

	// Processing
	let palette_options = palette_options(options, &mut rng);
	tracing::info!(k = palette_options.k, samples = samples.len(), "generating palette");
	let generated = time!(
		"Palette generation",
		hexad::generate(&samples, &palette_options, &mut rng)
	)?;

	let mut state = OverlayState::new(generated.palette);
	if options.shuffle {
		state.shuffle(&mut rng);
	}
	if options.overlay {
		state.enable(options.overlay_params());
	}

	// Output
	print_palette(state.displayed(), options);

	if let Some(path) = &options.save {
		time!(
			"Saving composite",
			hexad::save_composite(path, &source, state.displayed(), options.swatch_size)
		)?;
	}

	if let Some(path) = &options.poster {
		if let Some(poster) = generated.clusters.posterize(&samples) {
			poster.save(path).map_err(|e| hexad::Error::image_io(path, e))?;
		}
	}

	if let Some(path) = &options.export {
		// overlays are display-only, so the export always holds the reference colors
		export::write(path, state.reference())?;
	}

	Ok(())
}

/// The bundled default images, in `--builtin` order
#[allow(clippy::cast_lossless)]
const BUILTIN: [&[u8]; BUILTIN_IMAGES as usize] = [
	include_bytes!("../assets/default1.png"),
	include_bytes!("../assets/default2.png"),
	include_bytes!("../assets/default3.png"),
];

/// Decode the bundled default image with the given 1-based index
fn builtin_image(index: u8) -> hexad::Result<DynamicImage> {
	let path = PathBuf::from(format!("<builtin {index}>"));
	let bytes = usize::from(index)
		.checked_sub(1)
		.and_then(|i| BUILTIN.get(i))
		.ok_or_else(|| hexad::Error::Decode {
			path: path.clone(),
			source: ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::Generic(format!(
				"there are only {BUILTIN_IMAGES} builtin images"
			)))),
		})?;

	image::load_from_memory(bytes).map_err(|source| hexad::Error::Decode { path, source })
}

/// Decode the image file or bundled image chosen on the command line
fn load_source(options: &Options) -> hexad::Result<DynamicImage> {
	match (&options.image, options.builtin) {
		(Some(path), _) => hexad::load_image(path),
		(None, Some(index)) => builtin_image(index),
		(None, None) => unreachable!("clap requires an image unless --import or --builtin is given"),
	}
}

/// Read an exported palette and print it using the given options
fn import_and_print_palette(path: &Path, options: &Options) -> hexad::Result<()> {
	let palette = export::to_palette(&export::read(path)?);

	let mut state = OverlayState::new(palette);
	if options.shuffle {
		state.shuffle(&mut hexad::seeded_rng(options.seed.unwrap_or_else(hexad::time_seed)));
	}
	if options.overlay {
		state.enable(options.overlay_params());
	}

	print_palette(state.displayed(), options);

	Ok(())
}

/// Convert the CLI options into palette generation options
fn palette_options(options: &Options, rng: &mut hexad::PaletteRng) -> PaletteOptions {
	PaletteOptions {
		k: options.k.unwrap_or_else(|| hexad::random_k(rng)),
		trials: options.trials,
		max_iter: options.max_iter,
		convergence_threshold: options.convergence_threshold,
		skip_darkest: options.skip_darkest,
		skip_lightest: options.skip_lightest,
	}
}

/// Format a single color according to the output format
fn format_color(color: Srgb<u8>, output: FormatOutput) -> String {
	match output {
		FormatOutput::Hex => hexad::hex(color),
		FormatOutput::Rgb => format!("({},{},{})", color.red, color.green, color.blue),
		FormatOutput::Swatch => "   ".to_owned(),
	}
}

/// Format, colorize, and join the text for all colors
fn format_palette(palette: &Palette, options: &Options) -> String {
	let delimiter = match options.output {
		FormatOutput::Swatch => "",
		FormatOutput::Hex | FormatOutput::Rgb => " ",
	};

	palette
		.colors()
		.iter()
		.map(|&color| {
			let text = format_color(color, options.output);
			let Srgb { red, green, blue, .. } = color;
			match (options.output, options.colorize) {
				(FormatOutput::Swatch, _) | (_, Some(ColorizeOutput::Bg)) => {
					text.on_truecolor(red, green, blue).to_string()
				}
				(_, Some(ColorizeOutput::Fg)) => text.truecolor(red, green, blue).to_string(),
				(_, None) => text,
			}
		})
		.collect::<Vec<_>>()
		.join(delimiter)
}

/// Print the given palette based off the provided options
fn print_palette(palette: &Palette, options: &Options) {
	println!("{}", format_palette(palette, options));
}
