//! A display-only saturation and lightness curve for palettes
//!
//! The overlay never edits a palette in place. [`OverlayState`] keeps the
//! untouched reference palette next to the displayed one, so turning the
//! overlay off restores the exact original colors.

use crate::Palette;
use palette::{FromColor, Hsl, Srgb};
use rand::Rng;

/// The largest boost value
pub const BOOST_MAX: u8 = 100;

/// Divisor turning a boost value into an exponent
pub const BOOST_SCALE: f32 = 50.0;

/// Boost values for the overlay, each in `0..=BOOST_MAX`
///
/// A boost of 50 leaves the component unchanged,
/// lower values mute it and higher values intensify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayParams {
	/// Boost for HSL saturation
	pub saturation_boost: u8,
	/// Boost for HSL lightness
	pub lightness_boost: u8,
}

impl Default for OverlayParams {
	fn default() -> Self {
		Self {
			saturation_boost: 50,
			lightness_boost: 50,
		}
	}
}

impl OverlayParams {
	/// The exponent for a boost value
	#[must_use]
	pub fn exponent(boost: u8) -> f32 {
		f32::from(BOOST_MAX.saturating_sub(boost)) / BOOST_SCALE
	}

	/// The exponent applied to saturation
	#[must_use]
	pub fn saturation_exponent(self) -> f32 {
		Self::exponent(self.saturation_boost)
	}

	/// The exponent applied to lightness
	#[must_use]
	pub fn lightness_exponent(self) -> f32 {
		Self::exponent(self.lightness_boost)
	}
}

/// Raise the saturation and lightness of `color` to the exponents from `params`, keeping its hue
#[must_use]
pub fn overlay_color(color: Srgb<u8>, params: OverlayParams) -> Srgb<u8> {
	let mut hsl: Hsl = Hsl::from_color(color.into_format::<f32>());
	hsl.saturation = hsl.saturation.powf(params.saturation_exponent());
	hsl.lightness = hsl.lightness.powf(params.lightness_exponent());
	Srgb::<f32>::from_color(hsl).into_format()
}

/// Apply the overlay to every color of `palette`
#[must_use]
pub fn apply_overlay(palette: &Palette, params: OverlayParams) -> Palette {
	palette.map(|color| overlay_color(color, params))
}

/// The displayed palette together with its untouched reference
#[derive(Debug, Clone)]
pub struct OverlayState {
	/// The palette as produced by the pipeline
	reference: Palette,
	/// The palette currently shown
	displayed: Palette,
	/// The active overlay, if any
	params: Option<OverlayParams>,
}

impl OverlayState {
	/// Start showing `palette` with the overlay off
	#[must_use]
	pub const fn new(palette: Palette) -> Self {
		Self {
			reference: palette,
			displayed: palette,
			params: None,
		}
	}

	/// The palette currently shown
	#[must_use]
	pub const fn displayed(&self) -> &Palette {
		&self.displayed
	}

	/// The palette without any overlay
	#[must_use]
	pub const fn reference(&self) -> &Palette {
		&self.reference
	}

	/// The active overlay parameters
	#[must_use]
	pub const fn params(&self) -> Option<OverlayParams> {
		self.params
	}

	/// Whether the overlay is on
	#[must_use]
	pub const fn is_enabled(&self) -> bool {
		self.params.is_some()
	}

	/// Turn the overlay on, or change its parameters if already on
	pub fn enable(&mut self, params: OverlayParams) {
		self.displayed = apply_overlay(&self.reference, params);
		self.params = Some(params);
	}

	/// Turn the overlay off, showing the reference palette again
	pub fn disable(&mut self) {
		self.displayed = self.reference;
		self.params = None;
	}

	/// Flip the overlay on or off, returning whether it is now on
	pub fn toggle(&mut self, params: OverlayParams) -> bool {
		if self.is_enabled() {
			self.disable();
		} else {
			self.enable(params);
		}
		self.is_enabled()
	}

	/// Change the parameters, re-applying them only if the overlay is on
	pub fn update(&mut self, params: OverlayParams) {
		if self.is_enabled() {
			self.enable(params);
		}
	}

	/// Show a newly generated palette, keeping the overlay setting
	pub fn replace(&mut self, palette: Palette) {
		self.reference = palette;
		self.refresh();
	}

	/// Randomly reorder the swatches
	pub fn shuffle(&mut self, rng: &mut impl Rng) {
		self.reference.shuffle(rng);
		self.refresh();
	}

	/// Recompute the displayed palette from the reference
	fn refresh(&mut self) {
		self.displayed = match self.params {
			Some(params) => apply_overlay(&self.reference, params),
			None => self.reference,
		};
	}
}
