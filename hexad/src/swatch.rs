//! The six color palette handed to callers

use crate::reduce::PALETTE_SIZE;
use palette::Srgb;
use rand::{seq::SliceRandom, Rng};
use std::fmt::{self, Display};

/// Exactly [`PALETTE_SIZE`] sRGB colors in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette([Srgb<u8>; PALETTE_SIZE]);

impl Palette {
	/// Create a palette from colors in display order
	#[must_use]
	pub const fn new(colors: [Srgb<u8>; PALETTE_SIZE]) -> Self {
		Self(colors)
	}

	/// The colors in display order
	#[must_use]
	pub const fn colors(&self) -> &[Srgb<u8>; PALETTE_SIZE] {
		&self.0
	}

	/// Uppercase `#RRGGBB` codes in display order
	#[must_use]
	pub fn hex_codes(&self) -> Vec<String> {
		self.0.iter().map(|&color| hex(color)).collect()
	}

	/// Randomly reorder the colors
	pub fn shuffle(&mut self, rng: &mut impl Rng) {
		self.0.shuffle(rng);
	}

	/// Apply `f` to every color, keeping the order
	#[must_use]
	pub fn map(&self, f: impl FnMut(Srgb<u8>) -> Srgb<u8>) -> Self {
		Self(self.0.map(f))
	}
}

impl From<[Srgb<u8>; PALETTE_SIZE]> for Palette {
	fn from(colors: [Srgb<u8>; PALETTE_SIZE]) -> Self {
		Self(colors)
	}
}

impl Display for Palette {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for (i, &color) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(" ")?;
			}
			write!(f, "{}", hex(color))?;
		}
		Ok(())
	}
}

/// Format a color as an uppercase `#RRGGBB` code
#[must_use]
pub fn hex(color: Srgb<u8>) -> String {
	format!("#{color:X}")
}
