//! Reading and writing `.flclr` palette files
//!
//! A file holds one record per swatch, in display order. Each record is
//! three little-endian `f32` values followed by a reserved zero byte:
//!
//! | offset | value                         |
//! |--------|-------------------------------|
//! | 0      | hue, normalized to `0.0..1.0` |
//! | 4      | saturation ^ 0.2              |
//! | 8      | lightness ^ 1.5               |
//! | 12     | reserved, always 0            |
//!
//! The power curves are part of the format and are separate from the interactive overlay.

use crate::{reduce::PALETTE_SIZE, Error, Palette, Result};
use palette::{FromColor, Hsl, RgbHue, Srgb};
use std::path::Path;

/// Exponent applied to saturation on export
pub const SATURATION_CURVE: f32 = 0.2;

/// Exponent applied to lightness on export
pub const LIGHTNESS_CURVE: f32 = 1.5;

/// Size of one swatch record in bytes
pub const RECORD_LEN: usize = 3 * std::mem::size_of::<f32>() + 1;

/// Size of a whole export file in bytes
pub const FILE_LEN: usize = PALETTE_SIZE * RECORD_LEN;

/// The exported form of a single swatch, with the power curves applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HslRecord {
	/// Hue in `0.0..1.0`
	pub hue: f32,
	/// HSL saturation raised to [`SATURATION_CURVE`]
	pub saturation: f32,
	/// HSL lightness raised to [`LIGHTNESS_CURVE`]
	pub lightness: f32,
}

impl HslRecord {
	/// Convert a color into its exported form
	#[must_use]
	pub fn from_srgb(color: Srgb<u8>) -> Self {
		let hsl: Hsl = Hsl::from_color(color.into_format::<f32>());
		Self {
			hue: hsl.hue.into_positive_degrees() / 360.0,
			saturation: hsl.saturation.clamp(0.0, 1.0).powf(SATURATION_CURVE),
			lightness: hsl.lightness.clamp(0.0, 1.0).powf(LIGHTNESS_CURVE),
		}
	}

	/// Undo the power curves and convert back to a color
	#[must_use]
	pub fn to_srgb(self) -> Srgb<u8> {
		let hsl: Hsl = Hsl::new(
			RgbHue::from_degrees(self.hue * 360.0),
			self.saturation.powf(SATURATION_CURVE.recip()),
			self.lightness.powf(LIGHTNESS_CURVE.recip()),
		);
		Srgb::<f32>::from_color(hsl).into_format()
	}

	/// Append this record to `buf`
	fn write_to(self, buf: &mut Vec<u8>) {
		buf.extend_from_slice(&self.hue.to_le_bytes());
		buf.extend_from_slice(&self.saturation.to_le_bytes());
		buf.extend_from_slice(&self.lightness.to_le_bytes());
		buf.push(0);
	}

	/// Parse a single record of exactly [`RECORD_LEN`] bytes
	fn read_from(record: &[u8], index: usize) -> Result<Self> {
		/// Read the little-endian `f32` starting at `offset`
		fn read_f32(record: &[u8], offset: usize) -> f32 {
			let mut bytes = [0; 4];
			bytes.copy_from_slice(&record[offset..offset + 4]);
			f32::from_le_bytes(bytes)
		}

		let reserved = record[RECORD_LEN - 1];
		if reserved != 0 {
			return Err(Error::InvalidExport(format!(
				"record {index} has a nonzero reserved byte ({reserved})"
			)));
		}

		let record = Self {
			hue: read_f32(record, 0),
			saturation: read_f32(record, 4),
			lightness: read_f32(record, 8),
		};

		if [record.hue, record.saturation, record.lightness]
			.iter()
			.all(|value| (0.0..=1.0).contains(value))
		{
			Ok(record)
		} else {
			Err(Error::InvalidExport(format!("record {index} has a value outside of 0..=1")))
		}
	}
}

/// Encode a palette into the bytes of an export file
#[must_use]
pub fn encode(palette: &Palette) -> Vec<u8> {
	let mut buf = Vec::with_capacity(FILE_LEN);
	for &color in palette.colors() {
		HslRecord::from_srgb(color).write_to(&mut buf);
	}
	buf
}

/// Decode the bytes of an export file
///
/// # Errors
/// Returns [`Error::InvalidExport`] if the data has the wrong length,
/// a reserved byte is not zero, or a value is outside of `0.0..=1.0`.
pub fn decode(bytes: &[u8]) -> Result<[HslRecord; PALETTE_SIZE]> {
	if bytes.len() != FILE_LEN {
		return Err(Error::InvalidExport(format!(
			"expected {FILE_LEN} bytes, but got {}",
			bytes.len()
		)));
	}

	let records = bytes
		.chunks_exact(RECORD_LEN)
		.enumerate()
		.map(|(i, record)| HslRecord::read_from(record, i))
		.collect::<Result<Vec<_>>>()?;

	records
		.try_into()
		.map_err(|_| Error::InvalidExport("wrong number of records".to_owned()))
}

/// Convert decoded records back into a palette
#[must_use]
pub fn to_palette(records: &[HslRecord; PALETTE_SIZE]) -> Palette {
	Palette::new(records.map(HslRecord::to_srgb))
}

/// Write a palette to an export file
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be written.
pub fn write(path: impl AsRef<Path>, palette: &Palette) -> Result<()> {
	let path = path.as_ref();
	std::fs::write(path, encode(palette)).map_err(|e| Error::io(path, e))?;
	tracing::debug!(path = %path.display(), "exported palette");
	Ok(())
}

/// Read the records of an export file
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be read, or [`Error::InvalidExport`] if it is malformed.
pub fn read(path: impl AsRef<Path>) -> Result<[HslRecord; PALETTE_SIZE]> {
	let path = path.as_ref();
	let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
	decode(&bytes)
}
