//! Deterministic display order for the reduced centers

use crate::{
	reduce::ReduceOptions,
	Error, Palette, Result,
};
use palette::Srgb;

/// The sum of all channels, used as a cheap brightness measure
#[must_use]
pub fn channel_sum(color: Srgb) -> f32 {
	color.red + color.green + color.blue
}

/// Tolerance for the `f32` error picked up by a `u8 -> f32 -> u8` round trip
const ROUND_TRIP_TOLERANCE: f32 = 1e-3;

/// Convert a center to 8-bit channels, truncating any fractional part
#[must_use]
pub fn truncate_to_u8(color: Srgb) -> Srgb<u8> {
	// clamped to 0.0..=255.0 before the cast
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + ROUND_TRIP_TOLERANCE).min(255.0) as u8;
	Srgb::new(channel(color.red), channel(color.green), channel(color.blue))
}

/// Sort by descending channel sum.
///
/// The sort is stable, so colors with equal sums keep their relative order.
pub fn order(colors: &mut [Srgb]) {
	colors.sort_by(|x, y| f32::total_cmp(&channel_sum(*y), &channel_sum(*x)));
}

/// Read the [`PALETTE_SIZE`](crate::reduce::PALETTE_SIZE) displayed colors out of an ordered set of centers.
///
/// The lightest center is skipped if `skip_lightest` is set.
/// Channels are truncated to 8 bits, see [`truncate_to_u8`].
/// A center kept for `skip_darkest` sits at the end and is not read.
///
/// # Errors
/// Returns [`Error::InsufficientClusters`] if `ordered` has fewer than `options.required_clusters()` colors.
pub fn select(ordered: &[Srgb], options: ReduceOptions) -> Result<Palette> {
	let required = options.required_clusters();
	if ordered.len() < required {
		return Err(Error::InsufficientClusters { k: ordered.len(), required });
	}

	let offset = usize::from(options.skip_lightest);
	let colors = std::array::from_fn(|i| truncate_to_u8(ordered[offset + i]));

	Ok(Palette::new(colors))
}

/// Order the reduced centers and select the displayed colors
///
/// # Errors
/// Returns [`Error::InsufficientClusters`] if there are too few centers for the flags in `options`.
pub fn arrange(mut centers: Vec<Srgb>, options: ReduceOptions) -> Result<Palette> {
	order(&mut centers);
	select(&centers, options)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;

	fn grays(values: &[u8]) -> Vec<Srgb> {
		values.iter().map(|&v| Srgb::new(v, v, v).into_format()).collect()
	}

	#[test]
	fn sorted_by_descending_channel_sum() {
		let mut colors = vec![
			Srgb::new(0.1, 0.2, 0.3),
			Srgb::new(1.0, 1.0, 1.0),
			Srgb::new(0.0, 0.0, 0.0),
			Srgb::new(0.9, 0.0, 0.1),
			Srgb::new(0.3, 0.3, 0.3),
			Srgb::new(0.0, 0.5, 0.0),
		];

		order(&mut colors);

		for pair in colors.windows(2) {
			assert!(channel_sum(pair[0]) >= channel_sum(pair[1]));
		}
		assert_eq!(colors[0], Srgb::new(1.0, 1.0, 1.0));
		assert_eq!(colors[5], Srgb::new(0.0, 0.0, 0.0));
	}

	#[test]
	fn equal_sums_keep_input_order() {
		let input = vec![
			Srgb::new(0.5, 0.0, 0.0),
			Srgb::new(0.0, 0.5, 0.0),
			Srgb::new(0.0, 0.0, 0.5),
			Srgb::new(0.25, 0.25, 0.0),
			Srgb::new(0.0, 0.25, 0.25),
			Srgb::new(0.25, 0.0, 0.25),
		];

		let mut colors = input.clone();
		order(&mut colors);

		assert_eq!(colors, input);
	}

	#[test]
	fn fractional_channels_are_truncated() {
		let color = Srgb::new(127.6 / 255.0, 0.5 / 255.0, 200.9 / 255.0);
		assert_eq!(truncate_to_u8(color), Srgb::new(127, 0, 200));
		assert_eq!(crate::hex(truncate_to_u8(color)), "#7F00C8");

		let mut centers = grays(&[250, 200, 150, 100, 50, 0]);
		centers[1] = color;
		let palette = select(&centers, ReduceOptions::default()).unwrap();
		assert_eq!(palette.hex_codes()[1], "#7F00C8");
	}

	#[test]
	fn whole_channels_survive_conversion() {
		for v in 0..=u8::MAX {
			let color = Srgb::new(v, v, v).into_format::<f32>();
			assert_eq!(truncate_to_u8(color), Srgb::new(v, v, v));
		}
		assert_eq!(truncate_to_u8(Srgb::new(-0.5, 1.5, 0.0)), Srgb::new(0, 255, 0));
	}

	#[test]
	fn select_without_flags_reads_all_six() {
		let palette = select(&grays(&[250, 200, 150, 100, 50, 0]), ReduceOptions::default()).unwrap();
		let expected = [250, 200, 150, 100, 50, 0].map(|v: u8| Srgb::new(v, v, v));
		assert_eq!(palette.colors(), &expected);
	}

	#[test]
	fn select_skips_darkest() {
		let options = ReduceOptions { skip_darkest: true, skip_lightest: false };
		let palette = select(&grays(&[250, 200, 150, 100, 50, 25, 0]), options).unwrap();
		let expected = [250, 200, 150, 100, 50, 25].map(|v: u8| Srgb::new(v, v, v));
		assert_eq!(palette.colors(), &expected);
	}

	#[test]
	fn select_skips_lightest() {
		let options = ReduceOptions { skip_darkest: false, skip_lightest: true };
		let palette = select(&grays(&[250, 200, 150, 100, 50, 25, 0]), options).unwrap();
		let expected = [200, 150, 100, 50, 25, 0].map(|v: u8| Srgb::new(v, v, v));
		assert_eq!(palette.colors(), &expected);
	}

	#[test]
	fn select_skips_both() {
		let options = ReduceOptions { skip_darkest: true, skip_lightest: true };
		let palette = select(&grays(&[250, 200, 150, 100, 50, 25, 10, 0]), options).unwrap();
		let expected = [200, 150, 100, 50, 25, 10].map(|v: u8| Srgb::new(v, v, v));
		assert_eq!(palette.colors(), &expected);
	}

	#[test]
	fn select_rejects_short_input() {
		let options = ReduceOptions { skip_darkest: false, skip_lightest: true };
		assert!(matches!(
			select(&grays(&[250, 200, 150, 100, 50, 0]), options),
			Err(Error::InsufficientClusters { k: 6, required: 7 })
		));
	}

	#[test]
	fn arrange_orders_before_selecting() {
		let palette = arrange(grays(&[50, 250, 0, 150, 200, 100]), ReduceOptions::default()).unwrap();
		let expected = [250, 200, 150, 100, 50, 0].map(|v: u8| Srgb::new(v, v, v));
		assert_eq!(palette.colors(), &expected);
	}
}
