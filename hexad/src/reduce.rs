//! Collapses the k cluster centers down to the swatches that will be displayed
//!
//! Each round finds the two most similar centers and drops one of them,
//! so near-duplicate colors are merged away first and the most distinct colors survive.
//! Which member of the pair is dropped alternates from round to round:
//! the second member on even rounds and the first member on odd rounds.

use crate::{kmeans::squared_distance, Error, Result};
use palette::Srgb;

/// The number of swatches in a palette
pub const PALETTE_SIZE: usize = 6;

/// Flags that reserve an extra center at either end of the brightness order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReduceOptions {
	/// Keep one extra center so the darkest one can be left out of the palette
	pub skip_darkest: bool,
	/// Keep one extra center so the lightest one can be left out of the palette
	pub skip_lightest: bool,
}

impl ReduceOptions {
	/// The number of extra centers kept beyond [`PALETTE_SIZE`]
	#[must_use]
	pub const fn extra(self) -> usize {
		self.skip_darkest as usize + self.skip_lightest as usize
	}

	/// The number of centers left after reduction, and so the minimum legal k
	#[must_use]
	pub const fn required_clusters(self) -> usize {
		PALETTE_SIZE + self.extra()
	}
}

/// A record of a single reduction round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elimination {
	/// Indices of the closest pair, with `pair.0 < pair.1`
	pub pair: (usize, usize),
	/// Index of the center that was removed, one of `pair`
	pub dropped: usize,
	/// Euclidean distance between the pair
	pub distance: f32,
}

/// Find the two closest centers.
///
/// Exact ties go to the pair that comes first in `(a, b)` order.
/// Returns `None` if there are fewer than two centers.
#[must_use]
pub fn closest_pair(centers: &[Srgb]) -> Option<(usize, usize, f32)> {
	let mut closest = None;
	let mut min_dist = f32::INFINITY;
	for a in 0..centers.len() {
		for b in (a + 1)..centers.len() {
			let dist = squared_distance(centers[a], centers[b]);
			if closest.is_none() || dist < min_dist {
				min_dist = dist;
				closest = Some((a, b));
			}
		}
	}

	closest.map(|(a, b)| (a, b, min_dist.sqrt()))
}

/// Run one reduction round, removing a member of the closest pair.
///
/// `round` selects the member: the second on even rounds, the first on odd rounds.
/// Returns `None` and leaves `centers` untouched if there are fewer than two centers.
pub fn eliminate(centers: &mut Vec<Srgb>, round: usize) -> Option<Elimination> {
	let (a, b, distance) = closest_pair(centers)?;
	let dropped = if round % 2 == 1 { a } else { b };
	centers.remove(dropped);
	Some(Elimination { pair: (a, b), dropped, distance })
}

/// Reduce `centers` to exactly `options.required_clusters()` centers.
///
/// # Errors
/// Returns [`Error::InsufficientClusters`] if there are fewer centers than that to begin with.
pub fn reduce(mut centers: Vec<Srgb>, options: ReduceOptions) -> Result<Vec<Srgb>> {
	let required = options.required_clusters();
	if centers.len() < required {
		return Err(Error::InsufficientClusters { k: centers.len(), required });
	}

	let rounds = centers.len() - required;
	for round in 0..rounds {
		let Some(Elimination { pair: (a, b), dropped, distance }) = eliminate(&mut centers, round) else {
			break;
		};
		tracing::trace!(round, a, b, dropped, distance, remaining = centers.len(), "eliminated center");
	}

	debug_assert_eq!(centers.len(), required);
	Ok(centers)
}
