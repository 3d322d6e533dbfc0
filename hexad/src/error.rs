//! Error cases for every stage of palette generation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a palette request.
///
/// No partial palette is ever produced alongside one of these.
#[derive(Error, Debug)]
pub enum Error {
	/// The image file could not be read or decoded
	#[error("failed to load the image {}: {source}", path.display())]
	Decode {
		/// Path of the image
		path: PathBuf,
		/// Underlying decoder error
		#[source]
		source: image::ImageError,
	},

	/// The image has a width or height of zero
	#[error("the image has no pixels")]
	EmptyImage,

	/// The number of clusters does not fit the samples or the allowed range
	#[error("cannot cluster: {0}")]
	Clustering(String),

	/// Too few clusters to reduce down to the six swatches plus any skipped extremes
	#[error("k = {k} is too small, at least {required} clusters are needed")]
	InsufficientClusters {
		/// The requested number of clusters
		k: usize,
		/// The minimum number of clusters for the current flags
		required: usize,
	},

	/// Reading or writing a file failed
	#[error("failed to access {}: {source}", path.display())]
	Io {
		/// Path of the file
		path: PathBuf,
		/// Underlying io error
		#[source]
		source: std::io::Error,
	},

	/// A palette export file is malformed
	#[error("invalid palette export: {0}")]
	InvalidExport(String),
}

impl Error {
	/// Wrap an io error with the path it happened on
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io { path: path.into(), source }
	}

	/// Wrap an image encoding error as an io error with the path it happened on
	pub fn image_io(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
		let source = match source {
			image::ImageError::IoError(e) => e,
			other => std::io::Error::new(std::io::ErrorKind::Other, other),
		};
		Self::io(path, source)
	}
}

/// Result alias for this crate
pub type Result<T, E = Error> = std::result::Result<T, E>;
