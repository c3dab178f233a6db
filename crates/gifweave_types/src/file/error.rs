//! Error types for GIF stream parsing and rewriting.

use thiserror::Error;

/// Errors that can occur while parsing or rewriting a GIF stream.
#[derive(Debug, Error)]
pub enum GifError {
	/// The stream does not start with the GIF signature
	#[error("not a GIF file")]
	NotGif,

	/// The screen descriptor has no global colourmap flag
	#[error("GIF file does not have a global colourmap")]
	NoGlobalColourMap,

	/// A block started with something other than an image separator,
	/// extension introducer, or trailer
	#[error("unknown block introducer 0x{0:02x}")]
	UnknownBlock(u8),

	/// An image descriptor with a zero dimension
	#[error("illegal image dimensions ({width} x {height})")]
	BadDimensions {
		/// Image width from the descriptor
		width: u32,
		/// Image height from the descriptor
		height: u32,
	},

	/// The initial LZW code size is outside the range a GIF can use
	#[error("illegal LZW minimum code size {0}")]
	BadCodeSize(u8),

	/// An LZW table entry chains to itself
	#[error("circular LZW table entry")]
	CircularTableEntry,

	/// The pixel stream decoded to more bytes than the descriptor allows
	#[error("too much image data")]
	TooMuchImageData,

	/// The pixel stream ended before the image was complete
	#[error("incomplete image data")]
	IncompleteImageData,

	/// IO error
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
