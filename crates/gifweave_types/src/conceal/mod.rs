//! Concealment pipelines.
//!
//! Embedding shapes the payload through up to three layers and then spends
//! the result on a colourmap ordering:
//!
//! ```text
//! payload bytes -> static text code (or identity)
//!               -> 1-bit cipher feedback (password only)
//!               -> bit sink, '1' terminator appended
//!               -> permutation of the GIF's unique colours
//!               -> stream rewrite with pixel indices re-mapped
//! ```
//!
//! Extraction runs the mirror image: decode the ordering to an integer,
//! strip the terminator, feed the bits through cipher feedback and the
//! text decoder.
//!
//! A [`Concealer`] holds the per-invocation state (flags and key material);
//! nothing is carried between runs, so one context can embed, extract and
//! measure in any sequence.

pub mod bits;
pub mod codec;

use std::fmt;
use std::io::{Read, Write};

use log::info;
use thiserror::Error;

use crate::cipher::KeyMaterial;
use crate::file::GifError;
use crate::file::gif::{GifInfo, Transcoder, encode};
use crate::huffman::HuffmanTable;

use bits::BitSink;

/// Errors from the concealment pipelines.
#[derive(Debug, Error)]
pub enum ConcealError {
	/// GIF parse or rewrite failure
	#[error(transparent)]
	Gif(#[from] GifError),

	/// The message does not fit the colourmap's permutation space
	#[error(
		"message exceeded available space by approximately {:.2}%",
		excess_percent(.message_bits, .capacity_bits)
	)]
	CapacityExceeded {
		/// Bits in the packed message, terminator included
		message_bits: usize,
		/// Bit length of the largest value the colourmap can carry
		capacity_bits: usize,
	},

	/// The colourmap has one unique colour, so no ordering can carry
	/// information
	#[error("GIF file has no storage space")]
	NoStorageSpace,

	/// A permutation value at or beyond `N!`
	#[error("permutation value out of range ({remainder_bits} bits left over)")]
	ValueOutOfRange {
		/// Bits remaining after consuming every factoradic digit
		remainder_bits: usize,
	},

	/// IO error
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

fn excess_percent(message_bits: &usize, capacity_bits: &usize) -> f64 {
	(*message_bits as f64 / *capacity_bits as f64 - 1.0) * 100.0
}

/// Pipeline switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
	/// Compress the payload with the static text code.
	pub compress: bool,

	/// Order colours by plain RGB even when a password is given,
	/// matching gifshuffle 1.0 output.
	pub legacy_order: bool,
}

/// User-visible storage capacity of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
	/// Guaranteed payload bits, the terminator bit already reserved.
	pub bits: usize,
	/// The same capacity in whole bytes.
	pub bytes: usize,
}

impl fmt::Display for Capacity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "File has storage capacity of {} bits ({} bytes)", self.bits, self.bytes)
	}
}

/// Outcome of a successful embed.
#[derive(Debug, Clone, Copy)]
pub struct EmbedReport {
	/// Bits packed into the ordering, terminator included.
	pub message_bits: usize,
	/// Bit length of the largest value the colourmap can carry.
	pub capacity_bits: usize,
}

impl EmbedReport {
	/// Fraction of the available space the message used, in percent.
	pub fn space_used_percent(&self) -> f64 {
		self.message_bits as f64 / self.capacity_bits as f64 * 100.0
	}
}

/// Measures the covert capacity of a GIF stream.
pub fn capacity<R: Read>(input: &mut R) -> Result<Capacity, ConcealError> {
	let gi = GifInfo::from_reader(input)?;
	let bits = codec::capacity_bits(&gi);

	Ok(Capacity {
		bits,
		bytes: bits / 8,
	})
}

/// A configured concealment context: pipeline options plus the key material
/// derived from an optional password.
#[derive(Debug)]
pub struct Concealer {
	options: Options,
	key: Option<KeyMaterial>,
}

impl Concealer {
	/// Creates a context, deriving key material when a password is given.
	pub fn new(options: Options, password: Option<&str>) -> Self {
		Self {
			options,
			key: password.map(KeyMaterial::from_password),
		}
	}

	/// The key that orders colours: none in legacy mode, where ordering is
	/// plain RGB regardless of the password.
	fn ordering_key(&self) -> Option<&KeyMaterial> {
		if self.options.legacy_order {
			None
		} else {
			self.key.as_ref()
		}
	}

	/// The bits of one payload byte under the current compression setting.
	fn symbol(&self, byte: u8) -> (u32, u8) {
		if self.options.compress {
			HuffmanTable::shared().code(byte)
		} else {
			(u32::from(byte), 8)
		}
	}

	/// Conceals `message` in the GIF stream `input`, writing the rewritten
	/// stream to `output`.
	pub fn embed<M: Read, R: Read, W: Write>(
		&self,
		message: &mut M,
		input: &mut R,
		output: &mut W,
	) -> Result<EmbedReport, ConcealError> {
		// Shape the whole payload into the permutation value first; the
		// GIF is not touched until the message is known to be packable.
		let mut sink = BitSink::new();
		let mut cfb = self.key.as_ref().map(KeyMaterial::feedback);
		let mut buf = [0u8; 4096];

		loop {
			let nread = message.read(&mut buf)?;
			if nread == 0 {
				break;
			}

			for &byte in &buf[..nread] {
				let (code, len) = self.symbol(byte);
				for j in (0..len).rev() {
					let bit = (code >> j) & 1 != 0;
					let bit = match cfb.as_mut() {
						Some(f) => f.encrypt_bit(bit),
						None => bit,
					};
					sink.push(bit);
				}
			}
		}

		let (mut value, message_bits) = sink.finish();

		let mut gi = GifInfo::from_reader(input)?;
		let max = codec::max_storage(&gi);
		let capacity_bits = max.high_bit();

		if message_bits > capacity_bits || value > max {
			if capacity_bits == 0 {
				return Err(ConcealError::NoStorageSpace);
			}
			return Err(ConcealError::CapacityExceeded {
				message_bits,
				capacity_bits,
			});
		}

		codec::encode(&mut gi, &mut value, self.ordering_key())?;

		let mut tr = Transcoder::new();
		encode::rewrite_stream(&gi, input, output, &mut tr)?;

		let report = EmbedReport {
			message_bits,
			capacity_bits,
		};
		info!(
			"message used approximately {:.2}% of available space",
			report.space_used_percent()
		);

		Ok(report)
	}

	/// Recovers a concealed message from the GIF stream `input`, writing
	/// the payload bytes to `output`.
	pub fn extract<R: Read, W: Write>(
		&self,
		input: &mut R,
		output: &mut W,
	) -> Result<(), ConcealError> {
		let gi = GifInfo::from_reader(input)?;
		let value = codec::decode(&gi, self.ordering_key());

		let mut cfb = self.key.as_ref().map(KeyMaterial::feedback);
		let mut decoder = HuffmanTable::shared().decoder();
		let mut acc = 0u8;
		let mut acc_bits = 0usize;

		for bit in bits::payload_bits(&value) {
			let bit = match cfb.as_mut() {
				Some(f) => f.decrypt_bit(bit),
				None => bit,
			};

			if self.options.compress {
				if let Some(byte) = decoder.push_bit(bit) {
					output.write_all(&[byte])?;
				}
			} else {
				acc = (acc << 1) | u8::from(bit);
				acc_bits += 1;
				if acc_bits == 8 {
					output.write_all(&[acc])?;
					acc = 0;
					acc_bits = 0;
				}
			}
		}

		// Bits short of a full symbol are padding beyond the terminator
		Ok(())
	}
}
