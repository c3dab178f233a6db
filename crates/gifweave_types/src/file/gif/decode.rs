//! LZW decompression of GIF image streams.
//!
//! ## Code stream
//!
//! An image's pixel data starts with one byte giving the LZW minimum code
//! size `c`, followed by length-prefixed sub-blocks of packed codes. The
//! decoder starts with `clear = 1 << c`, `end = clear + 1` and a code width
//! of `c + 1` bits, reading bits least significant first within each byte.
//!
//! | Code | Meaning |
//! |---|---|
//! | `< clear` | literal colour index (root) |
//! | `clear` | reset the string table and code width |
//! | `clear + 1` | end of information |
//! | others | table strings, expanded through the prefix chain |
//!
//! The code width grows by one bit whenever the table reaches the current
//! width's capacity, up to 12 bits (4096 entries). A code one past the
//! current table top is the "KwKwK" case and repeats the previous string's
//! first byte.
//!
//! While decoding, framing facts the encoder needs to reproduce the source
//! byte stream are recorded in the shared [`Transcoder`]: the sub-block
//! granularity, the table height at which the source emitted CLEAR, and
//! whether an explicit END code appeared.

use std::io::Read;

use log::warn;

use super::Transcoder;
use crate::file::GifError;

/// Maximum LZW code width.
pub(crate) const MAX_LZW_BITS: usize = 12;

/// String table capacity.
pub(crate) const TABLE_SIZE: usize = 1 << MAX_LZW_BITS;

/// Reads one length-prefixed sub-block into `buf`, recording the stream's
/// packet granularity in the transcoder the first time.
fn read_data_block<R: Read>(
	reader: &mut R,
	buf: &mut [u8],
	tr: &mut Transcoder,
) -> Result<usize, GifError> {
	let mut count = [0u8; 1];
	reader.read_exact(&mut count)?;
	let count = usize::from(count[0]);

	if count > 0 {
		reader.read_exact(&mut buf[..count])?;
	}

	if tr.block_size == 0 {
		tr.block_size = count;
	}

	Ok(count)
}

/// Bit-level reader over an image's data sub-blocks.
///
/// The window keeps the last two bytes of the previous sub-block so a code
/// can straddle a boundary; bits are consumed least significant first.
struct BlockReader<'a, R: Read> {
	reader: &'a mut R,
	buffer: [u8; 280],
	curr_bit: usize,
	last_bit: usize,
	last_byte: usize,
	done: bool,
	zero_block: bool,
}

impl<'a, R: Read> BlockReader<'a, R> {
	fn new(reader: &'a mut R) -> Self {
		Self {
			reader,
			buffer: [0; 280],
			curr_bit: 0,
			last_bit: 0,
			last_byte: 0,
			done: false,
			zero_block: false,
		}
	}

	/// Returns the next `code_size`-bit code, or `None` when the sub-block
	/// series has been consumed without an END code.
	fn next_code(
		&mut self,
		code_size: usize,
		tr: &mut Transcoder,
	) -> Result<Option<usize>, GifError> {
		if self.curr_bit + code_size >= self.last_bit {
			if self.done {
				// Whether this truncates the image is decided by the
				// caller's completeness check
				if self.curr_bit >= self.last_bit {
					warn!("image code stream ran out mid-code");
				}
				return Ok(None);
			}

			// Slide the last two bytes down so a straddling code survives
			if self.last_byte >= 2 {
				self.buffer[0] = self.buffer[self.last_byte - 2];
				self.buffer[1] = self.buffer[self.last_byte - 1];
			}

			let count = read_data_block(self.reader, &mut self.buffer[2..], tr)?;
			self.zero_block = count == 0;
			if count == 0 {
				self.done = true;
			}

			self.last_byte = count + 2;
			self.curr_bit = self.curr_bit + 16 - self.last_bit;
			self.last_bit = self.last_byte * 8;
		}

		let mut code = 0usize;
		for j in 0..code_size {
			let i = self.curr_bit + j;
			if self.buffer[i / 8] & (1 << (i % 8)) != 0 {
				code |= 1 << j;
			}
		}
		self.curr_bit += code_size;

		Ok(Some(code))
	}
}

/// LZW string table and expansion state.
struct LzwDecoder {
	fresh: bool,
	code_size: usize,
	set_code_size: usize,
	max_code: usize,
	max_code_size: usize,
	first_code: usize,
	old_code: usize,
	clear_code: usize,
	end_code: usize,
	prefix: [u16; TABLE_SIZE],
	suffix: [u8; TABLE_SIZE],
	stack: Vec<u8>,
}

impl LzwDecoder {
	fn new(input_code_size: usize) -> Self {
		let clear_code = 1 << input_code_size;
		let mut decoder = Self {
			fresh: true,
			set_code_size: input_code_size,
			code_size: input_code_size + 1,
			clear_code,
			end_code: clear_code + 1,
			max_code_size: clear_code * 2,
			max_code: clear_code + 2,
			first_code: 0,
			old_code: 0,
			prefix: [0; TABLE_SIZE],
			suffix: [0; TABLE_SIZE],
			stack: Vec::with_capacity(2 * TABLE_SIZE),
		};
		decoder.reset_table();
		decoder
	}

	fn reset_table(&mut self) {
		self.prefix.fill(0);
		self.suffix.fill(0);
		for i in 0..self.clear_code {
			self.suffix[i] = i as u8;
		}
	}

	/// Produces the next pixel, or `None` at the end of the image.
	fn read_byte<R: Read>(
		&mut self,
		br: &mut BlockReader<'_, R>,
		tr: &mut Transcoder,
	) -> Result<Option<u8>, GifError> {
		if self.fresh {
			self.fresh = false;
			loop {
				let Some(code) = br.next_code(self.code_size, tr)? else {
					return Ok(None);
				};
				if code == self.clear_code {
					continue;
				}
				self.old_code = code;
				self.first_code = code;
				return Ok(Some(code as u8));
			}
		}

		if let Some(b) = self.stack.pop() {
			return Ok(Some(b));
		}

		while let Some(code) = br.next_code(self.code_size, tr)? {
			if code == self.clear_code {
				if tr.max_code >= tr.clear_code_index {
					tr.clear_code_index = tr.max_code + 1;
				}

				self.reset_table();
				self.code_size = self.set_code_size + 1;
				self.max_code_size = self.clear_code * 2;
				self.max_code = self.clear_code + 2;
				self.stack.clear();

				let Some(code) = br.next_code(self.code_size, tr)? else {
					return Ok(None);
				};
				self.old_code = code;
				self.first_code = code;
				return Ok(Some(code as u8));
			}

			if code == self.end_code {
				tr.use_end_code = true;

				if br.zero_block {
					return Ok(None);
				}

				// Drain the remaining sub-blocks up to the terminator
				let mut scratch = [0u8; 255];
				loop {
					match read_data_block(br.reader, &mut scratch, tr) {
						Ok(0) => break,
						Ok(_) => {}
						Err(_) => {
							warn!("missing end-of-data terminator in image stream");
							break;
						}
					}
				}
				return Ok(None);
			}

			let incode = code;
			let mut code = code;

			if code >= self.max_code {
				// KwKwK: the new string repeats the previous first byte
				self.stack.push(self.first_code as u8);
				code = self.old_code;
			}

			while code >= self.clear_code {
				self.stack.push(self.suffix[code]);
				if code == usize::from(self.prefix[code]) {
					return Err(GifError::CircularTableEntry);
				}
				code = usize::from(self.prefix[code]);
			}

			self.first_code = usize::from(self.suffix[code]);
			self.stack.push(self.suffix[code]);

			let slot = self.max_code;
			if slot < TABLE_SIZE {
				self.prefix[slot] = self.old_code as u16;
				self.suffix[slot] = self.first_code as u8;
				self.max_code += 1;

				if self.max_code >= self.max_code_size && self.max_code_size < TABLE_SIZE {
					self.max_code_size *= 2;
					self.code_size += 1;
				}

				if slot > tr.max_code {
					tr.max_code = slot;
				}
			}

			self.old_code = incode;

			if let Some(b) = self.stack.pop() {
				return Ok(Some(b));
			}
		}

		Ok(None)
	}
}

/// Decodes one image's pixel stream into exactly `size` colour indices.
///
/// `reader` must be positioned at the initial-code-size byte. Framing facts
/// needed for faithful re-encoding accumulate in `tr`.
pub fn decode_image<R: Read>(
	reader: &mut R,
	size: usize,
	tr: &mut Transcoder,
) -> Result<Vec<u8>, GifError> {
	let mut code_size = [0u8; 1];
	reader.read_exact(&mut code_size)?;
	if code_size[0] < 1 || usize::from(code_size[0]) >= MAX_LZW_BITS {
		return Err(GifError::BadCodeSize(code_size[0]));
	}

	let mut decoder = LzwDecoder::new(usize::from(code_size[0]));
	let mut br = BlockReader::new(reader);
	let mut image = vec![0u8; size];
	let mut filled = 0usize;

	while let Some(v) = decoder.read_byte(&mut br, tr)? {
		if filled >= size {
			return Err(GifError::TooMuchImageData);
		}
		image[filled] = v;
		filled += 1;
	}

	if filled < size {
		return Err(GifError::IncompleteImageData);
	}

	Ok(image)
}
