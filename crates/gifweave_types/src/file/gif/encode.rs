//! LZW compression and stream rewriting.
//!
//! ## Compression
//!
//! Classic block-compression LZW over the prefix-code / next-byte pairs,
//! using open-addressed double hashing: the primary probe is an XOR of the
//! shifted next byte with the current prefix code, the secondary probe is
//! relatively prime to the table size. When the table top reaches the limit
//! recorded by the decoder, a CLEAR code is emitted and the table restarts,
//! so the rewritten image clears at the same point the source did.
//!
//! ## Rewriting
//!
//! [`rewrite_stream`] copies everything after the header byte-for-byte
//! except for three remappings driven by the colourmap cross-index:
//!
//! - the background colour index in the screen descriptor,
//! - the transparency index inside GIF89a graphic-control extensions,
//! - every pixel of images that use the global colourmap, which are
//!   LZW-decoded, re-mapped, and re-encoded.
//!
//! Images with a local colourmap keep their pixels and map untouched.

use std::io::{Read, Write};

use super::decode::{MAX_LZW_BITS, TABLE_SIZE, decode_image};
use super::{GRAPHIC_CONTROL, GifInfo, INTRODUCER_EXTENSION, INTRODUCER_IMAGE, TRAILER, Transcoder};
use crate::file::GifError;

/// Hash table size, sized for 80% occupancy of the code table.
const HASH_SIZE: usize = 5003;

const MASKS: [u32; 17] = [
	0x0000, 0x0001, 0x0003, 0x0007, 0x000f, 0x001f, 0x003f, 0x007f, 0x00ff, 0x01ff, 0x03ff, 0x07ff,
	0x0fff, 0x1fff, 0x3fff, 0x7fff, 0xffff,
];

/// Packs variable-width codes into bytes and bytes into data sub-blocks.
struct CodeWriter<'a, W: Write> {
	writer: &'a mut W,
	block_size: usize,
	packet: [u8; 256],
	packet_len: usize,
	accum: u32,
	accum_bits: usize,
	n_bits: usize,
	init_bits: usize,
	maxcode: usize,
	clear_flag: bool,
}

impl<'a, W: Write> CodeWriter<'a, W> {
	fn new(writer: &'a mut W, init_bits: usize, block_size: usize) -> Self {
		Self {
			writer,
			block_size,
			packet: [0; 256],
			packet_len: 0,
			accum: 0,
			accum_bits: 0,
			n_bits: init_bits,
			init_bits,
			maxcode: (1 << init_bits) - 1,
			clear_flag: false,
		}
	}

	/// Emits one code at the current width, then re-sizes the width if the
	/// table has outgrown it (or a CLEAR reset it).
	fn write_code(&mut self, code: usize, free_ent: usize) -> Result<(), GifError> {
		self.accum &= MASKS[self.accum_bits];
		if self.accum_bits > 0 {
			self.accum |= (code as u32) << self.accum_bits;
		} else {
			self.accum = code as u32;
		}
		self.accum_bits += self.n_bits;

		while self.accum_bits >= 8 {
			self.put_byte((self.accum & 0xff) as u8)?;
			self.accum >>= 8;
			self.accum_bits -= 8;
		}

		if free_ent > self.maxcode || self.clear_flag {
			if self.clear_flag {
				self.n_bits = self.init_bits;
				self.maxcode = (1 << self.n_bits) - 1;
				self.clear_flag = false;
			} else {
				self.n_bits += 1;
				self.maxcode = if self.n_bits == MAX_LZW_BITS {
					1 << MAX_LZW_BITS
				} else {
					(1 << self.n_bits) - 1
				};
			}
		}

		Ok(())
	}

	fn put_byte(&mut self, byte: u8) -> Result<(), GifError> {
		self.packet[self.packet_len] = byte;
		self.packet_len += 1;
		if self.packet_len >= self.block_size {
			self.flush_packet()?;
		}
		Ok(())
	}

	fn flush_packet(&mut self) -> Result<(), GifError> {
		if self.packet_len == 0 {
			return Ok(());
		}
		self.writer.write_all(&[self.packet_len as u8])?;
		self.writer.write_all(&self.packet[..self.packet_len])?;
		self.packet_len = 0;
		Ok(())
	}

	/// Drains the remaining bits and the final partial packet.
	fn finish(mut self) -> Result<(), GifError> {
		while self.accum_bits > 0 {
			self.put_byte((self.accum & 0xff) as u8)?;
			self.accum >>= 8;
			self.accum_bits = self.accum_bits.saturating_sub(8);
		}
		self.flush_packet()
	}
}

/// LZW-compresses `image` and writes the complete image data section:
/// initial code size byte, data sub-blocks, and the zero terminator.
///
/// The transcoder supplies the framing recorded while decoding the source:
/// packet granularity, the table height at which to emit CLEAR, and whether
/// to finish with an END code. Fresh defaults (254 / 4096 / no END) apply
/// when no source has been decoded.
pub fn encode_image<W: Write>(
	image: &[u8],
	bits_per_pixel: usize,
	tr: &Transcoder,
	writer: &mut W,
) -> Result<(), GifError> {
	debug_assert!(!image.is_empty());

	let init_code_size = bits_per_pixel.max(2);
	writer.write_all(&[init_code_size as u8])?;

	compress(init_code_size + 1, image, tr, writer)?;

	writer.write_all(&[0])?;
	Ok(())
}

fn compress<W: Write>(
	init_bits: usize,
	image: &[u8],
	tr: &Transcoder,
	writer: &mut W,
) -> Result<(), GifError> {
	let block_size = if tr.block_size == 0 { 254 } else { tr.block_size };
	let clear_code_index =
		if tr.clear_code_index == 0 { TABLE_SIZE } else { tr.clear_code_index };

	let clear_code = 1 << (init_bits - 1);
	let end_code = clear_code + 1;
	let mut free_ent = clear_code + 2;

	let mut hshift = 8usize;
	let mut fcode = HASH_SIZE;
	while fcode < 65536 {
		hshift -= 1;
		fcode <<= 1;
	}

	let mut htab = vec![-1i64; HASH_SIZE];
	let mut codetab = vec![0u16; HASH_SIZE];

	let mut out = CodeWriter::new(writer, init_bits, block_size);
	out.write_code(clear_code, free_ent)?;

	let mut ent = usize::from(image[0]);

	for &pixel in &image[1..] {
		let c = usize::from(pixel);
		let fcode = ((c as i64) << MAX_LZW_BITS) + ent as i64;
		let mut i = (c << hshift) ^ ent;

		if htab[i] == fcode {
			ent = usize::from(codetab[i]);
			continue;
		}

		if htab[i] >= 0 {
			// Secondary probe, relatively prime to the table size
			let disp = if i == 0 { 1 } else { HASH_SIZE - i };
			let mut found = false;

			loop {
				i = if i >= disp { i - disp } else { i + HASH_SIZE - disp };
				if htab[i] == fcode {
					found = true;
					break;
				}
				if htab[i] <= 0 {
					break;
				}
			}

			if found {
				ent = usize::from(codetab[i]);
				continue;
			}
		}

		out.write_code(ent, free_ent)?;
		ent = c;

		if free_ent < clear_code_index {
			codetab[i] = free_ent as u16;
			free_ent += 1;
			htab[i] = fcode;
		} else {
			// The source cleared its table here; do the same
			htab.fill(-1);
			free_ent = clear_code + 2;
			out.clear_flag = true;
			out.write_code(clear_code, free_ent)?;
		}
	}

	out.write_code(ent, free_ent)?;
	if tr.use_end_code {
		out.write_code(end_code, free_ent)?;
	}

	out.finish()
}

/// Writes the header and permuted colourmap, then filters the remaining
/// blocks of `input` through to `output` with colour indices re-mapped.
pub fn rewrite_stream<R: Read, W: Write>(
	gi: &GifInfo,
	input: &mut R,
	output: &mut W,
	tr: &mut Transcoder,
) -> Result<(), GifError> {
	// Cross-map each original slot to the first slot now holding its colour
	let n = gi.num_colours();
	let mut cidx = vec![0usize; n];
	for (i, orig) in gi.orig_colours().iter().enumerate() {
		cidx[i] = gi.colours().iter().position(|c| c == orig).unwrap_or(i);
	}

	let mut header = *gi.header();
	let background = usize::from(header[11]);
	if background < n {
		header[11] = cidx[background] as u8;
	}
	output.write_all(&header)?;

	let mut cmap = Vec::with_capacity(n * 3);
	for c in gi.colours() {
		cmap.extend_from_slice(&[c.r, c.g, c.b]);
	}
	output.write_all(&cmap)?;

	loop {
		let mut introducer = [0u8; 1];
		input.read_exact(&mut introducer)?;
		output.write_all(&introducer)?;

		match introducer[0] {
			TRAILER => break,
			INTRODUCER_EXTENSION => filter_extension(&cidx, input, output)?,
			INTRODUCER_IMAGE => filter_image(gi, &cidx, input, output, tr)?,
			other => return Err(GifError::UnknownBlock(other)),
		}
	}

	Ok(())
}

/// Passes an extension block through, re-mapping the transparency index of
/// GIF89a graphic-control blocks.
fn filter_extension<R: Read, W: Write>(
	cidx: &[usize],
	input: &mut R,
	output: &mut W,
) -> Result<(), GifError> {
	let mut function = [0u8; 1];
	input.read_exact(&mut function)?;
	output.write_all(&function)?;

	let graphic_control = function[0] == GRAPHIC_CONTROL;

	let mut count = [0u8; 1];
	input.read_exact(&mut count)?;
	output.write_all(&count)?;

	while count[0] != 0 {
		let len = usize::from(count[0]);
		let mut buf = [0u8; 255];
		input.read_exact(&mut buf[..len])?;

		// Transparency flag set: byte 3 is a colour index
		if graphic_control && buf[0] & 1 != 0 && len >= 4 {
			let index = usize::from(buf[3]);
			if index < cidx.len() {
				buf[3] = cidx[index] as u8;
			}
		}

		output.write_all(&buf[..len])?;

		input.read_exact(&mut count)?;
		output.write_all(&count)?;
	}

	Ok(())
}

/// Filters one image: descriptor and any local colourmap pass through,
/// pixels are decoded, re-mapped (global colourmap images only), and
/// re-encoded.
fn filter_image<R: Read, W: Write>(
	gi: &GifInfo,
	cidx: &[usize],
	input: &mut R,
	output: &mut W,
	tr: &mut Transcoder,
) -> Result<(), GifError> {
	let mut descriptor = [0u8; 9];
	input.read_exact(&mut descriptor)?;
	output.write_all(&descriptor)?;

	let local_cmap = descriptor[8] & 0x80 != 0;
	let mut bits_per_pixel = gi.bits_per_pixel();

	if local_cmap {
		bits_per_pixel = usize::from(descriptor[8] & 7) + 1;
		let mut map = vec![0u8; 3 * (1 << bits_per_pixel)];
		input.read_exact(&mut map)?;
		output.write_all(&map)?;
	}

	let width = u32::from(u16::from_le_bytes([descriptor[4], descriptor[5]]));
	let height = u32::from(u16::from_le_bytes([descriptor[6], descriptor[7]]));
	if width == 0 || height == 0 {
		return Err(GifError::BadDimensions {
			width,
			height,
		});
	}

	let size = width as usize * height as usize;
	let mut image = decode_image(input, size, tr)?;

	if !local_cmap {
		for pixel in &mut image {
			let index = usize::from(*pixel);
			if index < cidx.len() {
				*pixel = cidx[index] as u8;
			}
		}
	}

	encode_image(&image, bits_per_pixel, tr, output)
}
