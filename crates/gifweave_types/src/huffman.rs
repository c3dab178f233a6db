//! Static payload compression.
//!
//! Payloads are compressed with a fixed variable-length code tuned for
//! English printable text: common letters and the space character get short
//! codes, rare bytes get long ones. The code is canonical Huffman, built
//! once from the hard-coded weight table below.
//!
//! The weight table is part of the on-wire format: encoder and decoder on
//! both ends of a covert exchange must agree on it bit for bit, so it must
//! never change. Because every byte has nonzero weight the code is complete,
//! which means any bit sequence decodes to *something*; a wrongly-keyed
//! extraction therefore produces garbage bytes rather than a decode error.
//!
//! No end-of-stream symbol is needed. The outer bit-packing layer appends a
//! terminator bit and recovers the exact compressed bit count, so the
//! decoder always sees whole codewords (anything after the last one is
//! padding and is dropped at flush).

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::OnceLock;

/// Upper bound on codeword length; the weight table keeps real depths far
/// below this.
const MAX_CODE_LEN: usize = 32;

/// Relative byte frequencies of the code, tuned for English text.
const fn symbol_weights() -> [u32; 256] {
	let mut w = [1u32; 256];

	w[b' ' as usize] = 130;

	// lowercase letters
	w[b'e' as usize] = 117;
	w[b't' as usize] = 85;
	w[b'a' as usize] = 77;
	w[b'o' as usize] = 71;
	w[b'i' as usize] = 69;
	w[b'n' as usize] = 66;
	w[b's' as usize] = 60;
	w[b'r' as usize] = 57;
	w[b'h' as usize] = 52;
	w[b'l' as usize] = 38;
	w[b'd' as usize] = 36;
	w[b'u' as usize] = 26;
	w[b'c' as usize] = 26;
	w[b'm' as usize] = 23;
	w[b'f' as usize] = 21;
	w[b'w' as usize] = 20;
	w[b'g' as usize] = 19;
	w[b'y' as usize] = 18;
	w[b'p' as usize] = 16;
	w[b'b' as usize] = 14;
	w[b'v' as usize] = 9;
	w[b'k' as usize] = 7;
	w[b'x' as usize] = 2;
	w[b'q' as usize] = 2;
	w[b'j' as usize] = 2;
	w[b'z' as usize] = 2;

	// uppercase letters
	w[b'T' as usize] = 10;
	w[b'A' as usize] = 9;
	w[b'I' as usize] = 8;
	w[b'S' as usize] = 7;
	w[b'E' as usize] = 7;
	w[b'C' as usize] = 6;
	w[b'M' as usize] = 6;
	w[b'B' as usize] = 5;
	w[b'R' as usize] = 5;
	w[b'W' as usize] = 5;
	w[b'H' as usize] = 5;
	w[b'P' as usize] = 5;
	w[b'D' as usize] = 5;
	w[b'N' as usize] = 5;
	w[b'O' as usize] = 4;
	w[b'L' as usize] = 4;
	w[b'F' as usize] = 4;
	w[b'G' as usize] = 3;

	// digits
	let mut d = b'0';
	while d <= b'9' {
		w[d as usize] = 6;
		d += 1;
	}

	// punctuation and whitespace
	w[b'\n' as usize] = 12;
	w[b'\r' as usize] = 4;
	w[b'\t' as usize] = 3;
	w[b'.' as usize] = 11;
	w[b',' as usize] = 11;
	w[b'-' as usize] = 6;
	w[b'\'' as usize] = 4;
	w[b'"' as usize] = 3;
	w[b':' as usize] = 3;
	w[b';' as usize] = 2;
	w[b'!' as usize] = 3;
	w[b'?' as usize] = 3;
	w[b'/' as usize] = 3;
	w[b'(' as usize] = 2;
	w[b')' as usize] = 2;
	w[b'_' as usize] = 2;
	w[b'@' as usize] = 2;

	w
}

static WEIGHTS: [u32; 256] = symbol_weights();

/// Computes code lengths by building the Huffman tree over [`WEIGHTS`].
///
/// Ties are broken by node index, which makes the tree (and therefore the
/// code) fully deterministic.
fn code_lengths(weights: &[u32; 256]) -> [u8; 256] {
	let mut children: Vec<Option<(usize, usize)>> = vec![None; 256];
	let mut heap: BinaryHeap<Reverse<(u64, usize)>> =
		weights.iter().enumerate().map(|(i, &w)| Reverse((u64::from(w), i))).collect();

	while heap.len() > 1 {
		let (Some(Reverse((wa, a))), Some(Reverse((wb, b)))) = (heap.pop(), heap.pop()) else {
			break;
		};
		let id = children.len();
		children.push(Some((a, b)));
		heap.push(Reverse((wa + wb, id)));
	}

	let root = heap.pop().map_or(0, |Reverse((_, id))| id);
	let mut lengths = [0u8; 256];
	let mut stack = vec![(root, 0u8)];

	while let Some((id, depth)) = stack.pop() {
		match children[id] {
			Some((a, b)) => {
				stack.push((a, depth + 1));
				stack.push((b, depth + 1));
			}
			None => lengths[id] = depth,
		}
	}

	debug_assert!(lengths.iter().all(|&l| l >= 1 && usize::from(l) <= MAX_CODE_LEN));
	lengths
}

/// The canonical code shared by compression and decompression.
#[derive(Debug)]
pub struct HuffmanTable {
	codes: [(u32, u8); 256],
	counts: [u16; MAX_CODE_LEN + 1],
	first_code: [u32; MAX_CODE_LEN + 1],
	first_index: [u16; MAX_CODE_LEN + 1],
	symbols: [u8; 256],
}

impl HuffmanTable {
	/// Returns the process-wide table, building it on first use.
	pub fn shared() -> &'static Self {
		static TABLE: OnceLock<HuffmanTable> = OnceLock::new();
		TABLE.get_or_init(Self::build)
	}

	fn build() -> Self {
		let lengths = code_lengths(&WEIGHTS);

		let mut counts = [0u16; MAX_CODE_LEN + 1];
		for &len in &lengths {
			counts[usize::from(len)] += 1;
		}

		// Canonical numbering: codes of each length are consecutive,
		// starting from the previous length's endpoint shifted up one bit
		let mut first_code = [0u32; MAX_CODE_LEN + 1];
		let mut first_index = [0u16; MAX_CODE_LEN + 1];
		let mut code = 0u32;
		let mut index = 0u16;

		for len in 1..=MAX_CODE_LEN {
			code <<= 1;
			first_code[len] = code;
			first_index[len] = index;
			code += u32::from(counts[len]);
			index += counts[len];
		}

		// Within one length, symbols take codes in ascending byte order
		let mut next_code = first_code;
		let mut next_index = first_index;
		let mut codes = [(0u32, 0u8); 256];
		let mut symbols = [0u8; 256];

		for sym in 0..256usize {
			let len = usize::from(lengths[sym]);
			codes[sym] = (next_code[len], lengths[sym]);
			symbols[usize::from(next_index[len])] = sym as u8;
			next_code[len] += 1;
			next_index[len] += 1;
		}

		Self {
			codes,
			counts,
			first_code,
			first_index,
			symbols,
		}
	}

	/// Returns the codeword for `byte` as `(code, length)`; the code's bits
	/// are transmitted most significant first.
	pub fn code(&self, byte: u8) -> (u32, u8) {
		self.codes[usize::from(byte)]
	}

	/// Creates an incremental decoder over this table.
	pub fn decoder(&self) -> Decoder<'_> {
		Decoder {
			table: self,
			code: 0,
			len: 0,
		}
	}
}

/// Bit-at-a-time decoder; yields one byte per completed codeword.
#[derive(Debug)]
pub struct Decoder<'a> {
	table: &'a HuffmanTable,
	code: u32,
	len: usize,
}

impl Decoder<'_> {
	/// Feeds one bit; returns the decoded byte once a codeword completes.
	pub fn push_bit(&mut self, bit: bool) -> Option<u8> {
		self.code = (self.code << 1) | u32::from(bit);
		self.len += 1;

		let t = self.table;
		let first = t.first_code[self.len];
		let count = u32::from(t.counts[self.len]);

		if count != 0 && self.code >= first && self.code - first < count {
			let offset = usize::from(t.first_index[self.len]) + (self.code - first) as usize;
			let sym = t.symbols[offset];
			self.code = 0;
			self.len = 0;
			return Some(sym);
		}

		debug_assert!(self.len < MAX_CODE_LEN, "complete code cannot overrun");
		None
	}

	/// Number of buffered bits not yet forming a codeword.
	pub fn pending_bits(&self) -> usize {
		self.len
	}
}
