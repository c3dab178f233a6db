//! Colourmap permutation codec.
//!
//! A colourmap with `N` unique colours has `N!` orderings, so an ordering
//! can carry any value in `[0, N!)`. The mapping is the factoradic (Lehmer
//! code) bijection: dividing the value by 1, 2, .. N yields the insertion
//! position of each colour, taken from a reference ordering.
//!
//! The reference ordering is the sort of the unique colours under the
//! *ordering key*: plain RGB order, or, when a password is in play, the
//! order of each colour's 8-byte cipher text. Both sides of an exchange
//! must use the same key or the decoded value is garbage.
//!
//! Duplicate colours in the source map carry no information: the permuted
//! prefix holds the unique colours and the remaining slots are padding.
//! Remapped pixel indices always resolve to the first slot holding their
//! colour, so padding slots are never referenced.

use crate::bigint::BigInt;
use crate::cipher::KeyMaterial;
use crate::file::gif::{GifInfo, Rgb};

use super::ConcealError;

/// A unique colour with its working position and ordering ciphertext.
#[derive(Debug, Clone, Copy)]
struct CmapEntry {
	pos: usize,
	rgb: Rgb,
	ctext: [u8; 8],
}

/// Returns the distinct colours of `cols` in first-occurrence order.
fn unique_colours(cols: &[Rgb]) -> Vec<Rgb> {
	let mut unique: Vec<Rgb> = Vec::with_capacity(cols.len());
	for &c in cols {
		if !unique.contains(&c) {
			unique.push(c);
		}
	}
	unique
}

/// Builds the working entries, sorted under the ordering key. Each entry's
/// `pos` is its rank in first-occurrence order before sorting.
fn sorted_entries(cols: &[Rgb], key: Option<&KeyMaterial>) -> Vec<CmapEntry> {
	let mut entries: Vec<CmapEntry> = unique_colours(cols)
		.into_iter()
		.enumerate()
		.map(|(i, rgb)| CmapEntry {
			pos: i,
			rgb,
			ctext: [0; 8],
		})
		.collect();

	match key {
		Some(km) => {
			for e in &mut entries {
				e.ctext = km.colour_ciphertext(e.rgb.r, e.rgb.g, e.rgb.b);
			}
			entries.sort_by(|a, b| a.ctext.cmp(&b.ctext));
		}
		None => entries.sort_by(|a, b| a.rgb.cmp(&b.rgb)),
	}

	entries
}

/// Largest value the colourmap can carry: `N! - 1` over its unique colours.
pub fn max_storage(gi: &GifInfo) -> BigInt {
	let n = unique_colours(gi.colours()).len();
	let mut max = BigInt::factorial(n);
	max.decrement();
	max
}

/// Guaranteed payload capacity in bits: `floor(log2(N!)) - 1`, one bit
/// reserved for the terminator.
pub fn capacity_bits(gi: &GifInfo) -> usize {
	let n = unique_colours(gi.colours()).len();
	BigInt::factorial(n).high_bit().saturating_sub(2)
}

/// Reorders the colourmap to the `value`-th permutation of its unique
/// colours under the ordering key, consuming `value` down to zero.
pub fn encode(
	gi: &mut GifInfo,
	value: &mut BigInt,
	key: Option<&KeyMaterial>,
) -> Result<(), ConcealError> {
	let mut entries = sorted_entries(gi.colours(), key);
	let n = entries.len();

	// Factoradic digits, most significant divisor first
	for i in 0..n {
		entries[n - 1 - i].pos = value.div_u32((i + 1) as u32) as usize;
	}

	if !value.is_zero() {
		return Err(ConcealError::ValueOutOfRange {
			remainder_bits: value.high_bit(),
		});
	}

	// Insert each colour at its position, shifting the later ones up
	let colours = gi.colours_mut();
	for i in 0..n {
		let entry = entries[n - 1 - i];
		let mut j = i;
		while j > entry.pos {
			colours[j] = colours[j - 1];
			j -= 1;
		}
		colours[entry.pos] = entry.rgb;
	}

	// Duplicate slots carry no information; pad with the last colour
	let last = colours[colours.len() - 1];
	for c in &mut colours[n..] {
		*c = last;
	}

	Ok(())
}

/// Reads the colourmap's permutation back into the value it encodes under
/// the ordering key.
pub fn decode(gi: &GifInfo, key: Option<&KeyMaterial>) -> BigInt {
	let mut entries = sorted_entries(gi.colours(), key);
	let n = entries.len();
	let mut value = BigInt::new();

	for i in 0..n.saturating_sub(1) {
		let pos = entries[i].pos;
		value.mul_u32((n - i) as u32);
		value.add_assign(&BigInt::from_u32(pos as u32));

		// The removed colour no longer counts towards later ranks
		for e in &mut entries[i + 1..] {
			if e.pos > pos {
				e.pos -= 1;
			}
		}
	}

	value
}
