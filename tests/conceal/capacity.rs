//! Capacity reporting across colourmap sizes.

use gifweave::capacity;

use crate::fixtures::{ImageSpec, build_gif, distinct_colours};

fn capacity_of(unique: usize, map_size: usize) -> gifweave::Capacity {
	let bits_per_pixel = map_size.trailing_zeros() as u8;
	let colours = distinct_colours(unique, map_size);
	let gif = build_gif(bits_per_pixel, &colours, &[ImageSpec::global(2, vec![0, 1])], None);

	capacity(&mut gif.as_slice()).unwrap()
}

#[test]
fn test_four_colours() {
	// floor(log2(4!)) - 1 = 3 bits
	let cap = capacity_of(4, 4);
	assert_eq!(cap.bits, 3);
	assert_eq!(cap.bytes, 0);
}

#[test]
fn test_full_map() {
	// floor(log2(256!)) - 1 = 1682 bits
	let cap = capacity_of(256, 256);
	assert_eq!(cap.bits, 1682);
	assert_eq!(cap.bytes, 210);
}

#[test]
fn test_single_colour_has_none() {
	let cap = capacity_of(1, 2);
	assert_eq!(cap.bits, 0);
	assert_eq!(cap.bytes, 0);
}

#[test]
fn test_two_colours_have_none() {
	// one bit of permutation space, and the terminator needs it
	let cap = capacity_of(2, 2);
	assert_eq!(cap.bits, 0);
}

#[test]
fn test_duplicates_do_not_count() {
	// 4 distinct colours in a 16-slot map still yield 4! orderings
	assert_eq!(capacity_of(4, 16).bits, capacity_of(4, 4).bits);
}

#[test]
fn test_monotonic_in_unique_colours() {
	let mut previous = 0;
	for unique in [2usize, 3, 4, 8, 16, 64, 128, 256] {
		let bits = capacity_of(unique, 256).bits;
		assert!(bits >= previous, "capacity shrank at {unique} colours");
		previous = bits;
	}
}

#[test]
fn test_report_format() {
	let cap = capacity_of(4, 4);
	assert_eq!(cap.to_string(), "File has storage capacity of 3 bits (0 bytes)");
}
