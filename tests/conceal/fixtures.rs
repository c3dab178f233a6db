//! In-memory GIF builders and readers shared by the suite.

use gifweave::file::gif::decode::decode_image;
use gifweave::file::gif::encode::encode_image;
use gifweave::{GifInfo, Rgb, Transcoder};

/// One image block of a fixture GIF.
pub struct ImageSpec {
	pub width: u16,
	pub pixels: Vec<u8>,
	/// Local colourmap as `(bits_per_pixel, colours)`; global map otherwise
	pub local_map: Option<(u8, Vec<Rgb>)>,
}

impl ImageSpec {
	pub fn global(width: u16, pixels: Vec<u8>) -> Self {
		Self {
			width,
			pixels,
			local_map: None,
		}
	}
}

/// A colourmap of `n` distinct colours padded to the map size with
/// duplicates of the last one.
pub fn distinct_colours(n: usize, map_size: usize) -> Vec<Rgb> {
	(0..map_size)
		.map(|i| {
			let v = i.min(n - 1) as u8;
			Rgb::new(v, v.wrapping_mul(11), v ^ 0x55)
		})
		.collect()
}

/// Builds a GIF89a stream: header, global colourmap, an optional
/// graphic-control extension carrying a transparency index, then the given
/// images and the trailer.
pub fn build_gif(
	bits_per_pixel: u8,
	colours: &[Rgb],
	images: &[ImageSpec],
	transparent_index: Option<u8>,
) -> Vec<u8> {
	assert_eq!(colours.len(), 1 << bits_per_pixel);

	let mut data = Vec::new();
	data.extend_from_slice(b"GIF89a");
	data.extend_from_slice(&images[0].width.to_le_bytes());
	let height = (images[0].pixels.len() / images[0].width as usize) as u16;
	data.extend_from_slice(&height.to_le_bytes());
	data.push(0x80 | (bits_per_pixel - 1));
	data.push(0); // background index
	data.push(0); // aspect ratio

	for c in colours {
		data.extend_from_slice(&[c.r, c.g, c.b]);
	}

	if let Some(index) = transparent_index {
		data.push(b'!');
		data.push(0xf9);
		data.push(4);
		data.extend_from_slice(&[0x01, 0x00, 0x00, index]);
		data.push(0);
	}

	for image in images {
		data.push(b',');
		data.extend_from_slice(&0u16.to_le_bytes());
		data.extend_from_slice(&0u16.to_le_bytes());
		data.extend_from_slice(&image.width.to_le_bytes());
		let height = (image.pixels.len() / image.width as usize) as u16;
		data.extend_from_slice(&height.to_le_bytes());

		let bpp = match &image.local_map {
			Some((local_bpp, local_colours)) => {
				assert_eq!(local_colours.len(), 1 << local_bpp);
				data.push(0x80 | (local_bpp - 1));
				for c in local_colours {
					data.extend_from_slice(&[c.r, c.g, c.b]);
				}
				usize::from(*local_bpp)
			}
			None => {
				data.push(0);
				usize::from(bits_per_pixel)
			}
		};

		let mut tr = Transcoder::new();
		tr.set_use_end_code(true);
		encode_image(&image.pixels, bpp, &tr, &mut data).unwrap();
	}

	data.push(b';');
	data
}

/// One image as read back from a stream.
pub struct DecodedImage {
	pub pixels: Vec<u8>,
	pub local_map: Option<Vec<Rgb>>,
}

/// A fully decoded GIF stream.
pub struct ParsedGif {
	pub info: GifInfo,
	pub images: Vec<DecodedImage>,
	pub transparent_index: Option<u8>,
	pub end_code: bool,
}

/// Reads a whole GIF stream back: header, extensions, every image.
pub fn parse_gif(data: &[u8]) -> ParsedGif {
	let mut reader = data;
	let info = GifInfo::from_reader(&mut reader).unwrap();
	let mut tr = Transcoder::new();
	let mut images = Vec::new();
	let mut transparent_index = None;

	loop {
		let mut introducer = [0u8; 1];
		std::io::Read::read_exact(&mut reader, &mut introducer).unwrap();

		match introducer[0] {
			b';' => break,
			b'!' => {
				let mut function = [0u8; 1];
				std::io::Read::read_exact(&mut reader, &mut function).unwrap();

				loop {
					let mut count = [0u8; 1];
					std::io::Read::read_exact(&mut reader, &mut count).unwrap();
					if count[0] == 0 {
						break;
					}
					let mut block = vec![0u8; usize::from(count[0])];
					std::io::Read::read_exact(&mut reader, &mut block).unwrap();

					if function[0] == 0xf9 && block[0] & 1 != 0 {
						transparent_index = Some(block[3]);
					}
				}
			}
			b',' => {
				let mut descriptor = [0u8; 9];
				std::io::Read::read_exact(&mut reader, &mut descriptor).unwrap();

				let local_map = if descriptor[8] & 0x80 != 0 {
					let bpp = usize::from(descriptor[8] & 7) + 1;
					let mut map = vec![0u8; 3 * (1 << bpp)];
					std::io::Read::read_exact(&mut reader, &mut map).unwrap();
					Some(map.chunks_exact(3).map(|c| Rgb::new(c[0], c[1], c[2])).collect())
				} else {
					None
				};

				let width = u16::from_le_bytes([descriptor[4], descriptor[5]]) as usize;
				let height = u16::from_le_bytes([descriptor[6], descriptor[7]]) as usize;
				let pixels = decode_image(&mut reader, width * height, &mut tr).unwrap();

				images.push(DecodedImage {
					pixels,
					local_map,
				});
			}
			other => panic!("unexpected introducer 0x{other:02x}"),
		}
	}

	ParsedGif {
		info,
		images,
		transparent_index,
		end_code: tr.uses_end_code(),
	}
}

/// Maps an image's pixels through its colourmap for visual comparison.
pub fn render(parsed: &ParsedGif, image: &DecodedImage) -> Vec<Rgb> {
	image
		.pixels
		.iter()
		.map(|&p| match &image.local_map {
			Some(map) => map[usize::from(p)],
			None => parsed.info.colours()[usize::from(p)],
		})
		.collect()
}
