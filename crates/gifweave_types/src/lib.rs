//! Core types and codecs for the `gifweave` project.
//!
//! `gifweave` hides a message in the *ordering* of a GIF's global
//! colourmap. Any ordering of the colours can be compensated for by
//! re-mapping the pixel index stream, so the output is visually identical
//! to the input while the permutation of `N` unique colours carries
//! `log2(N!)` bits of covert data.
//!
//! # Modules
//!
//! - [`bigint`]: exact arithmetic on values up to `256!`
//! - [`cipher`]: the ICE block cipher, password keying, 1-bit CFB
//! - [`huffman`]: the static payload compression code
//! - [`file`]: GIF parsing, LZW transcoding, stream rewriting
//! - [`conceal`]: the embed / extract / capacity pipelines
//!
//! # Examples
//!
//! ```no_run
//! use gifweave_types::conceal::{Concealer, Options};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cover = std::fs::File::open("cover.gif")?;
//! let mut output = std::fs::File::create("out.gif")?;
//!
//! let concealer = Concealer::new(Options::default(), Some("secret"));
//! concealer.embed(&mut &b"attack at dawn"[..], &mut cover, &mut output)?;
//! # Ok(())
//! # }
//! ```

pub mod bigint;
pub mod cipher;
pub mod conceal;
pub mod file;
pub mod huffman;
pub mod prelude;

// Re-export commonly used types at crate root for convenience
pub use bigint::BigInt;
pub use cipher::{IceKey, KeyMaterial};
pub use conceal::{Capacity, ConcealError, Concealer, EmbedReport, Options, capacity};
pub use file::{GifError, GifInfo, Rgb, Transcoder};
