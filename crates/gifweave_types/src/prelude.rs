//! Prelude module for `gifweave_types`.
//!
//! This module provides a convenient way to import commonly used types.
//!
//! # Examples
//!
//! ```no_run
//! use gifweave_types::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut input = std::fs::File::open("cover.gif")?;
//! let capacity = capacity(&mut input)?;
//! println!("{capacity}");
//! # Ok(())
//! # }
//! ```

// Concealment pipeline types
#[doc(inline)]
pub use crate::conceal::{Capacity, ConcealError, Concealer, EmbedReport, Options, capacity};

// File format types
#[doc(inline)]
pub use crate::file::{GifError, GifInfo, Rgb, Transcoder};

// Arithmetic and cipher building blocks
#[doc(inline)]
pub use crate::bigint::BigInt;

#[doc(inline)]
pub use crate::cipher::{IceKey, KeyMaterial};

// Re-export the file module for advanced usage
#[doc(inline)]
pub use crate::file;
