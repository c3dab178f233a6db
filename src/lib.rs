//! `gifweave` conceals messages in the colourmap ordering of GIF images.
//!
//! The binary in this package is the command-line tool; all of the actual
//! machinery lives in [`gifweave_types`] and is re-exported here.

pub use gifweave_types::*;
