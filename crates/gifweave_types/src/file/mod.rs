//! File format support for the `gifweave` project.

mod error;

pub mod gif;

// Re-export unified error type
pub use error::GifError;

// Re-export main file types
pub use gif::{GifInfo, Rgb, Transcoder};
