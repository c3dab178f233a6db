//! End-to-end concealment tests over whole GIF streams.

mod capacity;
mod fixtures;
