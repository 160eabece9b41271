//! Features Module - Packet Feature Extraction
//!
//! Turns captured frames into fixed-width vectors for the classifier and
//! groups one cycle's vectors into a batch.

pub mod batch;
pub mod extract;
pub mod vector;

pub use batch::Batch;
pub use extract::extract;
