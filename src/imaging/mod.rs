//! # Imaging
//!
//! The image capability consumed by ingestion, its `image`-crate backend,
//! and the raw/downscale pairing policy built on top of it.

mod pairing;
mod processor;
mod rust_backend;

pub use pairing::{BatchReport, PairingOutcome, PairingPolicy, RawDownscalePairing};
pub use processor::{fit_within, Dimensions, ImageProcessor, ResizeMode};
pub use rust_backend::RustImageProcessor;
