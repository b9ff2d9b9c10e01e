//! Mediaconv Media Processing Library
//!
//! This crate provides the conversion routines for videos, images and
//! documents, the table that routes a (source, target) pair to one of them,
//! a metadata probe and an admission gate for running conversions.

pub mod dispatch;
pub mod document;
pub mod gate;
pub mod image;
pub mod metadata;
pub mod route;
pub mod tool;
pub mod traits;
pub mod video;

// Re-export commonly used types
pub use dispatch::{ConversionOutput, ConversionRequest, Dispatcher};
pub use document::DocumentConverter;
pub use gate::ConversionGate;
pub use self::image::ImageConverter;
pub use metadata::{FileInfo, MetadataProbe, ProbedKind, VideoMetadata};
pub use route::{Operation, Route};
pub use traits::{
    ConversionJob, ConversionOutcome, MediaConverter, NoopProgress, ProgressSink,
};
pub use video::{VideoConverter, VideoProbe};
