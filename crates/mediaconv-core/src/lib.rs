//! Mediaconv Core Library
//!
//! This crate provides the types shared by every mediaconv component:
//! configuration, error types, file classification, target formats,
//! temporary-file naming and tracing setup.

pub mod config;
pub mod error;
pub mod format;
pub mod kind;
pub mod telemetry;
pub mod temp;

// Re-export commonly used types
pub use config::{Config, VideoQuality};
pub use error::{ConvertError, ErrorMetadata, LogLevel};
pub use format::{FormatFamily, TargetFormat};
pub use kind::FileKind;
pub use temp::{OutputPrefix, TempPaths};
