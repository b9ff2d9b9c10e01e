//! Image processing module

pub mod converter;

pub use converter::ImageConverter;
