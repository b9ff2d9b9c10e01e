//! Document processing module

pub mod converter;
pub mod pdf;

pub use converter::DocumentConverter;
