//! Video processing module

pub mod converter;
pub mod probe;

pub use converter::VideoConverter;
pub use probe::VideoProbe;
