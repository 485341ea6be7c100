//! Grain resampling.

pub mod cubic;

pub use cubic::CubicResampler;
