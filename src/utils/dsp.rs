//! Common, shared DSP tools for the pitch shifter.

pub mod circular;
pub mod window;
