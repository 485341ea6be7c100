use std::{error, fmt};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by grainshift.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    EffectNotInitialized,
    ParameterError(String),
    ResamplingError(String),
    SendError(String),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EffectNotInitialized => write!(f, "Effect is not initialized"),
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::ResamplingError(str) => write!(f, "Resampling failed: {str}"),
            Self::SendError(str) => write!(f, "Failed to send control message: {str}"),
        }
    }
}
