#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod config;
mod effect;
mod engine;
mod error;
mod parameter;

// public, flat re-exports
pub use error::Error;

pub use config::{GrainSize, PitchShiftConfig};

pub use engine::{ControlHandle, ControlMessage, PitchShiftEngine};

pub use effect::{Effect, EffectMessage, EffectMessagePayload, EffectTime};

pub use parameter::{
    ClonableParameter, EnumParameter, EnumParameterValue, FloatParameter, FloatParameterValue,
    Parameter, ParameterType, ParameterValueUpdate,
};

// public mods
pub mod utils;

pub mod effects {
    //! Effect implementations, which can be embedded into audio hosts.

    pub use super::effect::pitch_shift::{PitchShiftEffect, PitchShiftEffectMessage};
}
