use std::{any::Any, time::Duration};

use four_cc::FourCC;

use crate::{parameter::ParameterValueUpdate, ClonableParameter, Error};

// -------------------------------------------------------------------------------------------------

pub mod pitch_shift;

// -------------------------------------------------------------------------------------------------

/// Carries [`Effect`] specific payloads, which can't or should not be expressed as
/// [`Parameter`](crate::Parameter).
///
/// This trait is implemented by message enums specific to each effect. It provides a way to
/// identify the target effect and access the message payload as a `dyn Any`, which can then be
/// downcast to the concrete message type within the effect's `process_message` implementation.
///
/// Messages are always applied in the effect's DSP real-time thread.
pub trait EffectMessage: Any + Send + Sync {
    /// The static name of the target effect for this message.
    ///
    /// This should match the `name()` of the target `Effect` implementation.
    fn effect_name(&self) -> &'static str;

    /// Returns the message payload as a `dyn Any` reference.
    fn payload(&self) -> &dyn Any;
}

// -------------------------------------------------------------------------------------------------

/// Type used in [`Effect::process_message`] to receive messages.
pub type EffectMessagePayload = dyn EffectMessage;

// -------------------------------------------------------------------------------------------------

/// Frame and wall-clock time reference for an audio effect's process function.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EffectTime {
    /// Position of the first frame of the processed buffer in the host's stream.
    pub pos_in_frames: u64,
    /// Duration of the host's stream up to the first processed frame.
    pub pos_duration: Duration,
}

impl EffectTime {
    pub fn new(pos_in_frames: u64, sample_rate: u32) -> Self {
        let pos_duration = if sample_rate > 0 {
            Duration::from_secs_f64(pos_in_frames as f64 / sample_rate as f64)
        } else {
            Duration::ZERO
        };
        Self {
            pos_in_frames,
            pos_duration,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Effects manipulate interleaved audio samples in `f32` format and can be `Send` and `Sync`ed
/// across threads. Buffers are processed in-place in the audio real-time thread.
///
/// Non real-time thread clients, such as UIs, can query info about an effect's parameter set via
/// [`Effect::parameters`] after creating the effect. Parameter values are changed in the audio
/// thread only, via [`Effect::process_parameter_update`] or [`Effect::process_message`].
///
/// NB: all `process_XXX` functions are called in realtime audio threads, so they must not
/// block! All other functions are called in the main thread to initialize the effect.
pub trait Effect: Send + Sync + 'static {
    /// A unique, static name for the effect.
    ///
    /// This name is used to associate `EffectMessage`s with their target effect type.
    fn name(&self) -> &'static str;

    /// Returns a list of parameter descriptors for this effect.
    ///
    /// This method may only be called on non-real-time threads.
    fn parameters(&self) -> Vec<&dyn ClonableParameter>;

    /// Initializes the effect with the audio output's properties.
    ///
    /// Runs on a non-real-time thread, so it's safe to perform allocations here.
    /// `max_frames` is the largest number of frames a single `process` call will pass.
    fn initialize(
        &mut self,
        sample_rate: u32,
        channel_count: usize,
        max_frames: usize,
    ) -> Result<(), Error>;

    /// Processes an interleaved audio buffer in-place, applying the effect.
    ///
    /// This method is called repeatedly on the real-time audio thread. To avoid audio glitches,
    /// it must not block, allocate memory, or perform other time-consuming operations.
    fn process(&mut self, output: &mut [f32], time: &EffectTime);

    /// Returns the number of audible sample frames this effect will produce, after it received
    /// silence.
    /// - `None`: means I don't know.
    /// - `Some(X)`: means that the effect will produce at least X sample frames of audible audio.
    /// - `Some(usize::MAX)`: signals an infinite tail.
    fn process_tail(&self) -> Option<usize> {
        None
    }

    /// Handles a parameter update in the real-time thread.
    ///
    /// Like `process`, this method must not block, allocate memory, or do other time-consuming tasks.
    fn process_parameter_update(
        &mut self,
        id: FourCC,
        value: &ParameterValueUpdate,
    ) -> Result<(), Error>;

    /// Handles optional effect specific messages in the real-time thread.
    ///
    /// The implementation should downcast the `message` payload to its specific message enum type
    /// and update its internal state accordingly.
    fn process_message(&mut self, _message: &EffectMessagePayload) -> Result<(), Error> {
        Err(Error::ParameterError(format!(
            "{}: Received unexpected message payload.",
            self.name()
        )))
    }
}
