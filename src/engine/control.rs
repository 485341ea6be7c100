use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::{Error, GrainSize, PitchShiftConfig};

// -------------------------------------------------------------------------------------------------

/// Parameter changes for a [`PitchShiftEngine`](crate::PitchShiftEngine).
///
/// Messages are applied in the engine's audio thread at the start of the next processed block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMessage {
    /// Change the pitch offset in semitones. Keeps all buffered audio.
    SetPitch(f32),
    /// Change the grain size in samples. Unsupported sizes are ignored. A valid size resets
    /// the engine and thus restarts priming.
    SetGrainSize(usize),
    /// Clear all buffered audio and restart priming.
    Reset,
}

// -------------------------------------------------------------------------------------------------

/// Send [`ControlMessage`]s to a [`PitchShiftEngine`](crate::PitchShiftEngine) from any thread.
///
/// Handles are `Send` and `Sync` and can be cloned cheaply. Sending never blocks: messages are
/// pushed into a bounded lock-free queue, which the engine drains in its audio thread.
#[derive(Clone)]
pub struct ControlHandle {
    queue: Arc<ArrayQueue<ControlMessage>>,
}

impl ControlHandle {
    pub(crate) fn new(queue: Arc<ArrayQueue<ControlMessage>>) -> Self {
        Self { queue }
    }

    /// Change the pitch offset in semitones. Values get clamped to ±24 semitones.
    pub fn set_pitch(&self, semitones: f32) -> Result<(), Error> {
        if !semitones.is_finite() {
            return Err(Error::ParameterError(format!(
                "invalid pitch offset '{semitones}'"
            )));
        }
        self.send(ControlMessage::SetPitch(semitones))
    }

    /// Change the grain size. Returns an error and sends nothing for unsupported sizes.
    pub fn set_grain_size(&self, samples: usize) -> Result<(), Error> {
        let grain_size = GrainSize::try_from(samples)?;
        self.send(ControlMessage::SetGrainSize(grain_size.samples()))
    }

    /// Clear all buffered audio.
    pub fn reset(&self) -> Result<(), Error> {
        self.send(ControlMessage::Reset)
    }

    /// Push a raw control message.
    pub fn send(&self, message: ControlMessage) -> Result<(), Error> {
        if let Err(message) = self.queue.push(message) {
            log::warn!("Control message queue is full, dropping message: {message:?}");
            Err(Error::SendError(format!(
                "control queue is full, failed to send {message:?}"
            )))
        } else {
            Ok(())
        }
    }

    /// Number of messages which have not yet been consumed by the engine.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

// -------------------------------------------------------------------------------------------------

/// Clamp the given semitones into the supported pitch range. Non-finite values are rejected.
pub(crate) fn validate_semitones(semitones: f32) -> Option<f32> {
    if semitones.is_finite() {
        Some(semitones.clamp(
            -PitchShiftConfig::MAX_SEMITONES,
            PitchShiftConfig::MAX_SEMITONES,
        ))
    } else {
        None
    }
}

// -------------------------------------------------------------------------------------------------
