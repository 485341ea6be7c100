use std::any::Any;

use four_cc::FourCC;

use crate::{
    effect::{Effect, EffectMessage, EffectMessagePayload, EffectTime},
    engine::grain::GrainProcessor,
    parameter::{
        ClonableParameter, EnumParameter, EnumParameterValue, FloatParameter, FloatParameterValue,
        ParameterValueUpdate,
    },
    utils::buffer::{interleaved_channel_to_mono, mono_to_interleaved},
    ControlMessage, Error, GrainSize, PitchShiftConfig, PitchShiftEngine,
};

// -------------------------------------------------------------------------------------------------

/// Messages which can be sent to a [`PitchShiftEffect`].
#[derive(Clone, Debug)]
pub enum PitchShiftEffectMessage {
    /// Clear all buffered audio and restart priming.
    Reset,
}

impl EffectMessage for PitchShiftEffectMessage {
    fn effect_name(&self) -> &'static str {
        PitchShiftEffect::EFFECT_NAME
    }
    fn payload(&self) -> &dyn Any {
        self
    }
}

// -------------------------------------------------------------------------------------------------

/// A granular pitch shifter effect, which shifts the pitch of the first channel by up to two
/// octaves and writes the result into all channels.
///
/// Shifted output is delayed by one grain plus three hops. See [`PitchShiftEngine`] for details.
pub struct PitchShiftEffect {
    sample_rate: u32,
    channel_count: usize,
    max_frames: usize,
    pitch: FloatParameterValue,
    grain_size: EnumParameterValue<GrainSize>,
    engine: Option<PitchShiftEngine>,
    input_buffer: Vec<f32>,
    output_buffer: Vec<f32>,
}

impl PitchShiftEffect {
    pub const EFFECT_NAME: &str = "PitchShiftEffect";
    pub const PITCH_ID: FourCC = FourCC(*b"ptch");
    pub const GRAIN_SIZE_ID: FourCC = FourCC(*b"grsz");

    /// Creates a new `PitchShiftEffect` with default parameter values.
    pub fn new() -> Self {
        let max_semitones = PitchShiftConfig::MAX_SEMITONES;
        Self {
            sample_rate: 0,
            channel_count: 0,
            max_frames: 0,
            pitch: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::PITCH_ID,
                    "Pitch",
                    -max_semitones..=max_semitones,
                    0.0,
                )
                .with_unit("st"),
            ),
            grain_size: EnumParameterValue::from_description(EnumParameter::new(
                Self::GRAIN_SIZE_ID,
                "Grain Size",
                GrainSize::default(),
            )),
            engine: None,
            input_buffer: Vec::new(),
            output_buffer: Vec::new(),
        }
    }

    /// Creates a new `PitchShiftEffect` with the given parameter values.
    pub fn with_parameters(semitones: f32, grain_size: GrainSize) -> Self {
        let mut effect = Self::default();
        effect.pitch.set_value_clamped(semitones);
        effect.grain_size.set_value(grain_size);
        effect
    }

    /// Access to the underlying engine, if the effect got initialized.
    pub fn engine(&self) -> Option<&PitchShiftEngine> {
        self.engine.as_ref()
    }

    fn reset(&mut self) -> Result<(), Error> {
        let engine = self.engine.as_mut().ok_or(Error::EffectNotInitialized)?;
        engine.reset();
        Ok(())
    }
}

impl Default for PitchShiftEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for PitchShiftEffect {
    fn name(&self) -> &'static str {
        Self::EFFECT_NAME
    }

    fn parameters(&self) -> Vec<&dyn ClonableParameter> {
        vec![self.pitch.description(), self.grain_size.description()]
    }

    fn initialize(
        &mut self,
        sample_rate: u32,
        channel_count: usize,
        max_frames: usize,
    ) -> Result<(), Error> {
        if channel_count == 0 || max_frames == 0 {
            return Err(Error::ParameterError(format!(
                "{}: invalid channel count '{channel_count}' or max frames '{max_frames}'",
                self.name()
            )));
        }
        let config = PitchShiftConfig::new(sample_rate)
            .grain_size(*self.grain_size.value())
            .semitones(self.pitch.value());
        self.engine = Some(PitchShiftEngine::new(config)?);
        self.sample_rate = sample_rate;
        self.channel_count = channel_count;
        self.max_frames = max_frames;
        self.input_buffer = vec![0.0; max_frames];
        self.output_buffer = vec![0.0; max_frames];
        Ok(())
    }

    fn process(&mut self, output: &mut [f32], _time: &EffectTime) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let channel_count = self.channel_count;
        for chunk in output.chunks_mut(self.max_frames * channel_count) {
            let frames = chunk.len() / channel_count;
            let input = &mut self.input_buffer[..frames];
            let shifted = &mut self.output_buffer[..frames];
            interleaved_channel_to_mono(chunk, channel_count, 0, input);
            engine.process_block(input, shifted);
            mono_to_interleaved(shifted, chunk, channel_count);
        }
    }

    fn process_tail(&self) -> Option<usize> {
        // output latency plus the longest possible overlap-added grain
        let grain_size = *self.grain_size.value();
        Some(grain_size.latency_frames() + GrainProcessor::max_resampled_len(grain_size))
    }

    fn process_parameter_update(
        &mut self,
        id: FourCC,
        value: &ParameterValueUpdate,
    ) -> Result<(), Error> {
        // only accepted updates reach the engine
        let message = match id {
            Self::PITCH_ID => self
                .pitch
                .apply_update(value)
                .then(|| ControlMessage::SetPitch(self.pitch.value())),
            Self::GRAIN_SIZE_ID => self
                .grain_size
                .apply_update(value)
                .then(|| ControlMessage::SetGrainSize(self.grain_size.value().samples())),
            _ => {
                return Err(Error::ParameterError(format!(
                    "Unknown parameter: '{id}' for effect '{}'",
                    self.name()
                )))
            }
        };
        if let (Some(engine), Some(message)) = (self.engine.as_mut(), message) {
            engine.apply_control_message(message);
        }
        Ok(())
    }

    fn process_message(&mut self, message: &EffectMessagePayload) -> Result<(), Error> {
        if let Some(message) = message
            .payload()
            .downcast_ref::<PitchShiftEffectMessage>()
        {
            match message {
                PitchShiftEffectMessage::Reset => self.reset(),
            }
        } else {
            Err(Error::ParameterError(
                "PitchShiftEffect: Invalid/unknown message payload".to_owned(),
            ))
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct OtherMessage;

    impl EffectMessage for OtherMessage {
        fn effect_name(&self) -> &'static str {
            "Other"
        }
        fn payload(&self) -> &dyn Any {
            self
        }
    }

    fn stereo_sine(frames: usize, offset: usize) -> Vec<f32> {
        (offset..offset + frames)
            .flat_map(|i| {
                let s = (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin();
                [s, -s]
            })
            .collect()
    }

    #[test]
    fn parameters() {
        let mut effect = PitchShiftEffect::new();
        let parameters = effect.parameters();
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0].id(), PitchShiftEffect::PITCH_ID);
        assert_eq!(parameters[0].default_normalized_value(), 0.5);
        assert_eq!(parameters[1].id(), PitchShiftEffect::GRAIN_SIZE_ID);
        assert_eq!(parameters[1].normalized_value_to_string(0.0, false), "512");

        assert!(effect
            .process_parameter_update(FourCC(*b"nope"), &ParameterValueUpdate::Normalized(0.0))
            .is_err());
        assert_eq!(effect.process_tail(), Some(1792 + 4096));

        // updates before initialize configure the engine
        effect
            .process_parameter_update(
                PitchShiftEffect::PITCH_ID,
                &ParameterValueUpdate::Raw(Box::new(7.0_f32)),
            )
            .unwrap();
        effect
            .process_parameter_update(
                PitchShiftEffect::GRAIN_SIZE_ID,
                &ParameterValueUpdate::Raw(Box::new(GrainSize::Samples2048)),
            )
            .unwrap();
        effect.initialize(48000, 2, 256).unwrap();
        let engine = effect.engine().unwrap();
        assert_eq!(engine.semitones(), 7.0);
        assert_eq!(engine.grain_size(), GrainSize::Samples2048);
        assert_eq!(engine.sample_rate(), 48000);
    }

    #[test]
    fn rejected_parameter_updates_keep_engine_state() {
        let mut effect = PitchShiftEffect::with_parameters(7.0, GrainSize::Samples1024);
        effect.initialize(44100, 2, 128).unwrap();
        for block in 0..16 {
            let mut buffer = stereo_sine(128, block * 128);
            effect.process(&mut buffer, &EffectTime::default());
        }
        let engine = effect.engine().unwrap();
        assert!(engine.is_primed());
        let state = (engine.input_available(), engine.output_available());
        assert!(state.1 > 0);

        let rejected = [
            (PitchShiftEffect::GRAIN_SIZE_ID, ParameterValueUpdate::Raw(Box::new(777_usize))),
            (
                PitchShiftEffect::GRAIN_SIZE_ID,
                ParameterValueUpdate::Raw(Box::new("777".to_string())),
            ),
            (PitchShiftEffect::GRAIN_SIZE_ID, ParameterValueUpdate::Normalized(f32::NAN)),
            (PitchShiftEffect::PITCH_ID, ParameterValueUpdate::Raw(Box::new(f32::NAN))),
            (PitchShiftEffect::PITCH_ID, ParameterValueUpdate::Raw(Box::new("wrong"))),
        ];
        for (id, update) in &rejected {
            assert!(effect.process_parameter_update(*id, update).is_ok());
            let engine = effect.engine().unwrap();
            assert!(engine.is_primed());
            assert_eq!(
                (engine.input_available(), engine.output_available()),
                state
            );
            assert_eq!(engine.grain_size(), GrainSize::Samples1024);
            assert_eq!(engine.semitones(), 7.0);
        }

        // accepted updates still reach the engine
        effect
            .process_parameter_update(
                PitchShiftEffect::GRAIN_SIZE_ID,
                &ParameterValueUpdate::Raw(Box::new(GrainSize::Samples512)),
            )
            .unwrap();
        let engine = effect.engine().unwrap();
        assert_eq!(engine.grain_size(), GrainSize::Samples512);
        assert!(!engine.is_primed());
    }

    #[test]
    fn tail_flushes_all_output() {
        let mut effect = PitchShiftEffect::with_parameters(-24.0, GrainSize::Samples512);
        effect.initialize(44100, 2, 256).unwrap();
        let tail = effect.process_tail().unwrap();
        assert_eq!(tail, 896 + 2048);

        let mut rendered = stereo_sine(4096, 0);
        rendered.resize((4096 + tail + 1024) * 2, 0.0);
        effect.process(&mut rendered, &EffectTime::default());

        let (sound, silence) = rendered.split_at((4096 + tail) * 2);
        assert!(sound[4096 * 2..].iter().any(|s| s.abs() > 0.01));
        assert!(silence.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn messages() {
        let mut effect = PitchShiftEffect::with_parameters(-12.0, GrainSize::Samples512);
        assert_eq!(
            effect.process_message(&PitchShiftEffectMessage::Reset),
            Err(Error::EffectNotInitialized)
        );
        effect.initialize(44100, 2, 128).unwrap();

        let mut buffer = stereo_sine(128, 0);
        for _ in 0..8 {
            effect.process(&mut buffer, &EffectTime::default());
        }
        assert!(effect.engine().unwrap().is_primed());
        assert!(effect
            .process_message(&PitchShiftEffectMessage::Reset)
            .is_ok());
        assert!(!effect.engine().unwrap().is_primed());
        assert!(effect.process_message(&OtherMessage).is_err());
    }

    #[test]
    fn process_interleaved() {
        let mut effect = PitchShiftEffect::with_parameters(5.0, GrainSize::Samples1024);
        assert!(effect.initialize(44100, 0, 128).is_err());
        effect.initialize(44100, 2, 128).unwrap();

        // buffers larger than max_frames get processed in chunks
        let mut rendered = Vec::new();
        for block in 0..8 {
            let mut buffer = stereo_sine(512, block * 512);
            effect.process(&mut buffer, &EffectTime::new(block as u64 * 512, 44100));
            rendered.extend(buffer);
        }
        assert_eq!(effect.engine().unwrap().processed_frames(), 8 * 512);

        for frame in rendered.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(rendered[..1024 * 2].iter().all(|s| *s == 0.0));
        assert!(rendered[2048 * 2..].iter().any(|s| s.abs() > 0.01));

        // bypassed: the first channel passes through
        effect
            .process_parameter_update(
                PitchShiftEffect::PITCH_ID,
                &ParameterValueUpdate::Normalized(0.5),
            )
            .unwrap();
        let mut buffer = stereo_sine(64, 0);
        let expected = buffer.iter().step_by(2).copied().collect::<Vec<_>>();
        effect.process(&mut buffer, &EffectTime::default());
        assert!(buffer
            .chunks_exact(2)
            .zip(expected)
            .all(|(frame, s)| frame[0] == s && frame[1] == s));
    }
}
