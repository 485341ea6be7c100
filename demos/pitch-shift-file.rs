//! Shifts the pitch of a WAV file and writes the result into a new WAV file.
//!
//! Usage:
//!   cargo run --release --example pitch-shift-file -- [OPTIONS]
//!
//! Options:
//!   -i, --input <PATH>       WAV file to read (default: assets/input.wav)
//!   -o, --output <PATH>      WAV file to write (default: pitch-shifted.wav)
//!   -s, --semitones <N>      Pitch offset in semitones, -24 to 24 (default: 7)
//!   -r, --ratio <R>          Pitch ratio, e.g. 0.5 for an octave down. Overrides semitones.
//!   -g, --grain-size <N>     Grain size: 512, 1024, 2048 or 4096 (default: 1024)
//!   -l, --log-level <LEVEL>  Set logging level (debug, info, warn, error)

use std::path::{Path, PathBuf};

use arg::{parse_args, Args};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use grainshift::{
    effects::PitchShiftEffect, utils::ratio_to_semitones, Effect, EffectTime, GrainSize,
};

// -------------------------------------------------------------------------------------------------

#[cfg(all(debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

// -------------------------------------------------------------------------------------------------

const DEFAULT_LOG_LEVEL: log::Level = if cfg!(debug_assertions) {
    log::Level::Debug
} else {
    log::Level::Warn
};

/// Frames per processed block, as a typical audio host would pass them.
const BLOCK_SIZE: usize = 128;

// -------------------------------------------------------------------------------------------------

/// Arguments for the pitch shift file example.
#[derive(Args, Debug)]
struct Arguments {
    #[arg(short = "i", long = "input")]
    /// WAV file to read
    input_path: Option<PathBuf>,
    #[arg(short = "o", long = "output")]
    /// WAV file to write
    output_path: Option<PathBuf>,
    #[arg(short = "s", long = "semitones")]
    /// Pitch offset in semitones (default: 7)
    semitones: Option<f32>,
    #[arg(short = "r", long = "ratio")]
    /// Pitch ratio, overrides semitones when set
    ratio: Option<f64>,
    #[arg(short = "g", long = "grain-size")]
    /// Grain size in samples (default: 1024)
    grain_size: Option<usize>,
    #[arg(short = "l", long = "log-level")]
    /// Set logging level to \"debug\", \"info\", \"warn\" or \"error\".
    log_level: Option<log::Level>,
}

// -------------------------------------------------------------------------------------------------

fn read_wav_file(path: &Path) -> Result<(WavSpec, Vec<f32>), Box<dyn std::error::Error>> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok((spec, samples))
}

fn write_wav_file(
    path: &Path,
    sample_rate: u32,
    channel_count: usize,
    samples: &[f32],
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = WavSpec {
        channels: channel_count as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse arguments
    let args = parse_args::<Arguments>();

    simple_logger::SimpleLogger::new()
        .with_level(args.log_level.unwrap_or(DEFAULT_LOG_LEVEL).to_level_filter())
        .init()
        .expect("Failed to set logger");

    let input_path = args
        .input_path
        .unwrap_or_else(|| PathBuf::from("assets/input.wav"));
    let output_path = args
        .output_path
        .unwrap_or_else(|| PathBuf::from("pitch-shifted.wav"));
    let semitones = match args.ratio {
        Some(ratio) if ratio > 0.0 => ratio_to_semitones(ratio),
        Some(ratio) => return Err(format!("invalid pitch ratio '{ratio}'").into()),
        None => args.semitones.unwrap_or(7.0),
    };
    let grain_size = GrainSize::try_from(args.grain_size.unwrap_or(1024))?;

    // Load the whole file
    let (spec, mut samples) = read_wav_file(&input_path)?;
    let channel_count = spec.channels as usize;
    let sample_rate = spec.sample_rate;
    log::info!(
        "Loaded '{}': {} Hz, {} channels, {} frames",
        input_path.display(),
        sample_rate,
        channel_count,
        samples.len() / channel_count
    );

    // Create the effect
    let mut effect = PitchShiftEffect::with_parameters(semitones, grain_size);
    effect.initialize(sample_rate, channel_count, BLOCK_SIZE)?;
    if let Some(engine) = effect.engine() {
        log::info!(
            "Shifting by {} semitones (ratio {:.4}) with a latency of {:.1} ms",
            engine.semitones(),
            engine.pitch_ratio(),
            engine.latency().as_secs_f64() * 1000.0
        );
    }

    // Append silence to flush the effect's tail
    let tail_frames = effect.process_tail().unwrap_or(0);
    samples.resize(samples.len() + tail_frames * channel_count, 0.0);

    // Process in host sized blocks
    for (index, block) in samples
        .chunks_mut(BLOCK_SIZE * channel_count)
        .enumerate()
    {
        let time = EffectTime::new((index * BLOCK_SIZE) as u64, sample_rate);
        effect.process(block, &time);
    }

    write_wav_file(&output_path, sample_rate, channel_count, &samples)?;
    println!("Wrote pitch shifted audio to '{}'", output_path.display());

    Ok(())
}
