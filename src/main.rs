//! Command-line front end for the avatar audio path.
//!
//! # Commands
//!
//! * `resample <in.wav> <out.wav>`: downsample a WAV file to the avatar rate
//!   (or `--rate`), writing 16-bit mono PCM.
//! * `record <out.wav>`: capture the default microphone for `--seconds`,
//!   downsample, and write the result.
//! * `config`: print the effective settings; `--init` writes them to disk.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use avatar_assistant::audio::{downsample, AudioBuffer, AudioCapture, CapturedChunk};
use avatar_assistant::config::{AppPaths, AssistantConfig};

#[derive(Parser)]
#[command(name = "avatar-assistant")]
#[command(version)]
#[command(about = "Audio tools for the talking-avatar assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Downsample a WAV file
    Resample {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file (16-bit mono)
        output: PathBuf,

        /// Target sample rate in Hz (defaults to the avatar rate)
        #[arg(short, long)]
        rate: Option<u32>,
    },

    /// Record the default microphone to a WAV file
    Record {
        /// Output WAV file (16-bit mono)
        output: PathBuf,

        /// Recording length in seconds
        #[arg(short, long, default_value_t = 5.0)]
        seconds: f32,

        /// Target sample rate in Hz (defaults to the realtime rate)
        #[arg(short, long)]
        rate: Option<u32>,
    },

    /// Show or initialise the settings file
    Config {
        /// Write the effective settings to disk
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let settings_file = cli
        .config
        .clone()
        .unwrap_or_else(|| AppPaths::new().settings_file);
    let config = AssistantConfig::load_from(&settings_file)
        .with_context(|| format!("Failed to load settings from {}", settings_file.display()))?;

    match cli.command {
        Commands::Resample {
            input,
            output,
            rate,
        } => resample_file(&input, &output, rate.unwrap_or(config.audio.avatar_rate)),
        Commands::Record {
            output,
            seconds,
            rate,
        } => record(&config, &output, seconds, rate.unwrap_or(config.audio.realtime_rate)),
        Commands::Config { init } => show_config(&config, &settings_file, init),
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

fn resample_file(input: &Path, output: &Path, rate: u32) -> Result<()> {
    if !input.exists() {
        bail!("File not found: {}", input.display());
    }

    let reader = hound::WavReader::open(input)
        .with_context(|| format!("Failed to open WAV file: {}", input.display()))?;
    let spec = reader.spec();

    log::info!(
        "{}: {} Hz, {} ch, {} bit",
        input.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    let pcm = read_mono_pcm(reader)?;
    let resampled = downsample(pcm.samples(), spec.sample_rate, rate)
        .with_context(|| format!("Cannot convert {} Hz to {rate} Hz", spec.sample_rate))?;

    write_wav(output, &resampled, rate)?;
    log::info!(
        "Wrote {} ({} samples, {:.1} ms)",
        output.display(),
        resampled.len(),
        resampled.duration_ms(rate)
    );
    Ok(())
}

/// Read any PCM WAV as mono 16-bit, averaging channels.
fn read_mono_pcm<R: std::io::Read>(reader: hound::WavReader<R>) -> Result<AudioBuffer> {
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let pcm = match spec.sample_format {
        hound::SampleFormat::Float => {
            let samples: Vec<f32> = reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .context("Failed to decode float samples")?;
            let mono: Vec<f32> = samples
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect();
            AudioBuffer::from_f32(&mono)
        }
        hound::SampleFormat::Int => {
            let bits = i32::from(spec.bits_per_sample);
            let samples: Vec<i32> = reader
                .into_samples::<i32>()
                .collect::<std::result::Result<_, _>>()
                .context("Failed to decode integer samples")?;
            let mono: Vec<i32> = samples
                .chunks_exact(channels)
                .map(|frame| {
                    let avg = frame.iter().map(|&s| i64::from(s)).sum::<i64>() / channels as i64;
                    rescale_to_16_bit(avg as i32, bits)
                })
                .collect();
            AudioBuffer::from_wide(&mono)
        }
    };

    Ok(pcm)
}

fn rescale_to_16_bit(sample: i32, bits: i32) -> i32 {
    match bits {
        b if b > 16 => sample >> (b - 16),
        b if b < 16 => sample << (16 - b),
        _ => sample,
    }
}

fn write_wav(path: &Path, audio: &AudioBuffer, sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &sample in audio.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// record
// ---------------------------------------------------------------------------

/// Validate `--seconds` into a recording length.
fn recording_length(seconds: f32) -> Result<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("--seconds must be positive");
    }
    Duration::try_from_secs_f32(seconds)
        .with_context(|| format!("--seconds {seconds} is out of range"))
}

fn record(config: &AssistantConfig, output: &Path, seconds: f32, rate: u32) -> Result<()> {
    let length = recording_length(seconds)?;
    let deadline = Instant::now()
        .checked_add(length)
        .with_context(|| format!("--seconds {seconds} is out of range"))?;

    let capture = AudioCapture::new(config.audio.capture_buffer())
        .context("Audio capture unavailable")?;
    let device_rate = capture.sample_rate();
    log::info!(
        "Recording {seconds:.1}s from default input ({} Hz, {} ch)",
        device_rate,
        capture.channels()
    );

    let (tx, rx) = mpsc::channel::<CapturedChunk>();
    let handle = capture.start(tx).context("Failed to start audio stream")?;

    let mut captured: Vec<i16> = Vec::new();
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(remaining) {
            Ok(chunk) => captured.extend_from_slice(chunk.samples.samples()),
            Err(_) => break,
        }
    }
    drop(handle);

    let resampled = downsample(&captured, device_rate, rate)
        .with_context(|| format!("Cannot convert {device_rate} Hz to {rate} Hz"))?;
    write_wav(output, &resampled, rate)?;

    log::info!(
        "Wrote {} ({:.1} ms at {rate} Hz)",
        output.display(),
        resampled.duration_ms(rate)
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn show_config(config: &AssistantConfig, settings_file: &Path, init: bool) -> Result<()> {
    if init {
        config
            .save_to(settings_file)
            .with_context(|| format!("Failed to write {}", settings_file.display()))?;
        log::info!("Settings written to {}", settings_file.display());
    }

    println!("# {}", settings_file.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
