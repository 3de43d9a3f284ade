//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle.  Call
//! [`AudioCapture::start`] to begin streaming [`CapturedChunk`]s over an mpsc
//! channel.  The returned [`StreamHandle`] is a RAII guard; dropping it
//! stops the underlying cpal stream.
//!
//! Only the first channel of each frame is kept; the realtime API takes mono
//! 16-bit PCM.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use thiserror::Error;

use super::buffer::AudioBuffer;
use super::resample::{downsample, ResampleError};

// ---------------------------------------------------------------------------
// CapturedChunk
// ---------------------------------------------------------------------------

/// One hardware buffer of mono microphone audio.
#[derive(Debug, Clone)]
pub struct CapturedChunk {
    pub samples: AudioBuffer,
    /// Device sample rate in Hz (e.g. 44100, 48000).
    pub sample_rate: u32,
}

/// Downsample a captured chunk to `target_rate`, the rate the realtime API
/// expects on its input.
pub fn prepare_for_realtime(
    chunk: &CapturedChunk,
    target_rate: u32,
) -> Result<AudioBuffer, ResampleError> {
    downsample(chunk.samples.samples(), chunk.sample_rate, target_rate)
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or running the audio capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Default-input-device capture.
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use avatar_assistant::audio::{AudioCapture, CapturedChunk};
///
/// let (tx, rx) = mpsc::channel::<CapturedChunk>();
/// let capture = AudioCapture::new(Some(2048)).unwrap();
/// let _handle = capture.start(tx).unwrap();
/// // `_handle` keeps the stream alive; drop it to stop recording.
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_rate: u32,
    channels: u16,
}

impl AudioCapture {
    /// Open the system default input device.
    ///
    /// `buffer_frames` requests a fixed hardware buffer size; `None` keeps
    /// the device default.
    pub fn new(buffer_frames: Option<u32>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let mut config: cpal::StreamConfig = supported.into();
        if let Some(frames) = buffer_frames {
            config.buffer_size = cpal::BufferSize::Fixed(frames);
        }

        log::debug!(
            "capture: default input device at {sample_rate} Hz, {channels} ch, buffer {:?}",
            config.buffer_size
        );

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start recording and send [`CapturedChunk`]s to `tx`.
    ///
    /// Send errors (receiver dropped) are ignored so the audio thread never
    /// panics.
    pub fn start(&self, tx: mpsc::Sender<CapturedChunk>) -> Result<StreamHandle, CaptureError> {
        let sample_rate = self.sample_rate;
        let channels = usize::from(self.channels.max(1));

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(CapturedChunk {
                    samples: first_channel(data, channels),
                    sample_rate,
                });
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// Keep the first channel of interleaved `f32` frames as 16-bit PCM.
fn first_channel(data: &[f32], channels: usize) -> AudioBuffer {
    if channels == 1 {
        return AudioBuffer::from_f32(data);
    }
    let mono: Vec<f32> = data.iter().step_by(channels).copied().collect();
    AudioBuffer::from_f32(&mono)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
