//! Speaker output via `cpal`.
//!
//! [`open_output`] builds an output stream whose callback renders from a
//! shared [`DeckState`].  The returned [`OutputStream`] is a RAII guard:
//! dropping it stops the hardware stream.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::deck::DeckState;

// ---------------------------------------------------------------------------
// OutputError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("output device not found: {0}")]
    DeviceNotFound(String),

    #[error("failed to enumerate output devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported output sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
}

// ---------------------------------------------------------------------------
// OutputStream
// ---------------------------------------------------------------------------

/// Keeps the cpal stream alive.
pub struct OutputStream {
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl OutputStream {
    /// Device rate in Hz; clips must be resampled to it.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// Pick the named output device, or the host default when `name` is `None`.
fn find_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device, OutputError> {
    match name {
        None => host.default_output_device().ok_or(OutputError::NoDevice),
        Some(wanted) => host
            .output_devices()?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| OutputError::DeviceNotFound(wanted.to_string())),
    }
}

/// Open the output device and start rendering `state` into it.
pub fn open_output(
    device_name: Option<&str>,
    state: Arc<Mutex<DeckState>>,
) -> Result<OutputStream, OutputError> {
    let host = cpal::default_host();
    let device = find_device(&host, device_name)?;

    let supported = device.default_output_config()?;
    let sample_format = supported.sample_format();
    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let config: cpal::StreamConfig = supported.into();

    let err_fn = |err: cpal::StreamError| log::error!("cpal output stream error: {err}");
    let frame_width = channels as usize;

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                lock(&state).render(data, frame_width);
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I16 => {
            let mut scratch = Vec::new();
            device.build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0.0_f32);
                    lock(&state).render(&mut scratch, frame_width);
                    for (dst, src) in data.iter_mut().zip(&scratch) {
                        *dst = (src.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    }
                },
                err_fn,
                None,
            )?
        }
        other => return Err(OutputError::UnsupportedFormat(other)),
    };

    stream.play()?;
    log::info!(
        "audio: output on {} ({sample_rate} Hz, {channels} ch)",
        device.name().unwrap_or_else(|_| "unknown device".into())
    );

    Ok(OutputStream {
        _stream: stream,
        sample_rate,
        channels,
    })
}

/// Lock the deck, recovering the data if another holder panicked.
pub(crate) fn lock(state: &Mutex<DeckState>) -> std::sync::MutexGuard<'_, DeckState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
