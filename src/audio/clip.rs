//! Decoded utterance audio.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::resample::{resample, stereo_to_mono};

/// Errors raised while decoding a clip file.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("failed to read WAV file: {0}")]
    Wav(#[from] hound::Error),

    #[error("WAV file declares a sample rate of 0 Hz")]
    ZeroRate,
}

/// Mono `f32` samples at a fixed rate.  Cloning shares the sample data.
#[derive(Debug, Clone)]
pub struct Clip {
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
}

impl Clip {
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
        }
    }

    /// Decode a WAV file, mixing all channels down to mono.
    ///
    /// Integer PCM of any bit depth is scaled into `[-1.0, 1.0]`.
    pub fn load(path: &Path) -> Result<Self, ClipError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(ClipError::ZeroRate);
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let mono = stereo_to_mono(&interleaved, spec.channels);
        log::debug!(
            "clip: {} ({} Hz, {} ch, {} frames)",
            path.display(),
            spec.sample_rate,
            spec.channels,
            mono.len()
        );
        Ok(Self::from_samples(mono, spec.sample_rate))
    }

    /// This clip converted to `rate`.
    pub fn resampled(&self, rate: u32) -> Self {
        if rate == self.sample_rate {
            return self.clone();
        }
        Self::from_samples(resample(&self.samples, self.sample_rate, rate), rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_wav(path: &Path, spec: hound::WavSpec, frames: &[i16]) {
        let mut w = hound::WavWriter::create(path, spec).unwrap();
        for &s in frames {
            w.write_sample(s).unwrap();
        }
        w.finalize().unwrap();
    }

    #[test]
    fn loads_stereo_pcm_as_mono() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("u1.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        // Two frames: (max, 0) and (-max, -max)
        write_wav(&path, spec, &[16_384, 0, -16_384, -16_384]);

        let clip = Clip::load(&path).unwrap();
        assert_eq!(clip.sample_rate(), 8_000);
        assert_eq!(clip.len(), 2);
        assert!((clip.samples()[0] - 0.25).abs() < 1e-4);
        assert!((clip.samples()[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn duration_follows_rate() {
        let clip = Clip::from_samples(vec![0.0; 24_000], 16_000);
        assert!((clip.duration_secs() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Clip::load(&dir.path().join("none.wav")),
            Err(ClipError::Wav(_))
        ));
    }

    #[test]
    fn resampled_to_same_rate_shares_samples() {
        let clip = Clip::from_samples(vec![0.1; 10], 48_000);
        let same = clip.resampled(48_000);
        assert!(Arc::ptr_eq(&clip.samples, &same.samples));
        assert_eq!(clip.resampled(16_000).len(), 4);
    }
}
