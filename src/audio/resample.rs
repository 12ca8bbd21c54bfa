//! Channel mixing and sample-rate conversion for review clips.
//!
//! Clips are decoded at whatever rate they were recorded with and converted
//! once, at load time, to the output device's rate.  [`resample`] uses a
//! windowed-sinc resampler from `rubato` and falls back to linear
//! interpolation if rubato rejects the parameters.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// * `channels == 1` returns the input unchanged.
/// * `channels == 0` returns an empty vector.
///
/// ```rust
/// use transcript_review::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Number of output frames for `input_len` frames converted `from` → `to`.
fn output_len(input_len: usize, from: u32, to: u32) -> usize {
    (input_len as f64 * to as f64 / from as f64).ceil() as usize
}

/// Convert mono `samples` from `from_rate` to `to_rate`.
///
/// Equal rates and empty input are returned unchanged.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    match resample_sinc(samples, from_rate, to_rate) {
        Ok(out) => out,
        Err(e) => {
            log::warn!("resample: sinc {from_rate}->{to_rate} Hz failed ({e}), using linear");
            resample_linear(samples, from_rate, to_rate)
        }
    }
}

/// Windowed-sinc conversion of the whole clip in one chunk.
fn resample_sinc(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, samples.len(), 1)?;

    let delay = resampler.output_delay();
    let wanted = output_len(samples.len(), from_rate, to_rate);

    let mut out = resampler.process(&[samples], None)?.remove(0);
    // Flush the filter tail so the end of the clip is not cut off.
    while out.len() < delay + wanted {
        let tail = resampler.process_partial(None::<&[&[f32]]>, None)?.remove(0);
        if tail.is_empty() {
            break;
        }
        out.extend(tail);
    }

    let mut out: Vec<f32> = out.into_iter().skip(delay).take(wanted).collect();
    out.resize(wanted, 0.0);
    Ok(out)
}

/// Linear interpolation between neighbouring samples.
///
/// The output length is `ceil(samples.len() * to_rate / from_rate)`.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let len = output_len(samples.len(), from_rate, to_rate);
    let mut output = Vec::with_capacity(len);

    for i in 0..len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };
        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- stereo_to_mono ----------------------------------------------------

    #[test]
    fn mono_input_is_unchanged() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(stereo_to_mono(&input, 1), input);
    }

    #[test]
    fn two_channels_are_averaged() {
        let out = stereo_to_mono(&[1.0_f32, -1.0, 0.5, 0.5], 2);
        assert_eq!(out.len(), 2);
        assert!(out[0].abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_channels_gives_nothing() {
        assert!(stereo_to_mono(&[1.0_f32, 2.0], 0).is_empty());
    }

    // ---- resample ----------------------------------------------------------

    #[test]
    fn same_rate_is_noop() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        assert_eq!(resample(&input, 44_100, 44_100), input);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(resample(&[], 16_000, 48_000).is_empty());
        assert!(resample_linear(&[], 16_000, 48_000).is_empty());
    }

    #[test]
    fn linear_upsample_length() {
        // 10 ms @ 16 kHz -> 10 ms @ 48 kHz
        let out = resample_linear(&vec![0.0_f32; 160], 16_000, 48_000);
        assert_eq!(out.len(), 480);
    }

    #[test]
    fn linear_keeps_dc_level() {
        let out = resample_linear(&vec![0.5_f32; 441], 44_100, 48_000);
        for &s in &out {
            assert!((s - 0.5).abs() < 1e-5, "amplitude drift: {s}");
        }
    }

    #[test]
    fn sinc_output_length_matches_rate_ratio() {
        // 1 s @ 16 kHz -> 1 s @ 48 kHz
        let input = vec![0.0_f32; 16_000];
        let out = resample(&input, 16_000, 48_000);
        assert_eq!(out.len(), 48_000);
    }

    #[test]
    fn sinc_keeps_dc_level_away_from_edges() {
        let input = vec![0.5_f32; 8_000];
        let out = resample(&input, 16_000, 44_100);
        let mid = out[out.len() / 2];
        assert!((mid - 0.5).abs() < 0.05, "amplitude drift: {mid}");
    }
}
