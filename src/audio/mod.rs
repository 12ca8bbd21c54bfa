//! Audio engine: WAV clips, resampling and a cpal output deck.
//!
//! # Pipeline
//!
//! ```text
//! clip.wav → hound → stereo_to_mono → resample (device rate)
//!          → DeckState ← cpal output callback
//! ```
//!
//! [`AudioDeck`] is the [`MediaBackend`](crate::session::MediaBackend) the
//! review session drives.

pub mod clip;
pub mod deck;
pub mod output;
pub mod resample;

pub use clip::{Clip, ClipError};
pub use deck::{AudioDeck, DeckState};
pub use output::{OutputError, OutputStream};
pub use resample::{resample, resample_linear, stereo_to_mono};
