//! Desktop reviewer for audio transcription jobs.

pub mod app;
pub mod audio;
pub mod config;
pub mod session;
pub mod shortcuts;
pub mod suggest;
pub mod transport;
