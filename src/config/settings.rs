//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// LeavePolicy
// ---------------------------------------------------------------------------

/// What happens to the current utterance's edit when the reviewer navigates
/// away from it.
///
/// | Variant          | Behaviour                                         |
/// |------------------|---------------------------------------------------|
/// | `ConfirmPending` | Unconfirmed, non-empty edits are ticked first     |
/// | `Keep`           | Edits stay in the buffer, nothing is submitted    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeavePolicy {
    ConfirmPending,
    Keep,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self::ConfirmPending
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Connection settings for the review server that records actions and
/// receives edited transcriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// When `false` every outbound call is logged and dropped (offline
    /// review).
    pub enabled: bool,
    /// Base URL of the server, without trailing slash.
    pub base_url: String,
    /// Bearer token, `None` when the server needs no authentication.
    pub api_key: Option<String>,
    /// Maximum seconds to wait for a single request.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:8000".into(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// JobConfig
// ---------------------------------------------------------------------------

/// Which job manifest to open when none is given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub manifest_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// SuggestConfig
// ---------------------------------------------------------------------------

/// Settings for the autocomplete word list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    /// Local JSON file holding an array of words.
    pub prefetch_path: Option<PathBuf>,
    /// Remote JSON word list, fetched once at start-up.
    pub prefetch_url: Option<String>,
    /// Maximum number of suggestions shown under the input.
    pub limit: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            prefetch_path: None,
            prefetch_url: None,
            limit: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Audio output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Output device name; `None` means the system default.
    pub output_device: Option<String>,
    /// Start playing an utterance as soon as it becomes current.
    pub play_on_select: bool,
    /// Move to the next utterance when the current clip finishes.
    pub auto_advance_on_end: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            output_device: None,
            play_on_select: true,
            auto_advance_on_end: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ReviewConfig
// ---------------------------------------------------------------------------

/// Review workflow settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// What navigation does with pending edits.
    pub leave_policy: LeavePolicy,
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial window size `(width, height)` in logical pixels.
    pub window_size: (f32, f32),
    /// Keep the reviewer window above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (960.0, 640.0),
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use transcript_review::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub job: JobConfig,
    pub suggest: SuggestConfig,
    pub playback: PlaybackConfig,
    pub review: ReviewConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
