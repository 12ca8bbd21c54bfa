//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\transcript-review\
//!   macOS:   ~/Library/Application Support/transcript-review/
//!   Linux:   ~/.config/transcript-review/
//!
//! Cache dir (suggestion list):
//!   Windows: %LOCALAPPDATA%\transcript-review\
//!   macOS:   ~/Library/Caches/transcript-review/
//!   Linux:   ~/.cache/transcript-review/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Suggestion list written when the window closes and merged back in at
    /// the next start-up.
    pub words_cache_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "transcript-review";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let words_cache_file = cache_dir.join("words.json");

        Self {
            config_dir,
            settings_file,
            words_cache_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .words_cache_file
            .file_name()
            .is_some_and(|n| n == "words.json"));
    }
}
