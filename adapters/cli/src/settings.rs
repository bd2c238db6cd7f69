//! Optional TOML settings file layered underneath the command-line flags.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use alchemy_core::PlayArea;
use alchemy_system_interaction::{InteractionConfig, DEFAULT_DOUBLE_CLICK_WINDOW};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors raised while loading the settings file.
#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    /// The file exists but could not be read.
    #[error("failed to read settings file {path}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid settings TOML.
    #[error("failed to parse settings file {path}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// The play area would be empty.
    #[error("play area must be at least one unit wide and tall, got {width}x{height}")]
    EmptyPlayArea {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}

/// Session tunables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) double_click_ms: u64,
    pub(crate) seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            double_click_ms: DEFAULT_DOUBLE_CLICK_WINDOW.as_millis() as u64,
            seed: 0,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults when no file is given or found.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "settings file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings: Self = toml::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validated()
    }

    /// Applies command-line overrides on top of the loaded values.
    pub(crate) fn with_overrides(
        mut self,
        width: Option<u32>,
        height: Option<u32>,
        seed: Option<u64>,
    ) -> Result<Self, SettingsError> {
        if let Some(width) = width {
            self.width = width;
        }
        if let Some(height) = height {
            self.height = height;
        }
        if let Some(seed) = seed {
            self.seed = seed;
        }
        self.validated()
    }

    pub(crate) fn play_area(&self) -> PlayArea {
        PlayArea::new(self.width as f32, self.height as f32)
    }

    pub(crate) fn interaction_config(&self) -> InteractionConfig {
        InteractionConfig::new(
            self.play_area(),
            Duration::from_millis(self.double_click_ms),
            self.seed,
        )
    }

    fn validated(self) -> Result<Self, SettingsError> {
        if self.width == 0 || self.height == 0 {
            return Err(SettingsError::EmptyPlayArea {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_yields_defaults() {
        let settings = Settings::load(None).expect("defaults load");
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.interaction_config().double_click_window,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let path = directory.path().join("alchemy.toml");

        let settings = Settings::load(Some(&path)).expect("missing file is tolerated");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let path = directory.path().join("alchemy.toml");
        fs::write(&path, "width = 800\ndouble_click_ms = 400\n").expect("settings written");

        let settings = Settings::load(Some(&path)).expect("settings load");
        assert_eq!(settings.width, 800);
        assert_eq!(settings.height, 480);
        assert_eq!(settings.double_click_ms, 400);
        assert_eq!(settings.play_area(), PlayArea::new(800.0, 480.0));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let path = directory.path().join("alchemy.toml");
        fs::write(&path, "fullscreen = true\n").expect("settings written");

        let error = Settings::load(Some(&path)).expect_err("unknown key fails");
        assert!(matches!(error, SettingsError::Parse { .. }));
    }

    #[test]
    fn overrides_win_and_are_validated() {
        let settings = Settings::default()
            .with_overrides(Some(1024), None, Some(9))
            .expect("overrides are valid");
        assert_eq!(settings.width, 1024);
        assert_eq!(settings.height, 480);
        assert_eq!(settings.seed, 9);

        let error = Settings::default()
            .with_overrides(None, Some(0), None)
            .expect_err("zero height rejected");
        assert!(matches!(
            error,
            SettingsError::EmptyPlayArea {
                width: 640,
                height: 0
            }
        ));
    }
}
