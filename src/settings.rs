//! RON character settings.
//!
//! Every tunable of a character in one serializable document, so designers
//! can tweak a character without recompiling. Missing fields keep their
//! defaults.
//!
//! ```ron
//! (
//!     controller: (speed: 7.0, jump_height: 2.0),
//!     jump: (max_jumps: 3),
//! )
//! ```

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use ron::Options;
use serde::{Deserialize, Serialize};

use crate::config::{CharacterController, ControllerConfig};
use crate::detection::SurfaceSensors;
use crate::jump::JumpController;
use crate::mover::KineticMover;

/// Error type for settings loading failures.
#[derive(Debug)]
pub enum SettingsError {
    Io {
        file: String,
        source: std::io::Error,
    },
    Parse {
        file: String,
        source: ron::error::SpannedError,
    },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io { file, source } => {
                write!(f, "Failed to load {}: IO error: {}", file, source)
            }
            SettingsError::Parse { file, source } => {
                write!(f, "Failed to load {}: Parse error: {}", file, source)
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io { source, .. } => Some(source),
            SettingsError::Parse { source, .. } => Some(source),
        }
    }
}

/// Create RON options with extensions enabled for more flexible parsing.
fn ron_options() -> Options {
    Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

/// Serializable settings of one character.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct CharacterSettings {
    pub controller: ControllerConfig,
    pub mover: KineticMover,
    pub jump: JumpController,
    pub sensors: SurfaceSensors,
}

impl CharacterSettings {
    /// Parse settings from RON text.
    pub fn from_ron_str(source: &str) -> Result<Self, SettingsError> {
        Self::parse(source, "<string>")
    }

    /// Load settings from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let file_name = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            file: file_name.clone(),
            source,
        })?;

        let settings = Self::parse(&contents, &file_name)?;
        debug!(file = %file_name, "loaded character settings");
        Ok(settings)
    }

    fn parse(source: &str, file_name: &str) -> Result<Self, SettingsError> {
        ron_options()
            .from_str(source)
            .map_err(|source| SettingsError::Parse {
                file: file_name.to_string(),
                source,
            })
    }

    /// The controller components configured by these settings.
    pub fn bundle(&self) -> impl Bundle {
        (
            CharacterController::new(),
            self.controller,
            self.mover,
            self.jump,
            self.sensors,
        )
    }
}
