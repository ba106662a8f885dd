use serde::Deserialize;

use crate::image::{ImageConfig, SynthesizerOptions};
use crate::{Error, Result};

/// Rendering mode flags shared by every synthesizer of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    pub dev_mode: bool,
    pub server: bool,
}

/// Crate settings as read from TOML:
///
/// ```toml
/// [image]
/// breakpoints = [640, 1080, 1920]
///
/// [mode]
/// dev_mode = true
/// server = false
/// ```
///
/// Every table and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub image: ImageConfig,
    pub mode: ModeConfig,
}

impl PlatformConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|err| Error::Config(err.to_string()))
    }

    pub fn synthesizer_options(&self) -> SynthesizerOptions {
        SynthesizerOptions::from(&self.mode)
    }
}
