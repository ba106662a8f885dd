use serde::{Deserialize, Serialize};

pub const DEFAULT_BREAKPOINTS: &[u32] = &[
    16, 32, 48, 64, 96, 128, 256, 384, 640, 750, 828, 1080, 1200, 1920, 2048, 3840,
];

/// Process-wide image settings. Breakpoints are kept sorted ascending without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ImageConfigOverrides")]
pub struct ImageConfig {
    breakpoints: Vec<u32>,
}

/// Fields that replace the defaults when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfigOverrides {
    pub breakpoints: Option<Vec<u32>>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            breakpoints: DEFAULT_BREAKPOINTS.to_vec(),
        }
    }
}

impl From<ImageConfigOverrides> for ImageConfig {
    fn from(overrides: ImageConfigOverrides) -> Self {
        Self::with_overrides(overrides)
    }
}

impl ImageConfig {
    pub fn with_overrides(overrides: ImageConfigOverrides) -> Self {
        let mut breakpoints = overrides
            .breakpoints
            .unwrap_or_else(|| DEFAULT_BREAKPOINTS.to_vec());
        breakpoints.sort_unstable();
        breakpoints.dedup();
        Self { breakpoints }
    }

    pub fn breakpoints(&self) -> &[u32] {
        &self.breakpoints
    }
}
