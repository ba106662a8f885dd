//! Responsive `<picture>` sources.

mod collaborators;
mod config;
mod loader;
mod source;
mod srcset;
mod synthesizer;

pub use collaborators::{
    HeadPreloadLinks, PreconnectChecker, PreconnectLinkChecker, PreloadLinkCreator,
};
pub use config::{DEFAULT_BREAKPOINTS, ImageConfig, ImageConfigOverrides};
pub use loader::{ImageLoader, ImageLoaderConfig, NoopImageLoader};
pub use source::PictureSource;
pub use srcset::{base_image_url, responsive_srcset, validate_srcset};
pub use synthesizer::{
    OPTIMIZED_IMAGE_ATTR, OptimizedImage, SOURCE_INDEX_ATTR, SourceSynthesizer,
    SourceSynthesizerBuilder, SynthesizerOptions,
};
