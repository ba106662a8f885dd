//! Deterministic browser-integration primitives.
//!
//! Two independent pieces live here:
//!
//! - [`BrowserPlatformLocation`], a [`PlatformLocation`] over any
//!   [`BrowserPlatform`] that keeps an initial `:~:text=` highlight alive
//!   across the router's first `replaceState`.
//! - [`SourceSynthesizer`], a reactive component that keeps the `<source>`
//!   children of a `<picture>` in sync with a [`Signal`] of [`PictureSource`]s.
//!
//! [`MockBrowser`] and [`Dom`] are in-memory platform implementations used by
//! the tests and usable by downstream test suites.

mod config;
mod dom;
mod image;
mod location;
mod mock_browser;
mod navigation;
mod platform;
mod reactive;
mod text_fragment;

pub use config::{ModeConfig, PlatformConfig};
pub use dom::{Dom, NodeId, Renderer};
pub use image::{
    DEFAULT_BREAKPOINTS, HeadPreloadLinks, ImageConfig, ImageConfigOverrides, ImageLoader,
    ImageLoaderConfig, NoopImageLoader, OPTIMIZED_IMAGE_ATTR, OptimizedImage, PictureSource,
    PreconnectChecker, PreconnectLinkChecker, PreloadLinkCreator, SOURCE_INDEX_ATTR,
    SourceSynthesizer, SourceSynthesizerBuilder, SynthesizerOptions, base_image_url,
    responsive_srcset, validate_srcset,
};
pub use location::LocationParts;
pub use mock_browser::{MockBrowser, NativeCall};
pub use navigation::{BrowserPlatformLocation, NavigationState};
pub use platform::{
    BrowserPlatform, HistoryState, ListenerId, LocationChangeEvent, LocationEventKind,
    LocationListener, PlatformLocation, Unsubscribe,
};
pub use reactive::{EffectHandle, Runtime, Signal};
pub use text_fragment::{
    FragmentDirective, TEXT_DIRECTIVE_MARKER, TextDirectiveRange, encode_fragment_directive,
    extract_text_directive,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("{0} is not implemented by this platform location")]
    NotImplemented(&'static str),
    #[error("source synthesizer host must be a <picture> element, found <{actual}>")]
    HostNotPicture { actual: String },
    #[error("source synthesizer requires a non-empty list of sources")]
    EmptySources,
    #[error("<picture> has no child <img> carrying the `{attr}` attribute")]
    MissingImageSibling { attr: String },
    #[error("generated srcset `{srcset}` does not match the width or density descriptor grammar")]
    InvalidSrcset { srcset: String },
    #[error("dom error: {0}")]
    Dom(String),
    #[error("effect `{label}` kept rescheduling itself past {limit} steps")]
    EffectLoop { label: String, limit: usize },
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn dom(message: impl Into<String>) -> Self {
        Self::Dom(message.into())
    }

    /// Whether the error is one of the development-mode configuration checks.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::HostNotPicture { .. }
                | Self::EmptySources
                | Self::MissingImageSibling { .. }
                | Self::InvalidSrcset { .. }
        )
    }
}

#[cfg(test)]
mod tests;
