/// Arguments of one loader call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLoaderConfig {
    pub src: String,
    pub width: Option<u32>,
}

impl ImageLoaderConfig {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            width: None,
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }
}

/// Maps an image source (and an optional target width) to a URL. Must be
/// pure: the synthesizer calls it on every regeneration.
pub trait ImageLoader {
    fn load(&self, config: &ImageLoaderConfig) -> String;

    /// A loader that ignores `width` cannot serve responsive variants.
    fn is_noop(&self) -> bool {
        false
    }
}

impl<F> ImageLoader for F
where
    F: Fn(&ImageLoaderConfig) -> String,
{
    fn load(&self, config: &ImageLoaderConfig) -> String {
        self(config)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopImageLoader;

impl ImageLoader for NoopImageLoader {
    fn load(&self, config: &ImageLoaderConfig) -> String {
        config.src.clone()
    }

    fn is_noop(&self) -> bool {
        true
    }
}
