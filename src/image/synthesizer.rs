use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use super::collaborators::{
    HeadPreloadLinks, PreconnectChecker, PreconnectLinkChecker, PreloadLinkCreator,
};
use super::config::ImageConfig;
use super::loader::{ImageLoader, NoopImageLoader};
use super::source::PictureSource;
use super::srcset::{base_image_url, derived_srcset, responsive_srcset, validate_srcset};
use crate::config::ModeConfig;
use crate::dom::{NodeId, Renderer};
use crate::reactive::{EffectHandle, Runtime, Signal, WeakRuntime};
use crate::{Error, Result};

/// Positional marker written on every generated `<source>`.
pub const SOURCE_INDEX_ATTR: &str = "data-source-index";

/// Marker of the optimized `<img>` the generated sources are inserted before.
pub const OPTIMIZED_IMAGE_ATTR: &str = "data-optimized-image";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesizerOptions {
    /// Enables precondition checks and preconnect validation.
    pub dev_mode: bool,
    /// Server rendering: priority sources get preload links.
    pub server: bool,
}

impl From<&ModeConfig> for SynthesizerOptions {
    fn from(mode: &ModeConfig) -> Self {
        Self {
            dev_mode: mode.dev_mode,
            server: mode.server,
        }
    }
}

/// The optimized image rendered inside the `<picture>`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedImage {
    node: NodeId,
    priority: Signal<bool>,
}

impl OptimizedImage {
    /// Marks `node` with [`OPTIMIZED_IMAGE_ATTR`].
    pub fn attach(
        renderer: &mut dyn Renderer,
        node: NodeId,
        priority: Signal<bool>,
    ) -> Result<Self> {
        renderer.set_attribute(node, OPTIMIZED_IMAGE_ATTR, "")?;
        Ok(Self { node, priority })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn priority(&self) -> &Signal<bool> {
        &self.priority
    }
}

#[derive(Debug, Default)]
struct GeneratedSources {
    nodes: Vec<NodeId>,
    initialized: bool,
}

struct Shared<R> {
    runtime: WeakRuntime,
    renderer: Rc<RefCell<R>>,
    host: NodeId,
    config: ImageConfig,
    loader: Rc<dyn ImageLoader>,
    preconnect: Rc<dyn PreconnectChecker>,
    preload: Rc<dyn PreloadLinkCreator>,
    options: SynthesizerOptions,
    generated: RefCell<GeneratedSources>,
}

pub struct SourceSynthesizerBuilder<R: Renderer + 'static> {
    runtime: Runtime,
    renderer: Rc<RefCell<R>>,
    host: NodeId,
    sources: Signal<Vec<PictureSource>>,
    image: Signal<Option<OptimizedImage>>,
    config: ImageConfig,
    loader: Rc<dyn ImageLoader>,
    preconnect: Rc<dyn PreconnectChecker>,
    preload: Rc<dyn PreloadLinkCreator>,
    options: SynthesizerOptions,
}

impl<R: Renderer + 'static> SourceSynthesizerBuilder<R> {
    pub fn config(mut self, config: ImageConfig) -> Self {
        self.config = config;
        self
    }

    pub fn loader(mut self, loader: Rc<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn preconnect_checker(mut self, checker: Rc<dyn PreconnectChecker>) -> Self {
        self.preconnect = checker;
        self
    }

    pub fn preload_link_creator(mut self, creator: Rc<dyn PreloadLinkCreator>) -> Self {
        self.preload = creator;
        self
    }

    pub fn options(mut self, options: SynthesizerOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers the regenerate, preconnect and preload effects, in that
    /// order, and runs them once.
    pub fn start(self) -> SourceSynthesizer<R> {
        let shared = Rc::new(Shared {
            runtime: self.runtime.downgrade(),
            renderer: self.renderer,
            host: self.host,
            config: self.config,
            loader: self.loader,
            preconnect: self.preconnect,
            preload: self.preload,
            options: self.options,
            generated: RefCell::new(GeneratedSources::default()),
        });

        let effects = self.runtime.batch(|| {
            vec![
                regenerate_effect(&self.runtime, &shared, self.sources.clone()),
                preconnect_effect(
                    &self.runtime,
                    &shared,
                    self.sources.clone(),
                    self.image.clone(),
                ),
                preload_effect(
                    &self.runtime,
                    &shared,
                    self.sources.clone(),
                    self.image.clone(),
                ),
            ]
        });

        SourceSynthesizer {
            shared,
            sources: self.sources,
            effects,
        }
    }
}

/// Keeps the `<source>` children of a `<picture>` in sync with a signal of
/// [`PictureSource`]s.
///
/// Every change of the list tears down all previously generated nodes and
/// rebuilds them in order, each inserted before the sibling optimized image.
/// An empty list means "not configured yet" and leaves the DOM untouched.
pub struct SourceSynthesizer<R: Renderer + 'static> {
    shared: Rc<Shared<R>>,
    sources: Signal<Vec<PictureSource>>,
    effects: Vec<EffectHandle>,
}

impl<R: Renderer + 'static> SourceSynthesizer<R> {
    pub fn builder(
        runtime: &Runtime,
        renderer: Rc<RefCell<R>>,
        host: NodeId,
        sources: Signal<Vec<PictureSource>>,
        image: Signal<Option<OptimizedImage>>,
    ) -> SourceSynthesizerBuilder<R> {
        SourceSynthesizerBuilder {
            runtime: runtime.clone(),
            renderer,
            host,
            sources,
            image,
            config: ImageConfig::default(),
            loader: Rc::new(NoopImageLoader),
            preconnect: Rc::new(PreconnectLinkChecker::default()),
            preload: Rc::new(HeadPreloadLinks::new()),
            options: SynthesizerOptions::default(),
        }
    }

    pub fn host(&self) -> NodeId {
        self.shared.host
    }

    pub fn sources(&self) -> &Signal<Vec<PictureSource>> {
        &self.sources
    }

    /// Nodes produced by the last successful regeneration, in source order.
    pub fn generated_sources(&self) -> Vec<NodeId> {
        self.shared.generated.borrow().nodes.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.generated.borrow().initialized
    }

    /// Stops reacting; generated nodes stay in the document.
    pub fn dispose(self) {
        for effect in self.effects {
            effect.dispose();
        }
    }
}

fn regenerate_effect<R: Renderer + 'static>(
    runtime: &Runtime,
    shared: &Rc<Shared<R>>,
    sources: Signal<Vec<PictureSource>>,
) -> EffectHandle {
    let shared = Rc::clone(shared);
    runtime.create_effect("picture-sources:regenerate", move || {
        let sources = sources.get();
        if sources.is_empty() {
            return Ok(());
        }
        shared.regenerate(&sources)
    })
}

fn preconnect_effect<R: Renderer + 'static>(
    runtime: &Runtime,
    shared: &Rc<Shared<R>>,
    sources: Signal<Vec<PictureSource>>,
    image: Signal<Option<OptimizedImage>>,
) -> EffectHandle {
    let shared = Rc::clone(shared);
    runtime.create_effect("picture-sources:preconnect", move || {
        let priority = image_priority(&image);
        let sources = sources.get();
        if !shared.is_initialized() || !priority || !shared.options.dev_mode {
            return Ok(());
        }
        for source in &sources {
            let url = base_image_url(source, shared.loader.as_ref());
            shared.preconnect.assert_preconnect(&url, &source.srcset);
        }
        Ok(())
    })
}

fn preload_effect<R: Renderer + 'static>(
    runtime: &Runtime,
    shared: &Rc<Shared<R>>,
    sources: Signal<Vec<PictureSource>>,
    image: Signal<Option<OptimizedImage>>,
) -> EffectHandle {
    let shared = Rc::clone(shared);
    runtime.create_effect("picture-sources:preload", move || {
        let priority = image_priority(&image);
        let sources = sources.get();
        if !shared.is_initialized() || !shared.options.server || !priority {
            return Ok(());
        }
        shared.runtime.untracked(|| -> Result<()> {
            let mut renderer = shared.renderer.borrow_mut();
            for source in &sources {
                let srcset = responsive_srcset(source, &shared.config, shared.loader.as_ref());
                let url = base_image_url(source, shared.loader.as_ref());
                shared.preload.create_preload_link_tag(
                    &mut *renderer,
                    &url,
                    Some(&srcset),
                    source.sizes.as_deref(),
                )?;
            }
            Ok(())
        })
    })
}

fn image_priority(image: &Signal<Option<OptimizedImage>>) -> bool {
    image
        .get()
        .is_some_and(|image| image.priority().get())
}

fn find_optimized_image(renderer: &dyn Renderer, host: NodeId) -> Option<NodeId> {
    renderer
        .children(host)
        .into_iter()
        .find(|child| renderer.attribute(*child, OPTIMIZED_IMAGE_ATTR).is_some())
}

impl<R: Renderer + 'static> Shared<R> {
    fn is_initialized(&self) -> bool {
        self.generated.borrow().initialized
    }

    fn regenerate(&self, sources: &[PictureSource]) -> Result<()> {
        let dev_mode = self.options.dev_mode;
        let mut renderer = self.renderer.borrow_mut();

        let host_tag = renderer.tag_name(self.host).unwrap_or_default();
        if !host_tag.eq_ignore_ascii_case("picture") {
            if dev_mode {
                return Err(Error::HostNotPicture { actual: host_tag });
            }
            debug!("skipping source regeneration: host is <{host_tag}>");
            return Ok(());
        }
        if dev_mode && sources.is_empty() {
            return Err(Error::EmptySources);
        }

        let image = find_optimized_image(&*renderer, self.host);
        if image.is_none() && self.is_initialized() {
            if dev_mode {
                return Err(Error::MissingImageSibling {
                    attr: OPTIMIZED_IMAGE_ATTR.to_string(),
                });
            }
            debug!("skipping source regeneration: optimized image is gone");
            return Ok(());
        }

        let mut srcsets = Vec::with_capacity(sources.len());
        for source in sources {
            // Only descriptor lists built here are checked; a plain loader URL
            // is passed through untouched.
            match derived_srcset(source, &self.config, self.loader.as_ref()) {
                Some(srcset) => {
                    if dev_mode {
                        validate_srcset(&srcset)?;
                    }
                    srcsets.push(srcset);
                }
                None => srcsets.push(base_image_url(source, self.loader.as_ref())),
            }
        }

        let previous = std::mem::take(&mut self.generated.borrow_mut().nodes);
        for node in previous {
            if let Some(parent) = renderer.parent(node) {
                renderer.remove_child(parent, node)?;
            }
        }

        let mut generated = Vec::with_capacity(sources.len());
        for (index, (source, srcset)) in sources.iter().zip(&srcsets).enumerate() {
            let node = renderer.create_element("source");
            renderer.set_attribute(node, "srcset", srcset)?;
            if let Some(media) = &source.media {
                renderer.set_attribute(node, "media", media)?;
            }
            if let Some(mime_type) = &source.mime_type {
                renderer.set_attribute(node, "type", mime_type)?;
            }
            if let Some(sizes) = &source.sizes {
                renderer.set_attribute(node, "sizes", sizes)?;
            }
            renderer.set_attribute(node, SOURCE_INDEX_ATTR, &index.to_string())?;
            renderer.insert_before(self.host, node, image)?;
            generated.push(node);
        }
        debug!("regenerated {} picture sources", generated.len());

        let mut state = self.generated.borrow_mut();
        state.nodes = generated;
        state.initialized = true;
        Ok(())
    }
}
