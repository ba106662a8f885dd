use std::cell::RefCell;
use std::collections::HashSet;

use log::warn;

use crate::Result;
use crate::dom::Renderer;
use crate::location::LocationParts;

/// Verifies that a priority image's origin has a preconnect hint.
pub trait PreconnectChecker {
    fn assert_preconnect(&self, url: &str, original_src: &str);
}

/// Emits a `<link rel="preload">` for a priority image during server
/// rendering.
pub trait PreloadLinkCreator {
    fn create_preload_link_tag(
        &self,
        renderer: &mut dyn Renderer,
        src: &str,
        srcset: Option<&str>,
        sizes: Option<&str>,
    ) -> Result<()>;
}

const LOCALHOST_HOSTNAMES: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "[::1]"];

/// Warns once per origin that lacks a `<link rel="preconnect">`.
#[derive(Debug, Default)]
pub struct PreconnectLinkChecker {
    preconnected: HashSet<String>,
    warned: RefCell<Vec<String>>,
}

impl PreconnectLinkChecker {
    pub fn new<I, S>(preconnected_origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let preconnected = preconnected_origins
            .into_iter()
            .filter_map(|origin| LocationParts::parse(origin.as_ref()))
            .map(|parts| parts.origin())
            .collect();
        Self {
            preconnected,
            warned: Default::default(),
        }
    }

    /// Origins reported as missing a preconnect hint, in report order.
    pub fn warned_origins(&self) -> Vec<String> {
        self.warned.borrow().clone()
    }
}

impl PreconnectChecker for PreconnectLinkChecker {
    fn assert_preconnect(&self, url: &str, original_src: &str) {
        // Relative URLs share the page's origin.
        let Some(parts) = LocationParts::parse(url) else {
            return;
        };
        if LOCALHOST_HOSTNAMES.contains(&parts.hostname()) {
            return;
        }
        let origin = parts.origin();
        if origin == "null" || self.preconnected.contains(&origin) {
            return;
        }
        let mut warned = self.warned.borrow_mut();
        if warned.contains(&origin) {
            return;
        }
        warn!(
            "priority image {original_src} is served from {origin} without a \
             <link rel=\"preconnect\" href=\"{origin}\"> hint"
        );
        warned.push(origin);
    }
}

/// Appends preload links to the document head, once per `href`.
#[derive(Debug, Default)]
pub struct HeadPreloadLinks {
    emitted: RefCell<HashSet<String>>,
}

impl HeadPreloadLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted_count(&self) -> usize {
        self.emitted.borrow().len()
    }
}

impl PreloadLinkCreator for HeadPreloadLinks {
    fn create_preload_link_tag(
        &self,
        renderer: &mut dyn Renderer,
        src: &str,
        srcset: Option<&str>,
        sizes: Option<&str>,
    ) -> Result<()> {
        if !self.emitted.borrow_mut().insert(src.to_string()) {
            return Ok(());
        }
        let Some(head) = renderer.head() else {
            return Ok(());
        };
        let link = renderer.create_element("link");
        renderer.set_attribute(link, "as", "image")?;
        renderer.set_attribute(link, "href", src)?;
        renderer.set_attribute(link, "rel", "preload")?;
        renderer.set_attribute(link, "fetchpriority", "high")?;
        if let Some(sizes) = sizes {
            renderer.set_attribute(link, "imagesizes", sizes)?;
        }
        if let Some(srcset) = srcset {
            renderer.set_attribute(link, "imagesrcset", srcset)?;
        }
        renderer.insert_before(head, link, None)
    }
}
