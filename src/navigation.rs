use std::rc::Rc;

use log::debug;

use crate::Result;
use crate::platform::{
    BrowserPlatform, HistoryState, LocationEventKind, LocationListener, PlatformLocation,
    Unsubscribe,
};
use crate::text_fragment::{
    encode_fragment_directive, extract_text_directive, has_fragment_directive,
};

/// Fragment bookkeeping of one [`BrowserPlatformLocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    initial_path_query: String,
    text_fragment_hash: Option<String>,
    skip_initial_replace: bool,
}

impl NavigationState {
    pub fn initial_path_query(&self) -> &str {
        &self.initial_path_query
    }

    /// The tracked `#:~:text=...` directive, if it is still being preserved.
    pub fn text_fragment_hash(&self) -> Option<&str> {
        self.text_fragment_hash.as_deref()
    }

    pub fn skip_initial_replace(&self) -> bool {
        self.skip_initial_replace
    }
}

/// [`PlatformLocation`] backed by a [`BrowserPlatform`].
///
/// A router usually normalizes the URL with `replaceState` right after boot.
/// Browsers do not protect a `:~:text=` highlight from that rewrite, so the
/// adapter keeps the directive it found at construction and splices it back
/// into same-document navigations until the user navigates elsewhere. The
/// very first `replaceState` to the initial path is dropped altogether.
pub struct BrowserPlatformLocation<P: BrowserPlatform> {
    platform: Rc<P>,
    state: NavigationState,
}

impl<P: BrowserPlatform + 'static> BrowserPlatformLocation<P> {
    pub fn new(platform: Rc<P>) -> Self {
        let initial_path_query = platform.location().path_query();
        let text_fragment_hash = detect_initial_text_fragment(platform.as_ref());
        if let Some(fragment) = &text_fragment_hash {
            debug!("text fragment {fragment} detected on {initial_path_query}");
        }
        let skip_initial_replace = text_fragment_hash.is_some();
        Self {
            platform,
            state: NavigationState {
                initial_path_query,
                text_fragment_hash,
                skip_initial_replace,
            },
        }
    }

    pub fn platform(&self) -> &Rc<P> {
        &self.platform
    }

    pub fn navigation_state(&self) -> &NavigationState {
        &self.state
    }

    fn clear_text_fragment(&mut self, reason: &str) {
        if let Some(fragment) = self.state.text_fragment_hash.take() {
            debug!("stopped preserving {fragment}: {reason}");
        }
    }

    /// Returns the URL to hand to the native history call, re-attaching the
    /// tracked directive to same-document destinations.
    fn preserve_text_fragment(&mut self, url: Option<&str>) -> Option<String> {
        let Some(fragment) = self.state.text_fragment_hash.clone() else {
            return url.map(str::to_string);
        };
        let location = self.platform.location();
        let current_path_query = location.path_query();

        let url = match url {
            Some(url) if !url.is_empty() => url,
            _ => {
                if location.hash().contains(&fragment[1..]) {
                    self.clear_text_fragment("already present in the live hash");
                    return None;
                }
                return Some(format!("{current_path_query}{fragment}"));
            }
        };

        let Some(mut resolved) = self.platform.resolve_url(url, &location.href()) else {
            self.clear_text_fragment("destination url does not parse");
            return Some(url.to_string());
        };

        if resolved.path_query() != current_path_query || has_fragment_directive(resolved.hash()) {
            self.clear_text_fragment("navigation to another location");
            return Some(url.to_string());
        }

        let spliced = if resolved.hash().is_empty() {
            fragment
        } else {
            format!("{}{}", resolved.hash(), &fragment[1..])
        };
        resolved.set_hash(&spliced);
        Some(resolved.href())
    }

    fn destination_path_query(&self, url: Option<&str>) -> Option<String> {
        let location = self.platform.location();
        match url {
            None => Some(location.path_query()),
            Some(url) => self
                .platform
                .resolve_url(url, &location.href())
                .map(|parts| parts.path_query()),
        }
    }

    fn subscribe(&self, kind: LocationEventKind, listener: LocationListener) -> Unsubscribe {
        let id = self.platform.add_listener(kind, listener);
        let platform = Rc::clone(&self.platform);
        Unsubscribe::new(move || {
            platform.remove_listener(id);
        })
    }
}

fn detect_initial_text_fragment<P: BrowserPlatform + ?Sized>(platform: &P) -> Option<String> {
    extract_text_directive(platform.location().hash())
        .or_else(|| {
            let entry_url = platform.navigation_entry_url()?;
            let parts = platform.resolve_url(&entry_url, &platform.location().href())?;
            extract_text_directive(parts.hash())
        })
        .or_else(|| encode_fragment_directive(&platform.fragment_directive()?))
}

impl<P: BrowserPlatform + 'static> PlatformLocation for BrowserPlatformLocation<P> {
    fn base_href_from_dom(&self) -> Option<String> {
        let base_href = self.platform.base_href()?;
        let location = self.platform.location();
        let resolved = self.platform.resolve_url(&base_href, &location.href());
        Some(resolved.map_or(base_href, |parts| parts.pathname().to_string()))
    }

    fn state(&self) -> HistoryState {
        self.platform.history_state()
    }

    fn on_pop_state(&self, listener: LocationListener) -> Unsubscribe {
        self.subscribe(LocationEventKind::PopState, listener)
    }

    fn on_hash_change(&self, listener: LocationListener) -> Unsubscribe {
        self.subscribe(LocationEventKind::HashChange, listener)
    }

    fn href(&self) -> String {
        self.platform.location().href()
    }

    fn protocol(&self) -> String {
        self.platform.location().protocol()
    }

    fn hostname(&self) -> String {
        self.platform.location().hostname().to_string()
    }

    fn port(&self) -> String {
        self.platform.location().port().to_string()
    }

    fn pathname(&self) -> String {
        self.platform.location().pathname().to_string()
    }

    fn search(&self) -> String {
        self.platform.location().search().to_string()
    }

    fn hash(&self) -> String {
        self.platform.location().hash().to_string()
    }

    fn push_state(&mut self, state: HistoryState, title: &str, url: Option<&str>) {
        let url = self.preserve_text_fragment(url);
        self.platform.push_state(state, title, url.as_deref());
    }

    fn replace_state(&mut self, state: HistoryState, title: &str, url: Option<&str>) {
        let was_tracking = self.state.text_fragment_hash.is_some();
        let url = self.preserve_text_fragment(url);
        if std::mem::take(&mut self.state.skip_initial_replace)
            && was_tracking
            && self.destination_path_query(url.as_deref()).as_deref()
                == Some(self.state.initial_path_query.as_str())
        {
            debug!(
                "suppressed initial replaceState to {} to keep the text highlight",
                self.state.initial_path_query
            );
            return;
        }
        self.platform.replace_state(state, title, url.as_deref());
    }

    fn forward(&mut self) {
        self.platform.forward();
    }

    fn back(&mut self) {
        self.platform.back();
    }

    fn history_go(&mut self, delta: i64) -> Result<()> {
        self.platform.go(delta);
        Ok(())
    }
}
