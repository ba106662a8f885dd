use std::fmt;
use std::rc::Rc;

use crate::location::LocationParts;
use crate::text_fragment::FragmentDirective;
use crate::{Error, Result};

pub type HistoryState = serde_json::Value;

pub type LocationListener = Rc<dyn Fn(&LocationChangeEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationEventKind {
    PopState,
    HashChange,
}

impl LocationEventKind {
    pub fn event_type(self) -> &'static str {
        match self {
            Self::PopState => "popstate",
            Self::HashChange => "hashchange",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationChangeEvent {
    pub kind: LocationEventKind,
    pub state: HistoryState,
    pub old_url: String,
    pub new_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) usize);

/// Native history/location surface of a browsing context.
///
/// Methods take `&self`: listeners registered here are handed back to the
/// platform from unsubscribe handles, so implementations use interior
/// mutability.
pub trait BrowserPlatform {
    fn location(&self) -> LocationParts;

    /// `new URL(input, base)`; `None` when either side does not parse.
    fn resolve_url(&self, input: &str, base: &str) -> Option<LocationParts> {
        LocationParts::parse(base)?.resolve(input)
    }

    fn history_state(&self) -> HistoryState;

    fn push_state(&self, state: HistoryState, title: &str, url: Option<&str>);

    fn replace_state(&self, state: HistoryState, title: &str, url: Option<&str>);

    fn forward(&self);

    fn back(&self);

    fn go(&self, delta: i64);

    /// URL of the navigation timing entry for the current document.
    fn navigation_entry_url(&self) -> Option<String>;

    fn fragment_directive(&self) -> Option<FragmentDirective>;

    /// Raw `href` of the document's `<base>` element.
    fn base_href(&self) -> Option<String>;

    fn add_listener(&self, kind: LocationEventKind, listener: LocationListener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// Handle returned by listener registration. Dropping it keeps the listener.
pub struct Unsubscribe(Option<Box<dyn FnOnce()>>);

impl Unsubscribe {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    pub fn unsubscribe(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("pending", &self.0.is_some())
            .finish()
    }
}

/// Location surface consumed by a routing service.
pub trait PlatformLocation {
    fn base_href_from_dom(&self) -> Option<String>;

    fn state(&self) -> HistoryState;

    fn on_pop_state(&self, listener: LocationListener) -> Unsubscribe;

    fn on_hash_change(&self, listener: LocationListener) -> Unsubscribe;

    fn href(&self) -> String;

    fn protocol(&self) -> String;

    fn hostname(&self) -> String;

    fn port(&self) -> String;

    fn pathname(&self) -> String;

    fn search(&self) -> String;

    fn hash(&self) -> String;

    fn push_state(&mut self, state: HistoryState, title: &str, url: Option<&str>);

    fn replace_state(&mut self, state: HistoryState, title: &str, url: Option<&str>);

    fn forward(&mut self);

    fn back(&mut self);

    fn history_go(&mut self, _delta: i64) -> Result<()> {
        Err(Error::NotImplemented("history_go"))
    }

    /// `historyGo()` with its default offset: reload the current entry.
    fn reload_current_entry(&mut self) -> Result<()> {
        self.history_go(0)
    }
}
