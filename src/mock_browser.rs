use std::cell::RefCell;
use std::collections::VecDeque;

use crate::location::LocationParts;
use crate::platform::{
    BrowserPlatform, HistoryState, ListenerId, LocationChangeEvent, LocationEventKind,
    LocationListener,
};
use crate::text_fragment::FragmentDirective;
use crate::{Error, Result};

/// Native history operation observed by [`MockBrowser`].
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    PushState { url: String, state: HistoryState },
    ReplaceState { url: String, state: HistoryState },
    Go(i64),
    Forward,
    Back,
}

#[derive(Debug, Clone, PartialEq)]
struct HistoryEntry {
    url: String,
    state: HistoryState,
}

#[derive(Clone)]
struct RegisteredListener {
    id: ListenerId,
    kind: LocationEventKind,
    callback: LocationListener,
}

#[derive(Default)]
struct ListenerStore {
    next_id: usize,
    listeners: Vec<RegisteredListener>,
}

impl ListenerStore {
    fn add(&mut self, kind: LocationEventKind, callback: LocationListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(RegisteredListener { id, kind, callback });
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let Some(pos) = self.listeners.iter().position(|listener| listener.id == id) else {
            return false;
        };
        self.listeners.remove(pos);
        true
    }

    fn get(&self, kind: LocationEventKind) -> Vec<LocationListener> {
        self.listeners
            .iter()
            .filter(|listener| listener.kind == kind)
            .map(|listener| listener.callback.clone())
            .collect()
    }
}

struct TraceState {
    enabled: bool,
    logs: VecDeque<String>,
    log_limit: usize,
    to_stderr: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: false,
        }
    }
}

struct MockBrowserState {
    location: LocationParts,
    history_entries: Vec<HistoryEntry>,
    history_index: usize,
    reload_count: usize,
    navigation_entry_url: Option<String>,
    fragment_directive: Option<FragmentDirective>,
    base_href: Option<String>,
    listeners: ListenerStore,
    native_calls: Vec<NativeCall>,
    trace: TraceState,
}

/// In-memory browsing context: one history stack, one location, listeners
/// for `popstate`/`hashchange`, and a log of every native call made on it.
pub struct MockBrowser {
    state: RefCell<MockBrowserState>,
}

impl MockBrowser {
    pub fn new(url: &str) -> Result<Self> {
        let location =
            LocationParts::parse(url).ok_or_else(|| Error::InvalidUrl(url.to_string()))?;
        let href = location.href();
        Ok(Self {
            state: RefCell::new(MockBrowserState {
                location,
                history_entries: vec![HistoryEntry {
                    url: href.clone(),
                    state: HistoryState::Null,
                }],
                history_index: 0,
                reload_count: 0,
                navigation_entry_url: Some(href),
                fragment_directive: None,
                base_href: None,
                listeners: ListenerStore::default(),
                native_calls: Vec::new(),
                trace: TraceState::default(),
            }),
        })
    }

    pub fn with_navigation_entry_url(self, url: Option<&str>) -> Self {
        self.state.borrow_mut().navigation_entry_url = url.map(str::to_string);
        self
    }

    pub fn with_fragment_directive(self, directive: FragmentDirective) -> Self {
        self.state.borrow_mut().fragment_directive = Some(directive);
        self
    }

    pub fn with_base_href(self, href: &str) -> Self {
        self.state.borrow_mut().base_href = Some(href.to_string());
        self
    }

    /// Removes a `:~:` directive from the visible URL, as browsers do once
    /// they have applied it.
    pub fn strip_fragment_directive(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(pos) = state.location.hash.find(":~:") {
            let kept = state.location.hash[..pos].to_string();
            state.location.set_hash(&kept);
            let href = state.location.href();
            let index = state.history_index;
            state.history_entries[index].url = href;
        }
    }

    /// User-driven fragment navigation: a new entry plus `popstate` and
    /// `hashchange`.
    pub fn navigate_hash(&self, hash: &str) {
        let (old_url, new_url) = {
            let mut state = self.state.borrow_mut();
            let old_url = state.location.href();
            state.location.set_hash(hash);
            let new_url = state.location.href();
            state.push_entry(&new_url, HistoryState::Null);
            (old_url, new_url)
        };
        self.trace_line(format!("[nav] hash {old_url} -> {new_url}"));
        if old_url != new_url {
            self.dispatch(LocationEventKind::PopState, HistoryState::Null, &old_url, &new_url);
            self.dispatch(LocationEventKind::HashChange, HistoryState::Null, &old_url, &new_url);
        }
    }

    pub fn native_calls(&self) -> Vec<NativeCall> {
        self.state.borrow().native_calls.clone()
    }

    pub fn replace_state_calls(&self) -> usize {
        self.state
            .borrow()
            .native_calls
            .iter()
            .filter(|call| matches!(call, NativeCall::ReplaceState { .. }))
            .count()
    }

    pub fn push_state_calls(&self) -> usize {
        self.state
            .borrow()
            .native_calls
            .iter()
            .filter(|call| matches!(call, NativeCall::PushState { .. }))
            .count()
    }

    pub fn history_len(&self) -> usize {
        self.state.borrow().history_entries.len()
    }

    pub fn history_index(&self) -> usize {
        self.state.borrow().history_index
    }

    pub fn reload_count(&self) -> usize {
        self.state.borrow().reload_count
    }

    pub fn href(&self) -> String {
        self.state.borrow().location.href()
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.listeners.len()
    }

    pub fn enable_trace(&self, enabled: bool) {
        self.state.borrow_mut().trace.enabled = enabled;
    }

    pub fn set_trace_stderr(&self, enabled: bool) {
        self.state.borrow_mut().trace.to_stderr = enabled;
    }

    pub fn take_trace_logs(&self) -> Vec<String> {
        self.state.borrow_mut().trace.logs.drain(..).collect()
    }

    pub fn set_trace_log_limit(&self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Config(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        let mut state = self.state.borrow_mut();
        state.trace.log_limit = max_entries;
        while state.trace.logs.len() > max_entries {
            state.trace.logs.pop_front();
        }
        Ok(())
    }

    fn trace_line(&self, line: String) {
        let mut state = self.state.borrow_mut();
        let trace = &mut state.trace;
        if !trace.enabled {
            return;
        }
        if trace.to_stderr {
            eprintln!("{line}");
        }
        if trace.logs.len() >= trace.log_limit {
            trace.logs.pop_front();
        }
        trace.logs.push_back(line);
    }

    fn dispatch(&self, kind: LocationEventKind, state: HistoryState, old_url: &str, new_url: &str) {
        // Listeners may call back into the browser; never hold the borrow.
        let listeners = self.state.borrow().listeners.get(kind);
        if listeners.is_empty() {
            return;
        }
        self.trace_line(format!(
            "[event] {} x{} -> {new_url}",
            kind.event_type(),
            listeners.len()
        ));
        let event = LocationChangeEvent {
            kind,
            state,
            old_url: old_url.to_string(),
            new_url: new_url.to_string(),
        };
        for listener in listeners {
            listener(&event);
        }
    }

    fn resolve_target(&self, url: Option<&str>) -> Option<String> {
        let state = self.state.borrow();
        match url {
            None => Some(state.location.href()),
            Some(url) => state.location.resolve(url).map(|parts| parts.href()),
        }
    }

    fn traverse(&self, delta: i64) {
        let traversal = {
            let mut state = self.state.borrow_mut();
            if delta == 0 {
                state.reload_count += 1;
                None
            } else {
                let target = (state.history_index as i64).saturating_add(delta);
                if target < 0 || target >= state.history_entries.len() as i64 {
                    None
                } else {
                    let old_url = state.location.href();
                    state.history_index = target as usize;
                    let entry = state.history_entries[state.history_index].clone();
                    if let Some(parts) = LocationParts::parse(&entry.url) {
                        state.location = parts;
                    }
                    Some((old_url, entry))
                }
            }
        };

        let Some((old_url, entry)) = traversal else {
            self.trace_line(format!("[history] go({delta}) stays on current entry"));
            return;
        };
        self.trace_line(format!("[history] go({delta}) -> {}", entry.url));
        self.dispatch(LocationEventKind::PopState, entry.state, &old_url, &entry.url);
        if is_hash_only_navigation(&old_url, &entry.url) {
            self.dispatch(
                LocationEventKind::HashChange,
                HistoryState::Null,
                &old_url,
                &entry.url,
            );
        }
    }
}

impl MockBrowserState {
    fn push_entry(&mut self, url: &str, state: HistoryState) {
        let next = self
            .history_index
            .saturating_add(1)
            .min(self.history_entries.len());
        self.history_entries.truncate(next);
        self.history_entries.push(HistoryEntry {
            url: url.to_string(),
            state,
        });
        self.history_index = self.history_entries.len().saturating_sub(1);
    }

    fn replace_current_entry(&mut self, url: &str, state: HistoryState) {
        let index = self
            .history_index
            .min(self.history_entries.len().saturating_sub(1));
        self.history_entries[index] = HistoryEntry {
            url: url.to_string(),
            state,
        };
        self.history_index = index;
    }

    fn commit_location(&mut self, url: &str) {
        if let Some(parts) = LocationParts::parse(url) {
            self.location = parts;
        }
    }
}

fn is_hash_only_navigation(from: &str, to: &str) -> bool {
    let (Some(from), Some(to)) = (LocationParts::parse(from), LocationParts::parse(to)) else {
        return false;
    };
    let mut from_without_hash = from.clone();
    from_without_hash.hash.clear();
    let mut to_without_hash = to.clone();
    to_without_hash.hash.clear();
    from_without_hash == to_without_hash && from.hash != to.hash
}

impl BrowserPlatform for MockBrowser {
    fn location(&self) -> LocationParts {
        self.state.borrow().location.clone()
    }

    fn history_state(&self) -> HistoryState {
        let state = self.state.borrow();
        state
            .history_entries
            .get(state.history_index)
            .map(|entry| entry.state.clone())
            .unwrap_or(HistoryState::Null)
    }

    fn push_state(&self, state: HistoryState, _title: &str, url: Option<&str>) {
        let Some(next_url) = self.resolve_target(url) else {
            self.trace_line(format!("[history] pushState rejected {url:?}"));
            return;
        };
        {
            let mut browser = self.state.borrow_mut();
            browser.native_calls.push(NativeCall::PushState {
                url: next_url.clone(),
                state: state.clone(),
            });
            browser.push_entry(&next_url, state);
            browser.commit_location(&next_url);
        }
        self.trace_line(format!("[history] pushState {next_url}"));
    }

    fn replace_state(&self, state: HistoryState, _title: &str, url: Option<&str>) {
        let Some(next_url) = self.resolve_target(url) else {
            self.trace_line(format!("[history] replaceState rejected {url:?}"));
            return;
        };
        {
            let mut browser = self.state.borrow_mut();
            browser.native_calls.push(NativeCall::ReplaceState {
                url: next_url.clone(),
                state: state.clone(),
            });
            browser.replace_current_entry(&next_url, state);
            browser.commit_location(&next_url);
        }
        self.trace_line(format!("[history] replaceState {next_url}"));
    }

    fn forward(&self) {
        self.state.borrow_mut().native_calls.push(NativeCall::Forward);
        self.traverse(1);
    }

    fn back(&self) {
        self.state.borrow_mut().native_calls.push(NativeCall::Back);
        self.traverse(-1);
    }

    fn go(&self, delta: i64) {
        self.state.borrow_mut().native_calls.push(NativeCall::Go(delta));
        self.traverse(delta);
    }

    fn navigation_entry_url(&self) -> Option<String> {
        self.state.borrow().navigation_entry_url.clone()
    }

    fn fragment_directive(&self) -> Option<FragmentDirective> {
        self.state.borrow().fragment_directive.clone()
    }

    fn base_href(&self) -> Option<String> {
        self.state.borrow().base_href.clone()
    }

    fn add_listener(&self, kind: LocationEventKind, listener: LocationListener) -> ListenerId {
        self.state.borrow_mut().listeners.add(kind, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.state.borrow_mut().listeners.remove(id)
    }
}
