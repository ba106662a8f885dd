//! Minimal dependency-tracked reactive runtime.
//!
//! Effects record every [`Signal`] they read while running. Writing a
//! different value into a signal schedules the effects that read it on their
//! last run; the flush runs them in creation order. Nothing here is shared
//! across threads.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use log::error;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct SignalId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct EffectId(usize);

type EffectFn = Rc<RefCell<dyn FnMut() -> Result<()>>>;

struct EffectSlot {
    label: String,
    run: EffectFn,
    sources: HashSet<SignalId>,
}

struct RuntimeState {
    next_signal_id: usize,
    next_effect_id: usize,
    effects: BTreeMap<EffectId, EffectSlot>,
    subscribers: HashMap<SignalId, BTreeSet<EffectId>>,
    // `None` frames come from `untracked`.
    tracking: Vec<Option<EffectId>>,
    pending: BTreeSet<EffectId>,
    batch_depth: usize,
    flushing: bool,
    effect_step_limit: usize,
    errors: Vec<Error>,
}

#[derive(Clone)]
pub struct Runtime {
    state: Rc<RefCell<RuntimeState>>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Runtime")
            .field("effects", &state.effects.len())
            .field("pending", &state.pending.len())
            .field("batch_depth", &state.batch_depth)
            .finish()
    }
}

/// Non-owning runtime handle. Signals and components hold this so that effect
/// closures stored in the runtime do not keep it alive.
#[derive(Clone)]
pub(crate) struct WeakRuntime(Weak<RefCell<RuntimeState>>);

impl WeakRuntime {
    pub(crate) fn upgrade(&self) -> Option<Runtime> {
        self.0.upgrade().map(|state| Runtime { state })
    }

    /// [`Runtime::untracked`], or a plain call once the runtime is gone.
    pub(crate) fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        match self.upgrade() {
            Some(runtime) => runtime.untracked(f),
            None => f(),
        }
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(RuntimeState {
                next_signal_id: 0,
                next_effect_id: 0,
                effects: BTreeMap::new(),
                subscribers: HashMap::new(),
                tracking: Vec::new(),
                pending: BTreeSet::new(),
                batch_depth: 0,
                flushing: false,
                effect_step_limit: 10_000,
                errors: Vec::new(),
            })),
        }
    }

    pub fn signal<T: Clone + PartialEq + 'static>(&self, value: T) -> Signal<T> {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = SignalId(state.next_signal_id);
            state.next_signal_id += 1;
            id
        };
        Signal {
            id,
            value: Rc::new(RefCell::new(value)),
            runtime: self.downgrade(),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakRuntime {
        WeakRuntime(Rc::downgrade(&self.state))
    }

    /// Registers an effect and schedules its first run. Outside a batch the
    /// first run happens before this returns.
    pub fn create_effect(
        &self,
        label: impl Into<String>,
        run: impl FnMut() -> Result<()> + 'static,
    ) -> EffectHandle {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = EffectId(state.next_effect_id);
            state.next_effect_id += 1;
            state.effects.insert(
                id,
                EffectSlot {
                    label: label.into(),
                    run: Rc::new(RefCell::new(run)),
                    sources: HashSet::new(),
                },
            );
            state.pending.insert(id);
            id
        };
        self.flush_if_idle();
        EffectHandle {
            id,
            runtime: self.clone(),
        }
    }

    /// Runs `f` with scheduling deferred; effects dirtied inside run once,
    /// after `f` returns.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.state.borrow_mut().batch_depth += 1;
        let out = f();
        self.state.borrow_mut().batch_depth -= 1;
        self.flush_if_idle();
        out
    }

    /// Runs `f` without recording the signals it reads.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        self.state.borrow_mut().tracking.push(None);
        let out = f();
        self.state.borrow_mut().tracking.pop();
        out
    }

    pub fn set_effect_step_limit(&self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Config(
                "set_effect_step_limit requires at least 1 step".into(),
            ));
        }
        self.state.borrow_mut().effect_step_limit = max_steps;
        Ok(())
    }

    /// Errors returned by effects since the last call.
    pub fn take_errors(&self) -> Vec<Error> {
        std::mem::take(&mut self.state.borrow_mut().errors)
    }

    pub fn pending_effects(&self) -> usize {
        self.state.borrow().pending.len()
    }

    fn track(&self, signal: SignalId) {
        let mut state = self.state.borrow_mut();
        let Some(Some(effect)) = state.tracking.last().copied() else {
            return;
        };
        let Some(slot) = state.effects.get_mut(&effect) else {
            return;
        };
        slot.sources.insert(signal);
        state.subscribers.entry(signal).or_default().insert(effect);
    }

    fn notify(&self, signal: SignalId) {
        {
            let mut state = self.state.borrow_mut();
            let Some(dependents) = state.subscribers.get(&signal).cloned() else {
                return;
            };
            state.pending.extend(dependents);
        }
        self.flush_if_idle();
    }

    fn flush_if_idle(&self) {
        let idle = {
            let state = self.state.borrow();
            state.batch_depth == 0 && !state.flushing
        };
        if idle {
            self.flush();
        }
    }

    fn flush(&self) {
        self.state.borrow_mut().flushing = true;
        let mut steps = 0usize;
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let Some(effect) = state.pending.pop_first() else {
                    break;
                };
                if steps >= state.effect_step_limit {
                    let label = state
                        .effects
                        .get(&effect)
                        .map(|slot| slot.label.clone())
                        .unwrap_or_default();
                    let limit = state.effect_step_limit;
                    state.pending.clear();
                    let err = Error::EffectLoop { label, limit };
                    error!("{err}");
                    state.errors.push(err);
                    break;
                }
                effect
            };
            steps += 1;
            self.run_effect(next);
        }
        self.state.borrow_mut().flushing = false;
    }

    fn run_effect(&self, effect: EffectId) {
        let (label, run) = {
            let mut state = self.state.borrow_mut();
            let Some(slot) = state.effects.get_mut(&effect) else {
                return;
            };
            let sources = std::mem::take(&mut slot.sources);
            let label = slot.label.clone();
            let run = Rc::clone(&slot.run);
            for source in sources {
                if let Some(dependents) = state.subscribers.get_mut(&source) {
                    dependents.remove(&effect);
                }
            }
            state.tracking.push(Some(effect));
            (label, run)
        };

        let outcome = (run.borrow_mut())();

        let mut state = self.state.borrow_mut();
        state.tracking.pop();
        if let Err(err) = outcome {
            error!("effect `{label}` failed: {err}");
            state.errors.push(err);
        }
    }

    fn dispose(&self, effect: EffectId) {
        let mut state = self.state.borrow_mut();
        let Some(slot) = state.effects.remove(&effect) else {
            return;
        };
        for source in slot.sources {
            if let Some(dependents) = state.subscribers.get_mut(&source) {
                dependents.remove(&effect);
            }
        }
        state.pending.remove(&effect);
    }

    fn is_registered(&self, effect: EffectId) -> bool {
        self.state.borrow().effects.contains_key(&effect)
    }
}

/// Owner handle of a registered effect.
pub struct EffectHandle {
    id: EffectId,
    runtime: Runtime,
}

impl EffectHandle {
    pub fn is_active(&self) -> bool {
        self.runtime.is_registered(self.id)
    }

    pub fn dispose(self) {
        self.runtime.dispose(self.id);
    }
}

impl fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectHandle")
            .field("id", &self.id.0)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A reactive cell. Cloning yields another handle to the same cell.
pub struct Signal<T> {
    id: SignalId,
    value: Rc<RefCell<T>>,
    runtime: WeakRuntime,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Rc::clone(&self.value),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id.0)
            .field("value", &self.value.borrow())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub fn get(&self) -> T {
        self.track();
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.value.borrow())
    }

    pub fn get_untracked(&self) -> T {
        self.value.borrow().clone()
    }

    /// Stores `value` and schedules dependents, unless it equals the current
    /// value.
    pub fn set(&self, value: T) {
        if *self.value.borrow() == value {
            return;
        }
        *self.value.borrow_mut() = value;
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.notify(self.id);
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.value.borrow().clone();
        f(&mut next);
        self.set(next);
    }

    fn track(&self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.track(self.id);
        }
    }
}
