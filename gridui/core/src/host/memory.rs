//! In-memory host
//!
//! Records every call the manager makes and keeps a per-session counter that
//! increments the way a game server does. Used by the demo and by tests.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use super::{next_container_id, ContainerHandle, ContainerHost, SessionId};
use crate::display::Decoration;
use crate::manager::ClickFailure;

/// One recorded host call
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A container was opened
    Rendered {
        /// The container
        handle: ContainerHandle,
        /// Title shown to the client
        title: String,
    },
    /// A container was closed by the manager
    Closed {
        /// The container
        handle: ContainerHandle,
    },
    /// The manager overwrote the container counter
    CounterSet {
        /// Session whose counter changed
        session: SessionId,
        /// New counter value
        value: i32,
    },
}

/// Contents of the container currently shown to a session
#[derive(Debug, Clone)]
pub struct OpenContainer<D> {
    /// Handle returned from `render_container`
    pub handle: ContainerHandle,
    /// Title shown to the client
    pub title: String,
    /// Slot contents
    pub slots: Vec<Option<D>>,
}

#[derive(Debug)]
struct MemoryHostState<D> {
    counters: HashMap<SessionId, i32>,
    open: HashMap<SessionId, OpenContainer<D>>,
    locked: HashSet<SessionId>,
    events: Vec<HostEvent>,
    failures: Vec<ClickFailure>,
}

impl<D> Default for MemoryHostState<D> {
    fn default() -> Self {
        Self {
            counters: HashMap::new(),
            open: HashMap::new(),
            locked: HashSet::new(),
            events: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Host that keeps containers in memory
#[derive(Debug)]
pub struct MemoryHost<D> {
    state: Mutex<MemoryHostState<D>>,
}

impl<D> Default for MemoryHost<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> MemoryHost<D> {
    /// Create a host with no sessions
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryHostState::default()),
        }
    }

    /// Make `can_replace` answer `false` for a session (e.g. the player is in a crafting menu)
    pub fn lock_replacement(&self, session: SessionId, locked: bool) {
        let mut state = self.state.lock();
        if locked {
            state.locked.insert(session);
        } else {
            state.locked.remove(&session);
        }
    }

    /// Every recorded call, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<HostEvent> {
        self.state.lock().events.clone()
    }

    /// Number of containers rendered for a session
    #[must_use]
    pub fn render_count(&self, session: SessionId) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| matches!(e, HostEvent::Rendered { handle, .. } if handle.session == session))
            .count()
    }

    /// Number of containers the manager closed for a session
    #[must_use]
    pub fn close_count(&self, session: SessionId) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| matches!(e, HostEvent::Closed { handle } if handle.session == session))
            .count()
    }

    /// Failures reported by the manager
    #[must_use]
    pub fn failures(&self) -> Vec<ClickFailure> {
        self.state.lock().failures.clone()
    }

    /// Forget a session's open container, as the client would on disconnect
    pub fn disconnect(&self, session: SessionId) {
        let mut state = self.state.lock();
        state.open.remove(&session);
        state.counters.remove(&session);
        state.locked.remove(&session);
    }
}

impl<D: Clone> MemoryHost<D> {
    /// The container a session currently sees
    #[must_use]
    pub fn open_container(&self, session: SessionId) -> Option<OpenContainer<D>> {
        self.state.lock().open.get(&session).cloned()
    }

    /// Display in one slot of the session's open container
    #[must_use]
    pub fn slot(&self, session: SessionId, index: usize) -> Option<D> {
        self.state
            .lock()
            .open
            .get(&session)
            .and_then(|c| c.slots.get(index).cloned().flatten())
    }
}

impl<D: Decoration> ContainerHost for MemoryHost<D> {
    type Display = D;

    fn render_container(&self, session: SessionId, title: &str, slot_count: usize) -> ContainerHandle {
        let mut state = self.state.lock();
        let counter = state.counters.entry(session).or_insert(0);
        *counter = next_container_id(*counter);
        let handle = ContainerHandle {
            session,
            container_id: *counter,
            slot_count,
        };
        state.open.insert(
            session,
            OpenContainer {
                handle,
                title: title.to_string(),
                slots: vec![None; slot_count],
            },
        );
        state.events.push(HostEvent::Rendered {
            handle,
            title: title.to_string(),
        });
        handle
    }

    fn update_slot(&self, handle: &ContainerHandle, index: usize, display: Option<&D>) {
        let mut state = self.state.lock();
        let Some(container) = state.open.get_mut(&handle.session) else {
            return;
        };
        if container.handle != *handle {
            return;
        }
        if let Some(slot) = container.slots.get_mut(index) {
            *slot = display.cloned();
        }
    }

    fn close_container(&self, handle: &ContainerHandle) {
        let mut state = self.state.lock();
        if state
            .open
            .get(&handle.session)
            .is_some_and(|c| c.handle == *handle)
        {
            state.open.remove(&handle.session);
        }
        state.events.push(HostEvent::Closed { handle: *handle });
    }

    fn container_counter(&self, session: SessionId) -> i32 {
        self.state.lock().counters.get(&session).copied().unwrap_or(0)
    }

    fn set_container_counter(&self, session: SessionId, value: i32) {
        let mut state = self.state.lock();
        state.counters.insert(session, value);
        state.events.push(HostEvent::CounterSet { session, value });
    }

    fn can_replace(&self, session: SessionId) -> bool {
        !self.state.lock().locked.contains(&session)
    }

    fn report_click_failure(&self, failure: &ClickFailure) {
        self.state.lock().failures.push(failure.clone());
    }
}
