//! UI Manager - Session Navigation and Click Dispatch
//!
//! The manager keeps, per connected session, the page currently shown and
//! the stack of pages it was reached through. It turns host click reports
//! into button invocations and opens, replaces and closes host containers.
//!
//! # Architecture
//!
//! ```text
//!                        UiManager
//!            ┌────────────────────────────────────────┐
//!            │ RwLock<HashMap<SessionId, Arc<Mutex<   │
//!            │     SessionState { history, container, │
//!            │                    transitioning }>>>> │
//!            └───────────────────┬────────────────────┘
//!                                │ ContainerHost
//!           render / update_slot / close / counter get+set
//! ```
//!
//! # Thread Safety
//!
//! Only the registry map is shared between sessions. Each session's state
//! sits behind its own mutex, so operations on different sessions never
//! contend beyond a registry lookup. No lock is held while page callbacks or
//! click handlers run: a handler may call straight back into the manager.
//!
//! # Stale clicks
//!
//! A forceful open advances the host's container-id counter past the id of
//! the container being torn down before rendering the replacement. Clicks
//! the client sends for the old container therefore carry an id that no
//! longer matches and are dropped instead of landing on whatever button the
//! new page has in the same slot. A soft open (same title and shape) skips
//! the close but still redraws, so it retires the old id the same way.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::button::{ButtonAction, ClickType, Navigation};
use crate::config::DispatchConfig;
use crate::host::{next_container_id, ContainerHandle, ContainerHost, SessionId};
use crate::page::{CloseReason, Page, PageId};

/// A click reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// Container id the client attached to the click, if the host knows it
    pub container_id: Option<i32>,
    /// Container slot that was clicked
    pub slot: usize,
    /// Click modifier
    pub click: ClickType,
}

impl ClickEvent {
    /// A click on the session's current container
    #[must_use]
    pub fn new(slot: usize, click: ClickType) -> Self {
        Self {
            container_id: None,
            slot,
            click,
        }
    }

    /// Tag the click with the container id the client reported
    #[must_use]
    pub fn in_container(mut self, container_id: i32) -> Self {
        self.container_id = Some(container_id);
        self
    }
}

/// A click handler that returned an error or panicked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickFailure {
    /// Session that clicked
    pub session: SessionId,
    /// Page the button belongs to
    pub page: PageId,
    /// Slot that was clicked
    pub slot: usize,
    /// Click modifier
    pub click: ClickType,
    /// Error or panic message
    pub message: String,
    /// Whether the handler panicked rather than returning an error
    pub panicked: bool,
}

/// Result of `open` / `open_forcefully`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The page is now shown
    Opened,
    /// The page was already shown; nothing changed
    AlreadyOpen,
    /// The host refused to replace its current container
    Refused,
}

/// Result of `back`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// The previous page is shown again
    Returned,
    /// There was no previous page, so the container was closed
    Closed,
    /// The session had no page open
    NotOpen,
}

/// What happened to a click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A button handled the click
    Dispatched,
    /// A button's handler failed; the failure was logged and reported
    Failed,
    /// Nothing occupies the clicked slot
    Empty,
    /// The click targeted a container that was already replaced
    Stale,
    /// The click arrived while the page was being replaced
    InTransition,
    /// The session has no open page
    NoPage,
}

/// Snapshot of the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSummary {
    /// Sessions with state in the registry
    pub sessions: usize,
    /// Sessions currently showing a page
    pub open: usize,
}

struct SessionState<D> {
    history: Vec<Arc<Page<D>>>,
    container: Option<ContainerHandle>,
    transitioning: bool,
}

impl<D> SessionState<D> {
    fn new() -> Self {
        Self {
            history: Vec::new(),
            container: None,
            transitioning: false,
        }
    }

    fn current(&self) -> Option<&Arc<Page<D>>> {
        self.container.and(self.history.last())
    }

    /// Reopening an ancestor truncates back to it. A soft open takes the
    /// place of the top entry instead of stacking on it.
    fn push(&mut self, page: Arc<Page<D>>, soft: bool) {
        match self.history.iter().position(|p| p.id() == page.id()) {
            Some(index) => self.history.truncate(index + 1),
            None => {
                if soft {
                    self.history.pop();
                }
                self.history.push(page);
            }
        }
    }

    fn clear(&mut self) -> Option<(Arc<Page<D>>, ContainerHandle)> {
        let container = self.container.take()?;
        let page = self.history.pop()?;
        self.history.clear();
        Some((page, container))
    }
}

type SessionEntry<D> = Arc<Mutex<SessionState<D>>>;

/// Per-session page navigation and click dispatch
pub struct UiManager<H: ContainerHost> {
    host: Arc<H>,
    config: DispatchConfig,
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry<H::Display>>>>,
}

impl<H: ContainerHost> Clone for UiManager<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            config: self.config.clone(),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<H: ContainerHost> UiManager<H> {
    /// Create a manager with default dispatch settings
    #[must_use]
    pub fn new(host: Arc<H>) -> Self {
        Self::with_config(host, DispatchConfig::default())
    }

    /// Create a manager with explicit dispatch settings
    #[must_use]
    pub fn with_config(host: Arc<H>, config: DispatchConfig) -> Self {
        Self {
            host,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The host this manager drives
    #[must_use]
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Show `page` to a session
    ///
    /// Re-opening the page already shown is a no-op. If the host will not let
    /// its current container be replaced the call is refused.
    pub fn open(&self, session: SessionId, page: Arc<Page<H::Display>>) -> OpenOutcome {
        self.show(session, page, false)
    }

    /// Show `page`, tearing down whatever the session has open
    ///
    /// Ignores the host's replace guard and advances the container-id counter
    /// so clicks for the torn-down container can never reach `page`.
    pub fn open_forcefully(&self, session: SessionId, page: Arc<Page<H::Display>>) -> OpenOutcome {
        self.show(session, page, true)
    }

    /// Return to the previous page, or close if there is none
    ///
    /// The previous page is opened forcefully and its `on_open` runs again.
    pub fn back(&self, session: SessionId) -> BackOutcome {
        let Some(entry) = self.lookup(session) else {
            return BackOutcome::NotOpen;
        };

        let (outgoing, previous) = {
            let mut state = entry.lock();
            let Some(old) = state.container else {
                return BackOutcome::NotOpen;
            };
            if state.history.len() < 2 {
                drop(state);
                self.close_with(session, CloseReason::Back);
                return BackOutcome::Closed;
            }
            let Some(outgoing) = state.history.pop() else {
                return BackOutcome::NotOpen;
            };
            let Some(previous) = state.history.last().cloned() else {
                return BackOutcome::NotOpen;
            };
            state.container = Some(self.force_container(session, Some(old), &previous));
            state.transitioning = true;
            (outgoing, previous)
        };

        info!(
            session = %session,
            from = %outgoing.id(),
            to = %previous.id(),
            "Navigated back"
        );
        self.finish_transition(session, &entry, Some((outgoing, CloseReason::Back)), &previous);
        BackOutcome::Returned
    }

    /// Close the session's container and forget its history
    ///
    /// Returns `false` if nothing was open.
    pub fn close(&self, session: SessionId) -> bool {
        self.close_with(session, CloseReason::Closed)
    }

    /// Push every slot of the current page to the host again
    ///
    /// Returns `false` if nothing was open.
    pub fn refresh(&self, session: SessionId) -> bool {
        let Some(entry) = self.lookup(session) else {
            return false;
        };
        let state = entry.lock();
        let (Some(page), Some(container)) = (state.current(), state.container) else {
            return false;
        };
        self.paint(&container, page);
        debug!(session = %session, page = %page.id(), "Page refreshed");
        true
    }

    // ========================================================================
    // Host events
    // ========================================================================

    /// Route a click to the button under the clicked slot
    ///
    /// Never fails: clicks on empty slots, on replaced containers or from
    /// sessions without a page are ignored, and handler failures are caught.
    pub fn handle_click(&self, session: SessionId, event: ClickEvent) -> ClickOutcome {
        let Some(entry) = self.lookup(session) else {
            return ClickOutcome::NoPage;
        };

        let (page, button) = {
            let state = entry.lock();
            let (Some(page), Some(container)) = (state.current(), state.container) else {
                return ClickOutcome::NoPage;
            };
            if state.transitioning {
                debug!(session = %session, slot = event.slot, "Click during page transition swallowed");
                return ClickOutcome::InTransition;
            }
            if event
                .container_id
                .is_some_and(|id| id != container.container_id)
            {
                warn!(
                    session = %session,
                    slot = event.slot,
                    click_container = ?event.container_id,
                    current_container = container.container_id,
                    "Dropped click for a replaced container"
                );
                return ClickOutcome::Stale;
            }
            let Some(button) = page.resolve(event.slot).cloned() else {
                return ClickOutcome::Empty;
            };
            (Arc::clone(page), button)
        };

        debug!(
            session = %session,
            page = %page.id(),
            slot = event.slot,
            click = %event.click,
            "Dispatching click"
        );

        let page_id = page.id();
        let mut action = ButtonAction::new(session, event.click, event.slot, page);
        let failure = match self.guarded(|| button.on_click(&mut action)) {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some((format!("{err:#}"), false)),
            Err(panic_message) => Some((panic_message, true)),
        };

        if let Some((message, panicked)) = failure {
            let failure = ClickFailure {
                session,
                page: page_id,
                slot: event.slot,
                click: event.click,
                message,
                panicked,
            };
            error!(
                session = %session,
                page = %page_id,
                slot = event.slot,
                panicked = panicked,
                error = %failure.message,
                "Click handler failed"
            );
            if self.config.report_failures {
                self.host.report_click_failure(&failure);
            }
            return ClickOutcome::Failed;
        }

        if let Some(navigation) = action.take_navigation() {
            self.navigate(session, navigation);
        }
        ClickOutcome::Dispatched
    }

    /// The client closed the container on its own
    ///
    /// Ids that don't match the current container are ignored. Returns
    /// whether state was cleared.
    pub fn handle_container_closed(&self, session: SessionId, container_id: i32) -> bool {
        let Some(entry) = self.lookup(session) else {
            return false;
        };
        let closed = {
            let mut state = entry.lock();
            if state.container.map(|c| c.container_id) != Some(container_id) {
                return false;
            }
            state.clear()
        };
        let Some((page, _)) = closed else {
            return false;
        };
        info!(session = %session, page = %page.id(), "Container closed by client");
        self.fire_close(session, &page, CloseReason::ClientClosed);
        true
    }

    /// Drop every trace of a session; safe to call more than once
    pub fn handle_session_end(&self, session: SessionId) {
        let Some(entry) = self.sessions.write().remove(&session) else {
            return;
        };
        let closed = entry.lock().clear();
        info!(session = %session, "Session ended");
        if let Some((page, _)) = closed {
            self.fire_close(session, &page, CloseReason::SessionEnded);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Page a session is looking at
    #[must_use]
    pub fn current_page(&self, session: SessionId) -> Option<Arc<Page<H::Display>>> {
        self.lookup(session)
            .and_then(|entry| entry.lock().current().cloned())
    }

    /// Container a session is looking at
    #[must_use]
    pub fn current_container(&self, session: SessionId) -> Option<ContainerHandle> {
        self.lookup(session).and_then(|entry| entry.lock().container)
    }

    /// Pages on the session's stack, current page included
    #[must_use]
    pub fn history_depth(&self, session: SessionId) -> usize {
        self.lookup(session)
            .map_or(0, |entry| entry.lock().history.len())
    }

    /// Whether a session is showing a page
    #[must_use]
    pub fn is_open(&self, session: SessionId) -> bool {
        self.current_page(session).is_some()
    }

    /// Sessions with state in the registry
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Registry snapshot
    #[must_use]
    pub fn summary(&self) -> ManagerSummary {
        let entries: Vec<SessionEntry<H::Display>> =
            self.sessions.read().values().cloned().collect();
        let open = entries
            .iter()
            .filter(|entry| entry.lock().container.is_some())
            .count();
        ManagerSummary {
            sessions: entries.len(),
            open,
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn lookup(&self, session: SessionId) -> Option<SessionEntry<H::Display>> {
        self.sessions.read().get(&session).cloned()
    }

    fn entry(&self, session: SessionId) -> SessionEntry<H::Display> {
        if let Some(entry) = self.lookup(session) {
            return entry;
        }
        let mut sessions = self.sessions.write();
        Arc::clone(
            sessions
                .entry(session)
                .or_insert_with(|| Arc::new(Mutex::new(SessionState::new()))),
        )
    }

    fn show(&self, session: SessionId, page: Arc<Page<H::Display>>, forceful: bool) -> OpenOutcome {
        let entry = self.entry(session);

        let outgoing = {
            let mut state = entry.lock();
            if state.current().is_some_and(|current| current.id() == page.id()) {
                debug!(session = %session, page = %page.id(), "Page already open");
                return OpenOutcome::AlreadyOpen;
            }
            if !forceful && state.container.is_some() && !self.host.can_replace(session) {
                warn!(session = %session, page = %page.id(), "Host refused to replace container");
                return OpenOutcome::Refused;
            }

            let outgoing = state.current().cloned();
            let (container, soft) = if forceful {
                (self.force_container(session, state.container, &page), false)
            } else {
                self.replace_container(session, state.container, outgoing.as_deref(), &page)
            };
            state.container = Some(container);
            state.push(Arc::clone(&page), soft);
            state.transitioning = true;

            info!(
                session = %session,
                page = %page.id(),
                container_id = container.container_id,
                forceful = forceful,
                soft = soft,
                depth = state.history.len(),
                "Page opened"
            );
            outgoing
        };

        let outgoing = outgoing.map(|page| (page, CloseReason::Replaced));
        self.finish_transition(session, &entry, outgoing, &page);
        OpenOutcome::Opened
    }

    /// Plain open: redraw over a container of identical shape, otherwise
    /// close and replace it
    ///
    /// The second value is `true` for a soft open. The old container is not
    /// closed, but the redraw still gets a fresh id from the host so clicks
    /// tagged with the old one are dropped as stale.
    fn replace_container(
        &self,
        session: SessionId,
        old: Option<ContainerHandle>,
        current: Option<&Page<H::Display>>,
        page: &Page<H::Display>,
    ) -> (ContainerHandle, bool) {
        let mut soft = false;
        if let (Some(old), Some(current)) = (old, current) {
            soft = old.slot_count == page.slot_count() && current.title() == page.title();
            if !soft {
                self.host.close_container(&old);
            }
        }
        let handle = self
            .host
            .render_container(session, page.title(), page.slot_count());
        if soft && old.is_some_and(|old| old.container_id == handle.container_id) {
            warn!(
                session = %session,
                container_id = handle.container_id,
                "Host reused a container id across a soft open"
            );
        }
        self.paint(&handle, page);
        (handle, soft)
    }

    /// Forceful open: tear down, advance the counter, render
    fn force_container(
        &self,
        session: SessionId,
        old: Option<ContainerHandle>,
        page: &Page<H::Display>,
    ) -> ContainerHandle {
        let stale = self.host.container_counter(session);
        if let Some(old) = old {
            self.host.close_container(&old);
        }
        self.host
            .set_container_counter(session, next_container_id(stale));

        let handle = self
            .host
            .render_container(session, page.title(), page.slot_count());
        let reused = handle.container_id == stale
            || old.is_some_and(|old| old.container_id == handle.container_id);
        if reused {
            warn!(
                session = %session,
                container_id = handle.container_id,
                "Host reused a container id across a forceful open"
            );
        }
        self.paint(&handle, page);
        handle
    }

    fn paint(&self, handle: &ContainerHandle, page: &Page<H::Display>) {
        for (index, display) in page.displays().enumerate() {
            self.host.update_slot(handle, index, display);
        }
    }

    fn close_with(&self, session: SessionId, reason: CloseReason) -> bool {
        let Some(entry) = self.lookup(session) else {
            return false;
        };
        let Some((page, container)) = entry.lock().clear() else {
            return false;
        };
        self.host.close_container(&container);
        info!(session = %session, page = %page.id(), reason = ?reason, "Page closed");
        self.fire_close(session, &page, reason);
        true
    }

    fn finish_transition(
        &self,
        session: SessionId,
        entry: &SessionEntry<H::Display>,
        outgoing: Option<(Arc<Page<H::Display>>, CloseReason)>,
        incoming: &Page<H::Display>,
    ) {
        let _transition = TransitionGuard(entry);
        if let Some((page, reason)) = outgoing {
            self.fire_close(session, &page, reason);
        }
        // on_close may already have navigated somewhere else
        let still_current = entry
            .lock()
            .current()
            .is_some_and(|page| page.id() == incoming.id());
        if !still_current {
            debug!(session = %session, page = %incoming.id(), "Page superseded before on_open");
            return;
        }
        if let Err(message) = self.guarded(|| incoming.fire_open(session)) {
            error!(session = %session, page = %incoming.id(), error = %message, "on_open callback panicked");
        }
    }

    fn fire_close(&self, session: SessionId, page: &Page<H::Display>, reason: CloseReason) {
        if let Err(message) = self.guarded(|| page.fire_close(session, reason)) {
            error!(session = %session, page = %page.id(), error = %message, "on_close callback panicked");
        }
    }

    fn navigate(&self, session: SessionId, navigation: Navigation<H::Display>) {
        // A handler may outlive its session; never recreate state for it.
        if self.lookup(session).is_none() {
            debug!(session = %session, ?navigation, "Navigation for ended session ignored");
            return;
        }
        match navigation {
            Navigation::Open(page) => {
                self.open(session, page);
            }
            Navigation::OpenForcefully(page) => {
                self.open_forcefully(session, page);
            }
            Navigation::Back => {
                self.back(session);
            }
            Navigation::Close => {
                self.close(session);
            }
            Navigation::Refresh => {
                self.refresh(session);
            }
        }
    }

    fn guarded<T>(&self, f: impl FnOnce() -> T) -> Result<T, String> {
        if !self.config.catch_panics {
            return Ok(f());
        }
        panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
    }
}

impl<H: ContainerHost> fmt::Debug for UiManager<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sessions = self.sessions.read();
        f.debug_struct("UiManager")
            .field("session_count", &sessions.len())
            .field("sessions", &sessions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Clears the session's transition flag however the callbacks exit
struct TransitionGuard<'a, D>(&'a SessionEntry<D>);

impl<D> Drop for TransitionGuard<'_, D> {
    fn drop(&mut self) {
        self.0.lock().transitioning = false;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
