//! Host Collaborator Interface
//!
//! The host owns the connected sessions, the client-visible containers and
//! the per-session container-id counter. The manager talks to it only
//! through [`ContainerHost`].
//!
//! # Container ids
//!
//! The host hands out container ids from a per-session counter that cycles
//! through `1..=100`, incrementing once per rendered container. The manager
//! reads and writes that counter during a forceful open, so it must advance
//! it exactly the way the host does: see [`next_container_id`].

mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::display::Decoration;
use crate::manager::ClickFailure;

pub use memory::{HostEvent, MemoryHost, OpenContainer};

/// Size of the host's container-id cycle
pub const CONTAINER_ID_CYCLE: i32 = 100;

/// The id the host assigns after `current`
#[must_use]
pub fn next_container_id(current: i32) -> i32 {
    current.rem_euclid(CONTAINER_ID_CYCLE) + 1
}

/// Opaque identity of a connected client
///
/// Stable for the lifetime of the connection; used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a host-provided UUID
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0.simple())
    }
}

/// A container the host rendered for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerHandle {
    /// Session the container is shown to
    pub session: SessionId,
    /// Id the host assigned from its counter
    pub container_id: i32,
    /// Number of addressable slots
    pub slot_count: usize,
}

/// Host-side operations the manager drives
///
/// All calls are expected to be fast and non-blocking. The manager makes them
/// while holding the affected session's lock, so implementations must not
/// call back into the manager.
pub trait ContainerHost: Send + Sync {
    /// Display type shown in container slots
    type Display: Decoration;

    /// Open a new container, taking the next id from the session's counter
    fn render_container(&self, session: SessionId, title: &str, slot_count: usize) -> ContainerHandle;

    /// Show `display` (or nothing) in one slot
    fn update_slot(&self, handle: &ContainerHandle, index: usize, display: Option<&Self::Display>);

    /// Close a container previously returned by `render_container`
    fn close_container(&self, handle: &ContainerHandle);

    /// Current value of the session's container-id counter
    fn container_counter(&self, session: SessionId) -> i32;

    /// Overwrite the session's container-id counter
    fn set_container_counter(&self, session: SessionId, value: i32);

    /// Whether the currently shown container may be replaced by a plain open
    fn can_replace(&self, _session: SessionId) -> bool {
        true
    }

    /// Told about every click handler that failed
    fn report_click_failure(&self, _failure: &ClickFailure) {}
}
