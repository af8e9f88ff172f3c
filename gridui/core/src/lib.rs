//! GridUI Core - Server-Authoritative Grid Container UI
//!
//! Declarative menus drawn inside the fixed-size item containers a game
//! server shows its clients. Buttons are placed on templates, templates are
//! assembled into pages, and a [`UiManager`] tracks which page every
//! connected session is looking at and routes its clicks.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Host (game server)                   │
//! │   sessions · client containers · container-id counter        │
//! └──────────────┬──────────────────────────────▲────────────────┘
//!                │ clicks, closes, disconnects  │ ContainerHost
//!                ▼                              │
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          UiManager                           │
//! │  SessionId ─► { history: [Page], container, transitioning }  │
//! └──────────────┬───────────────────────────────────────────────┘
//!                │ resolve(slot)
//!                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Page ─► Template (rows x columns) ─► Button ─► display      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`GridButton`]: A decorated display with an optional click handler
//! - [`Template`]: Immutable slot-to-button grid, built with [`TemplateBuilder`]
//! - [`Page`]: Titled screen made of a primary and optional inventory template
//! - [`UiManager`]: Per-session navigation and click dispatch
//! - [`ContainerHost`]: What the manager needs from the game server
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use gridui_core::{GridButton, ItemDisplay, MemoryHost, Page, SessionId, Template, UiManager};
//!
//! let mut template = Template::builder(3)?;
//! template.border(0, 0, 2, 8, Arc::new(GridButton::of(ItemDisplay::new("minecraft:glass_pane"))))?;
//! let page = Page::builder().title("Main").template(template.build()).build()?;
//!
//! let manager = UiManager::new(Arc::new(MemoryHost::new()));
//! manager.open(SessionId::new(), page);
//! ```
//!
//! # Module Overview
//!
//! - [`button`]: Buttons, click types and the handler-side action
//! - [`config`]: TOML / environment configuration
//! - [`display`]: Display decoration and tooltip flags
//! - [`error`]: Construction errors
//! - [`host`]: Host collaborator trait and the in-memory host
//! - [`manager`]: Session navigation and click dispatch
//! - [`page`]: Pages and their lifecycle callbacks
//! - [`pagination`]: Splitting content over linked pages
//! - [`template`]: Slot grids and their builder
//!
//! # No I/O on the dispatch path
//!
//! Nothing reachable from [`UiManager`] touches files, sockets or sleeps.
//! Configuration is the only part of the crate that reads from disk.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod button;
pub mod config;
pub mod display;
pub mod error;
pub mod host;
pub mod manager;
pub mod page;
pub mod pagination;
pub mod template;

// Re-exports for convenience
pub use button::{
    Button, ButtonAction, ButtonRef, ClickType, GridButton, GridButtonBuilder, LinkButton,
    LinkTarget, Navigation, PlaceholderButton,
};
pub use config::{
    load_config, load_config_from_path, ConfigError, ConfigSource, ContainerLimits,
    DispatchConfig, GridUiConfig,
};
pub use display::{Decoration, FlagSet, FlagType, ItemDisplay};
pub use error::{UiError, UiResult};
pub use host::{
    next_container_id, ContainerHandle, ContainerHost, HostEvent, MemoryHost, OpenContainer,
    SessionId,
};
pub use manager::{
    BackOutcome, ClickEvent, ClickFailure, ClickOutcome, ManagerSummary, OpenOutcome, UiManager,
};
pub use page::{CloseReason, Page, PageBuilder, PageEvent, PageId};
pub use pagination::Paginator;
pub use template::{Template, TemplateBuilder, DEFAULT_COLUMNS, INVENTORY_ROWS};
