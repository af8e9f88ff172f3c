//! Buttons
//!
//! A button is what occupies a template cell: a display plus click
//! behaviour. Buttons are immutable once built and are shared by `Arc`, so
//! the same instance can sit in many cells (a border tile, say).
//!
//! Click handlers receive a [`ButtonAction`] describing the click. Handlers
//! navigate by recording a request on the action (`action.open(page)`,
//! `action.back()`, ...); the manager applies it once the handler returns.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::display::{Decoration, FlagSet, FlagType, ItemDisplay};
use crate::error::{UiError, UiResult};
use crate::host::SessionId;
use crate::page::Page;

/// Shared handle to a button placed in a template
pub type ButtonRef<D = ItemDisplay> = Arc<dyn Button<D>>;

/// Click handler signature
pub type ClickHandler<D> = Arc<dyn Fn(&mut ButtonAction<D>) -> anyhow::Result<()> + Send + Sync>;

/// Anything that can occupy a template cell
pub trait Button<D>: Send + Sync {
    /// What the cell shows (`None` renders an empty slot)
    fn display(&self) -> Option<&D>;

    /// React to a click on a cell holding this button
    ///
    /// # Errors
    ///
    /// Any error is caught and reported by the manager; it never stops dispatch.
    fn on_click(&self, action: &mut ButtonAction<D>) -> anyhow::Result<()>;

    /// Whether this cell is a slot for paginated content
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// Modifier of a click reported by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickType {
    /// Plain left click
    LeftClick,
    /// Left click while holding shift
    ShiftLeftClick,
    /// Plain right click
    RightClick,
    /// Right click while holding shift
    ShiftRightClick,
    /// Middle (pick block) click
    MiddleClick,
    /// Drop key over the slot
    Throw,
    /// Drop key with control held (whole stack)
    CtrlThrow,
    /// Double left click
    DoubleClick,
    /// Number key swapping with a hotbar slot
    HotbarSwap(u8),
    /// Part of a drag gesture
    Drag,
    /// Anything the host could not classify
    Other,
}

impl ClickType {
    /// Whether the click came from the primary button
    #[must_use]
    pub fn is_left(&self) -> bool {
        matches!(self, Self::LeftClick | Self::ShiftLeftClick | Self::DoubleClick)
    }

    /// Whether the click came from the secondary button
    #[must_use]
    pub fn is_right(&self) -> bool {
        matches!(self, Self::RightClick | Self::ShiftRightClick)
    }

    /// Whether shift was held
    #[must_use]
    pub fn is_shift(&self) -> bool {
        matches!(self, Self::ShiftLeftClick | Self::ShiftRightClick)
    }
}

impl fmt::Display for ClickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftClick => write!(f, "left"),
            Self::ShiftLeftClick => write!(f, "shift-left"),
            Self::RightClick => write!(f, "right"),
            Self::ShiftRightClick => write!(f, "shift-right"),
            Self::MiddleClick => write!(f, "middle"),
            Self::Throw => write!(f, "throw"),
            Self::CtrlThrow => write!(f, "ctrl-throw"),
            Self::DoubleClick => write!(f, "double"),
            Self::HotbarSwap(slot) => write!(f, "hotbar:{slot}"),
            Self::Drag => write!(f, "drag"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ClickType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Some(slot) = s.strip_prefix("hotbar:") {
            return slot
                .parse::<u8>()
                .map(Self::HotbarSwap)
                .map_err(|e| format!("invalid hotbar slot '{slot}': {e}"));
        }
        match s.as_str() {
            "left" => Ok(Self::LeftClick),
            "shift-left" => Ok(Self::ShiftLeftClick),
            "right" => Ok(Self::RightClick),
            "shift-right" => Ok(Self::ShiftRightClick),
            "middle" => Ok(Self::MiddleClick),
            "throw" => Ok(Self::Throw),
            "ctrl-throw" => Ok(Self::CtrlThrow),
            "double" => Ok(Self::DoubleClick),
            "drag" => Ok(Self::Drag),
            "other" => Ok(Self::Other),
            _ => Err(format!("unknown click type '{s}'")),
        }
    }
}

/// Navigation requested from inside a click handler
pub enum Navigation<D> {
    /// Plain open of another page
    Open(Arc<Page<D>>),
    /// Forceful open of another page
    OpenForcefully(Arc<Page<D>>),
    /// Return to the previous page
    Back,
    /// Close the container
    Close,
    /// Re-render the current page
    Refresh,
}

impl<D> fmt::Debug for Navigation<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(page) => write!(f, "Open({})", page.id()),
            Self::OpenForcefully(page) => write!(f, "OpenForcefully({})", page.id()),
            Self::Back => write!(f, "Back"),
            Self::Close => write!(f, "Close"),
            Self::Refresh => write!(f, "Refresh"),
        }
    }
}

/// A click, as seen by a button's handler
pub struct ButtonAction<D> {
    session: SessionId,
    click: ClickType,
    slot: usize,
    page: Arc<Page<D>>,
    navigation: Option<Navigation<D>>,
}

impl<D> ButtonAction<D> {
    pub(crate) fn new(session: SessionId, click: ClickType, slot: usize, page: Arc<Page<D>>) -> Self {
        Self {
            session,
            click,
            slot,
            page,
            navigation: None,
        }
    }

    /// Session that clicked
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Click modifier
    #[must_use]
    pub fn click(&self) -> ClickType {
        self.click
    }

    /// Container slot that was clicked
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Page the click happened on
    #[must_use]
    pub fn page(&self) -> &Arc<Page<D>> {
        &self.page
    }

    /// Open `page` once the handler returns
    pub fn open(&mut self, page: Arc<Page<D>>) {
        self.navigation = Some(Navigation::Open(page));
    }

    /// Forcefully open `page` once the handler returns
    pub fn open_forcefully(&mut self, page: Arc<Page<D>>) {
        self.navigation = Some(Navigation::OpenForcefully(page));
    }

    /// Go back once the handler returns
    pub fn back(&mut self) {
        self.navigation = Some(Navigation::Back);
    }

    /// Close once the handler returns
    pub fn close(&mut self) {
        self.navigation = Some(Navigation::Close);
    }

    /// Re-render the current page once the handler returns
    pub fn refresh(&mut self) {
        self.navigation = Some(Navigation::Refresh);
    }

    /// Pending navigation request, if any
    #[must_use]
    pub fn navigation(&self) -> Option<&Navigation<D>> {
        self.navigation.as_ref()
    }

    pub(crate) fn take_navigation(&mut self) -> Option<Navigation<D>> {
        self.navigation.take()
    }
}

impl<D> fmt::Debug for ButtonAction<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonAction")
            .field("session", &self.session)
            .field("click", &self.click)
            .field("slot", &self.slot)
            .field("page", &self.page.id())
            .field("navigation", &self.navigation)
            .finish()
    }
}

// ============================================================================
// GridButton
// ============================================================================

/// Builder-constructed button with a decorated display
pub struct GridButton<D = ItemDisplay> {
    display: D,
    on_click: Option<ClickHandler<D>>,
}

impl<D: Decoration> GridButton<D> {
    /// Start building a button
    #[must_use]
    pub fn builder() -> GridButtonBuilder<D> {
        GridButtonBuilder::default()
    }

    /// A display-only button with no click behaviour
    #[must_use]
    pub fn of(display: D) -> Self {
        Self {
            display,
            on_click: None,
        }
    }

    /// The decorated display
    #[must_use]
    pub fn decorated(&self) -> &D {
        &self.display
    }

    /// Whether a click handler was attached
    #[must_use]
    pub fn has_click_handler(&self) -> bool {
        self.on_click.is_some()
    }
}

impl<D: Decoration> Button<D> for GridButton<D> {
    fn display(&self) -> Option<&D> {
        Some(&self.display)
    }

    fn on_click(&self, action: &mut ButtonAction<D>) -> anyhow::Result<()> {
        match &self.on_click {
            Some(handler) => handler(action),
            None => Ok(()),
        }
    }
}

impl<D: fmt::Debug> fmt::Debug for GridButton<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridButton")
            .field("display", &self.display)
            .field("clickable", &self.on_click.is_some())
            .finish()
    }
}

/// Staged construction of a [`GridButton`]
pub struct GridButtonBuilder<D> {
    display: Option<D>,
    title: Option<String>,
    lore: Vec<String>,
    hide_flags: FlagSet,
    on_click: Option<ClickHandler<D>>,
}

impl<D> Default for GridButtonBuilder<D> {
    fn default() -> Self {
        Self {
            display: None,
            title: None,
            lore: Vec::new(),
            hide_flags: FlagSet::new(),
            on_click: None,
        }
    }
}

impl<D: Decoration> GridButtonBuilder<D> {
    /// Display to decorate (required)
    #[must_use]
    pub fn display(mut self, display: D) -> Self {
        self.display = Some(display);
        self
    }

    /// Custom name shown on hover
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Lore lines shown under the title
    #[must_use]
    pub fn lore<I, S>(mut self, lore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lore = lore.into_iter().map(Into::into).collect();
        self
    }

    /// Tooltip parts to suppress
    #[must_use]
    pub fn hide_flags(mut self, flags: impl IntoIterator<Item = FlagType>) -> Self {
        self.hide_flags.extend(flags);
        self
    }

    /// Click behaviour
    #[must_use]
    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ButtonAction<D>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(handler));
        self
    }

    /// Decorate the display and freeze the button
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidButtonState`] if no display was given.
    pub fn build(self) -> UiResult<GridButton<D>> {
        let Some(display) = self.display else {
            return Err(UiError::InvalidButtonState);
        };
        Ok(GridButton {
            display: decorate(display, self.title.as_deref(), &self.lore, &self.hide_flags),
            on_click: self.on_click,
        })
    }
}

fn decorate<D: Decoration>(mut display: D, title: Option<&str>, lore: &[String], flags: &FlagSet) -> D {
    if let Some(title) = title {
        display.apply_title(title);
    }
    if !lore.is_empty() {
        display.apply_lore(lore);
    }
    flags.decorate(display)
}

// ============================================================================
// PlaceholderButton / LinkButton
// ============================================================================

/// Marks a cell that pagination fills with content
#[derive(Debug, Clone, Default)]
pub struct PlaceholderButton<D = ItemDisplay> {
    display: Option<D>,
}

impl<D> PlaceholderButton<D> {
    /// An empty placeholder
    #[must_use]
    pub fn new() -> Self {
        Self { display: None }
    }

    /// A placeholder that shows `display` until content replaces it
    #[must_use]
    pub fn with_display(display: D) -> Self {
        Self {
            display: Some(display),
        }
    }
}

impl<D: Send + Sync> Button<D> for PlaceholderButton<D> {
    fn display(&self) -> Option<&D> {
        self.display.as_ref()
    }

    fn on_click(&self, _action: &mut ButtonAction<D>) -> anyhow::Result<()> {
        Ok(())
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}

/// Where a [`LinkButton`] goes
pub enum LinkTarget<D> {
    /// Forcefully open a specific page
    Page(Arc<Page<D>>),
    /// Return to the previous page
    Back,
}

/// Button that navigates when clicked
pub struct LinkButton<D = ItemDisplay> {
    display: D,
    target: LinkTarget<D>,
}

impl<D> LinkButton<D> {
    /// Link to `page`
    #[must_use]
    pub fn to(display: D, page: Arc<Page<D>>) -> Self {
        Self {
            display,
            target: LinkTarget::Page(page),
        }
    }

    /// Link back to the previous page
    #[must_use]
    pub fn back(display: D) -> Self {
        Self {
            display,
            target: LinkTarget::Back,
        }
    }

    /// The link target
    #[must_use]
    pub fn target(&self) -> &LinkTarget<D> {
        &self.target
    }
}

impl<D: Send + Sync> Button<D> for LinkButton<D> {
    fn display(&self) -> Option<&D> {
        Some(&self.display)
    }

    fn on_click(&self, action: &mut ButtonAction<D>) -> anyhow::Result<()> {
        match &self.target {
            LinkTarget::Page(page) => action.open_forcefully(Arc::clone(page)),
            LinkTarget::Back => action.back(),
        }
        Ok(())
    }
}
