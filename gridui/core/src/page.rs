//! Pages
//!
//! A page is a titled screen: a primary template, optionally the player
//! inventory template rendered beneath it, and open/close callbacks. Pages
//! are passive data; the manager drives everything.
//!
//! Container slots are numbered across both templates: the primary template
//! occupies `0..primary.size()` and the inventory template follows it.
//!
//! Pages hold no reference to the page that opened them. Navigation history
//! lives in the manager's per-session stack, so the page graph stays acyclic.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::button::ButtonRef;
use crate::display::ItemDisplay;
use crate::error::{UiError, UiResult};
use crate::host::SessionId;
use crate::template::Template;

/// Unique identifier of a built page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(u64);

impl PageId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw numeric value
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// Why a page stopped being shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    /// Host code called `close`
    Closed,
    /// Another page was opened over it
    Replaced,
    /// Left through `back`
    Back,
    /// The client closed the container itself
    ClientClosed,
    /// The session disconnected
    SessionEnded,
}

/// Argument of page callbacks
#[derive(Debug)]
pub struct PageEvent<'a, D> {
    /// Session the page was shown to
    pub session: SessionId,
    /// The page
    pub page: &'a Page<D>,
    /// Set for close callbacks
    pub reason: Option<CloseReason>,
}

/// Page lifecycle callback
pub type PageCallback<D> = Arc<dyn Fn(&PageEvent<'_, D>) + Send + Sync>;

/// A titled, navigable screen
pub struct Page<D = ItemDisplay> {
    id: PageId,
    title: String,
    template: Template<D>,
    inventory: Option<Template<D>>,
    on_open: Option<PageCallback<D>>,
    on_close: Option<PageCallback<D>>,
}

impl<D> Page<D> {
    /// Start building a page
    #[must_use]
    pub fn builder() -> PageBuilder<D> {
        PageBuilder::default()
    }

    /// Identity of this page
    #[must_use]
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Container title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Primary template
    #[must_use]
    pub fn template(&self) -> &Template<D> {
        &self.template
    }

    /// Inventory template, if the page draws over the player inventory
    #[must_use]
    pub fn inventory(&self) -> Option<&Template<D>> {
        self.inventory.as_ref()
    }

    /// Slots the host container needs
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.template.size() + self.inventory.as_ref().map_or(0, Template::size)
    }

    /// Button under a container slot (`None` for empty or out-of-range slots)
    #[must_use]
    pub fn resolve(&self, slot: usize) -> Option<&ButtonRef<D>> {
        let primary = self.template.size();
        if slot < primary {
            return self.template.get(slot);
        }
        self.inventory.as_ref()?.get(slot - primary)
    }

    /// Every slot's display, primary template first
    pub fn displays(&self) -> impl Iterator<Item = Option<&D>> + '_ {
        self.template
            .displays()
            .chain(self.inventory.iter().flat_map(|inventory| inventory.displays()))
    }

    pub(crate) fn fire_open(&self, session: SessionId) {
        if let Some(callback) = &self.on_open {
            callback(&PageEvent {
                session,
                page: self,
                reason: None,
            });
        }
    }

    pub(crate) fn fire_close(&self, session: SessionId, reason: CloseReason) {
        if let Some(callback) = &self.on_close {
            callback(&PageEvent {
                session,
                page: self,
                reason: Some(reason),
            });
        }
    }
}

impl<D> fmt::Debug for Page<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("template", &self.template)
            .field("inventory", &self.inventory)
            .finish_non_exhaustive()
    }
}

/// Staged construction of a [`Page`]
pub struct PageBuilder<D = ItemDisplay> {
    title: String,
    template: Option<Template<D>>,
    inventory: Option<Template<D>>,
    on_open: Option<PageCallback<D>>,
    on_close: Option<PageCallback<D>>,
}

impl<D> Default for PageBuilder<D> {
    fn default() -> Self {
        Self {
            title: String::new(),
            template: None,
            inventory: None,
            on_open: None,
            on_close: None,
        }
    }
}

impl<D> PageBuilder<D> {
    /// Container title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Primary template (required)
    #[must_use]
    pub fn template(mut self, template: Template<D>) -> Self {
        self.template = Some(template);
        self
    }

    /// Template drawn over the player inventory
    #[must_use]
    pub fn inventory(mut self, inventory: Template<D>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    /// Called every time the page is shown
    #[must_use]
    pub fn on_open<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PageEvent<'_, D>) + Send + Sync + 'static,
    {
        self.on_open = Some(Arc::new(callback));
        self
    }

    /// Called every time the page stops being shown
    #[must_use]
    pub fn on_close<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PageEvent<'_, D>) + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(callback));
        self
    }

    /// Freeze the page
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidPageState`] if no primary template was set.
    pub fn build(self) -> UiResult<Arc<Page<D>>> {
        let Some(template) = self.template else {
            let reason = if self.inventory.is_some() {
                "an inventory template needs a primary template"
            } else {
                "page has no template"
            };
            return Err(UiError::InvalidPageState(reason.to_string()));
        };
        Ok(Arc::new(Page {
            id: PageId::next(),
            title: self.title,
            template,
            inventory: self.inventory,
            on_open: self.on_open,
            on_close: self.on_close,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::GridButton;
    use std::sync::atomic::AtomicUsize;

    fn tile(item: &str) -> ButtonRef {
        Arc::new(GridButton::of(ItemDisplay::new(item)))
    }

    #[test]
    fn test_page_without_template_fails() {
        let result = Page::<ItemDisplay>::builder().title("empty").build();
        assert!(matches!(result, Err(UiError::InvalidPageState(_))));

        let inventory_only = Page::builder()
            .inventory(Template::<ItemDisplay>::inventory().build())
            .build();
        assert!(matches!(inventory_only, Err(UiError::InvalidPageState(_))));
    }

    #[test]
    fn test_page_ids_unique() {
        let template = Template::<ItemDisplay>::builder(1).unwrap().build();
        let a = Page::builder().template(template.clone()).build().unwrap();
        let b = Page::builder().template(template).build().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_resolve_spans_both_templates() {
        let mut chest = Template::builder(3).unwrap();
        chest.set(4, tile("minecraft:diamond")).unwrap();
        let mut inventory = Template::inventory();
        inventory.set(0, tile("minecraft:emerald")).unwrap();

        let page = Page::builder()
            .title("compound")
            .template(chest.build())
            .inventory(inventory.build())
            .build()
            .unwrap();

        assert_eq!(page.slot_count(), 27 + 36);
        assert!(page.resolve(4).is_some());
        assert!(page.resolve(5).is_none());
        assert!(page.resolve(27).is_some());
        assert!(page.resolve(27 + 36).is_none());
        assert_eq!(page.displays().count(), 63);
    }

    #[test]
    fn test_resolve_without_inventory() {
        let page = Page::builder()
            .template(Template::<ItemDisplay>::builder(1).unwrap().build())
            .build()
            .unwrap();
        assert_eq!(page.slot_count(), 9);
        assert!(page.resolve(20).is_none());
    }

    #[test]
    fn test_callbacks_fire_with_reason() {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let opened_hook = Arc::clone(&opened);
        let closed_hook = Arc::clone(&closed);

        let page = Page::builder()
            .template(Template::<ItemDisplay>::builder(1).unwrap().build())
            .on_open(move |_| {
                opened_hook.fetch_add(1, Ordering::SeqCst);
            })
            .on_close(move |event| closed_hook.lock().push(event.reason))
            .build()
            .unwrap();

        let session = SessionId::new();
        page.fire_open(session);
        page.fire_close(session, CloseReason::Back);

        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(*closed.lock(), vec![Some(CloseReason::Back)]);
    }
}
