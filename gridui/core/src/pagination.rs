//! Pagination
//!
//! Spreads a list of buttons over as many pages as it takes. The base
//! template marks content cells with [`PlaceholderButton`]s; each generated
//! page fills those cells in order and gets "next" / "previous" links.
//!
//! Pages are built from the last one backwards, so every "next" link points
//! at a page that already exists and "previous" simply goes back through the
//! session history. No page ever holds a reference to an earlier one.
//!
//! [`PlaceholderButton`]: crate::button::PlaceholderButton

use std::sync::Arc;

use crate::button::{ButtonRef, LinkButton};
use crate::display::{Decoration, ItemDisplay};
use crate::error::{UiError, UiResult};
use crate::page::Page;
use crate::template::Template;

/// Lays content buttons over a chain of linked pages
pub struct Paginator<D = ItemDisplay> {
    title: String,
    template: Template<D>,
    inventory: Option<Template<D>>,
    next: Option<(usize, D)>,
    previous: Option<(usize, D)>,
}

impl<D: Decoration> Paginator<D> {
    /// Paginate into `template`, whose placeholder cells receive content
    #[must_use]
    pub fn new(title: impl Into<String>, template: Template<D>) -> Self {
        Self {
            title: title.into(),
            template,
            inventory: None,
            next: None,
            previous: None,
        }
    }

    /// Inventory template shared by every generated page
    #[must_use]
    pub fn inventory(mut self, inventory: Template<D>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    /// Put a link to the following page at `slot`
    #[must_use]
    pub fn next_link(mut self, slot: usize, display: D) -> Self {
        self.next = Some((slot, display));
        self
    }

    /// Put a link back to the preceding page at `slot`
    #[must_use]
    pub fn previous_link(mut self, slot: usize, display: D) -> Self {
        self.previous = Some((slot, display));
        self
    }

    /// Content buttons that fit on one page
    ///
    /// Placeholders under a link slot don't count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.content_slots().len()
    }

    fn link_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.next
            .iter()
            .chain(self.previous.iter())
            .map(|(slot, _)| *slot)
    }

    fn content_slots(&self) -> Vec<usize> {
        let mut slots = self.template.placeholders();
        slots.retain(|slot| self.link_slots().all(|link| link != *slot));
        slots
    }

    /// Build the pages, first page first
    ///
    /// An empty `content` still yields one page.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidPageState`] if the template has no placeholder
    /// cells outside the link slots and [`UiError::OutOfBounds`] if a link
    /// slot is outside it.
    pub fn paginate(&self, content: &[ButtonRef<D>]) -> UiResult<Vec<Arc<Page<D>>>> {
        let slots = self.content_slots();
        if slots.is_empty() {
            return Err(UiError::InvalidPageState(
                "pagination template has no placeholder slots outside its links".to_string(),
            ));
        }

        let chunks: Vec<&[ButtonRef<D>]> = if content.is_empty() {
            vec![content]
        } else {
            content.chunks(slots.len()).collect()
        };
        let total = chunks.len();

        let mut pages = Vec::with_capacity(total);
        let mut following: Option<Arc<Page<D>>> = None;

        for (index, chunk) in chunks.iter().enumerate().rev() {
            let mut builder = self.template.to_builder();
            // a link slot stays empty on pages without that link
            for slot in self.link_slots() {
                if self.template.get(slot).is_some_and(|b| b.is_placeholder()) {
                    builder.clear(slot)?;
                }
            }
            for (&slot, button) in slots.iter().zip(chunk.iter()) {
                builder.set(slot, Arc::clone(button))?;
            }
            if let (Some((slot, display)), Some(target)) = (&self.next, &following) {
                builder.set(*slot, Arc::new(LinkButton::to(display.clone(), Arc::clone(target))))?;
            }
            if index > 0 {
                if let Some((slot, display)) = &self.previous {
                    builder.set(*slot, Arc::new(LinkButton::back(display.clone())))?;
                }
            }

            let mut page = Page::builder()
                .title(format!("{} ({}/{total})", self.title, index + 1))
                .template(builder.build());
            if let Some(inventory) = &self.inventory {
                page = page.inventory(inventory.clone());
            }
            let page = page.build()?;

            following = Some(Arc::clone(&page));
            pages.push(page);
        }

        pages.reverse();
        tracing::debug!(title = %self.title, pages = total, items = content.len(), "Paginated content");
        Ok(pages)
    }
}
