//! Demo page catalog
//!
//! A main menu framed by glass panes with a diamond in the middle, a
//! paginated shop behind it and a page that draws over the player inventory.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use gridui_core::{
    ButtonRef, ContainerLimits, FlagType, GridButton, ItemDisplay, LinkButton, Page, Paginator,
    PlaceholderButton, Template, TemplateBuilder,
};
use tracing::info;

/// Pages the script can open by name
pub struct Catalog {
    pages: HashMap<String, Arc<Page>>,
}

impl Catalog {
    /// Build every demo page for containers of `rows` rows
    pub fn build(rows: usize, limits: &ContainerLimits) -> Result<Self> {
        anyhow::ensure!(
            limits.columns >= 5,
            "demo pages need at least 5 columns, got {}",
            limits.columns
        );
        let shop = shop_pages(rows, limits)?;
        let wardrobe = wardrobe_page(rows, limits)?;
        let main = main_page(rows, limits, &shop[0], &wardrobe)?;

        let mut pages = HashMap::new();
        pages.insert("main".to_string(), main);
        pages.insert("wardrobe".to_string(), wardrobe);
        for (index, page) in shop.into_iter().enumerate() {
            if index == 0 {
                pages.insert("shop".to_string(), Arc::clone(&page));
            }
            pages.insert(format!("shop-{}", index + 1), page);
        }

        info!(pages = pages.len(), rows = rows, "Demo catalog built");
        Ok(Self { pages })
    }

    /// Look a page up by name
    pub fn get(&self, name: &str) -> Result<Arc<Page>> {
        self.pages
            .get(name)
            .cloned()
            .with_context(|| format!("unknown page '{name}' (known: {})", self.names().join(", ")))
    }

    /// Known page names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn pane() -> Result<ButtonRef> {
    Ok(Arc::new(
        GridButton::builder()
            .display(ItemDisplay::new("minecraft:gray_stained_glass_pane"))
            .title(" ")
            .hide_flags([FlagType::All])
            .build()?,
    ))
}

fn framed(rows: usize, limits: &ContainerLimits) -> Result<TemplateBuilder> {
    let mut template = TemplateBuilder::new(rows, limits.columns, limits)?;
    template.border(0, 0, rows - 1, limits.columns - 1, pane()?)?;
    Ok(template)
}

fn main_page(
    rows: usize,
    limits: &ContainerLimits,
    shop: &Arc<Page>,
    wardrobe: &Arc<Page>,
) -> Result<Arc<Page>> {
    let mut template = framed(rows, limits)?;
    let center = (rows / 2) * limits.columns + limits.columns / 2;

    let diamond: ButtonRef = Arc::new(
        GridButton::builder()
            .display(ItemDisplay::new("minecraft:diamond"))
            .title("Test Item")
            .lore(["Opens the shop", "Right click to close"])
            .hide_flags([FlagType::HideAdditionalTooltip])
            .on_click({
                let shop = Arc::clone(shop);
                move |action| {
                    if action.click().is_right() {
                        action.close();
                    } else {
                        action.open(Arc::clone(&shop));
                    }
                    Ok(())
                }
            })
            .build()?,
    );
    template.set(center, diamond)?;

    let wardrobe_link: ButtonRef = Arc::new(LinkButton::to(
        ItemDisplay::new("minecraft:leather_chestplate").with_count(1),
        Arc::clone(wardrobe),
    ));
    template.set(center + 2, wardrobe_link)?;

    let broken: ButtonRef = Arc::new(
        GridButton::builder()
            .display(ItemDisplay::new("minecraft:tnt"))
            .title("Broken")
            .on_click(|_| anyhow::bail!("this button always fails"))
            .build()?,
    );
    template.set(center - 2, broken)?;

    Ok(Page::builder()
        .title("Main Menu")
        .template(template.build())
        .on_open(|event| info!(session = %event.session, "Main menu opened"))
        .build()?)
}

fn shop_pages(rows: usize, limits: &ContainerLimits) -> Result<Vec<Arc<Page>>> {
    let rows = rows.max(2);
    let mut template = framed(rows, limits)?;
    let last_column = limits.columns - 1;
    if rows > 2 {
        template.fill(
            1,
            1,
            rows - 2,
            last_column - 1,
            Arc::new(PlaceholderButton::<ItemDisplay>::new()),
        )?;
    } else {
        template.fill(0, 1, 0, last_column - 1, Arc::new(PlaceholderButton::<ItemDisplay>::new()))?;
    }

    let wares: Vec<ButtonRef> = (1..=24_u8)
        .map(|count| -> ButtonRef {
            Arc::new(GridButton::of(
                ItemDisplay::new("minecraft:emerald").with_count(count),
            ))
        })
        .collect();

    let bottom = (rows - 1) * limits.columns;
    Ok(Paginator::new("Shop", template.build())
        .previous_link(bottom, ItemDisplay::new("minecraft:arrow"))
        .next_link(bottom + last_column, ItemDisplay::new("minecraft:spectral_arrow"))
        .paginate(&wares)?)
}

fn wardrobe_page(rows: usize, limits: &ContainerLimits) -> Result<Arc<Page>> {
    let mut chest = framed(rows, limits)?;
    chest.set(
        (rows - 1) * limits.columns,
        Arc::new(LinkButton::back(ItemDisplay::new("minecraft:arrow"))),
    )?;

    let mut inventory = Template::<ItemDisplay>::inventory();
    inventory.row(
        3,
        Arc::new(GridButton::of(ItemDisplay::new("minecraft:leather_boots"))),
    )?;

    Ok(Page::builder()
        .title("Wardrobe")
        .template(chest.build())
        .inventory(inventory.build())
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_pages() {
        let catalog = Catalog::build(3, &ContainerLimits::default()).unwrap();
        assert!(catalog.get("main").is_ok());
        assert!(catalog.get("shop-4").is_ok());
        assert!(catalog.get("shop-5").is_err());
        assert_eq!(catalog.get("wardrobe").unwrap().slot_count(), 27 + 36);
    }

    #[test]
    fn test_geometry_follows_limits() {
        let catalog = Catalog::build(6, &ContainerLimits::default()).unwrap();
        assert_eq!(catalog.get("main").unwrap().slot_count(), 54);
        assert!(Catalog::build(7, &ContainerLimits::default()).is_err());
    }
}
