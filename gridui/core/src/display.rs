//! Display Decoration
//!
//! A cell shows a "display": an opaque renderable value owned by the host
//! (an item stack, in the game hosts this was written for). The core only
//! ever decorates a display through the [`Decoration`] trait and never looks
//! inside it.
//!
//! # Suppress flags
//!
//! Flags hide parts of a display's tooltip. Each named flag maps to one entry
//! in [`FLAG_TABLE`]; applying a [`FlagSet`] is a fold over that table rather
//! than a branch per flag. The `All` wildcard expands to every named flag.
//! Flags never change click behaviour.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Operations the core performs on a host display value
pub trait Decoration: Clone + Send + Sync + 'static {
    /// Set the display name shown on hover
    fn apply_title(&mut self, title: &str);

    /// Replace the lore lines under the title
    fn apply_lore(&mut self, lore: &[String]);

    /// Suppress one named piece of tooltip metadata
    ///
    /// Never called with [`FlagType::All`]; the wildcard is expanded first.
    fn apply_flag(&mut self, flag: FlagType);
}

/// Named tooltip suppress-flags
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    /// Hide the whole tooltip
    HideTooltip,
    /// Hide tool enchantments (book enchantments are `StoredEnchantments`)
    Enchantments,
    /// Hide attribute modifiers
    AttributeModifiers,
    /// Hide the unbreakable marker
    Unbreakable,
    /// Hide "can break" placement restrictions
    CanBreak,
    /// Hide "can place on" placement restrictions
    CanPlaceOn,
    /// Hide stored (book) enchantments
    StoredEnchantments,
    /// Hide dye color
    DyedColor,
    /// Hide armor trim
    Trim,
    /// Hide the additional tooltip block
    HideAdditionalTooltip,
    /// Wildcard for every flag above
    All,
}

impl FlagType {
    /// Every named flag, in table order (excludes the wildcard)
    pub const NAMED: [FlagType; 10] = [
        FlagType::HideTooltip,
        FlagType::Enchantments,
        FlagType::AttributeModifiers,
        FlagType::Unbreakable,
        FlagType::CanBreak,
        FlagType::CanPlaceOn,
        FlagType::StoredEnchantments,
        FlagType::DyedColor,
        FlagType::Trim,
        FlagType::HideAdditionalTooltip,
    ];

    /// Table entry for this flag (`None` for the wildcard)
    #[must_use]
    pub fn spec(self) -> Option<&'static FlagSpec> {
        FLAG_TABLE.iter().find(|spec| spec.flag == self)
    }

    /// Stable snake-case name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::HideTooltip => "hide_tooltip",
            Self::Enchantments => "enchantments",
            Self::AttributeModifiers => "attribute_modifiers",
            Self::Unbreakable => "unbreakable",
            Self::CanBreak => "can_break",
            Self::CanPlaceOn => "can_place_on",
            Self::StoredEnchantments => "stored_enchantments",
            Self::DyedColor => "dyed_color",
            Self::Trim => "trim",
            Self::HideAdditionalTooltip => "hide_additional_tooltip",
            Self::All => "all",
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a named flag decorates a display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    /// The flag this entry decorates for
    pub flag: FlagType,
    /// Display component the flag suppresses
    pub component: &'static str,
    /// Only applies when the display already carries `component`
    pub requires_component: bool,
}

/// One entry per named flag
pub const FLAG_TABLE: [FlagSpec; 10] = [
    FlagSpec { flag: FlagType::HideTooltip, component: "hide_tooltip", requires_component: false },
    FlagSpec { flag: FlagType::Enchantments, component: "enchantments", requires_component: false },
    FlagSpec { flag: FlagType::AttributeModifiers, component: "attribute_modifiers", requires_component: false },
    FlagSpec { flag: FlagType::Unbreakable, component: "unbreakable", requires_component: true },
    FlagSpec { flag: FlagType::CanBreak, component: "can_break", requires_component: true },
    FlagSpec { flag: FlagType::CanPlaceOn, component: "can_place_on", requires_component: true },
    FlagSpec { flag: FlagType::StoredEnchantments, component: "stored_enchantments", requires_component: false },
    FlagSpec { flag: FlagType::DyedColor, component: "dyed_color", requires_component: true },
    FlagSpec { flag: FlagType::Trim, component: "trim", requires_component: true },
    FlagSpec { flag: FlagType::HideAdditionalTooltip, component: "hide_additional_tooltip", requires_component: false },
];

/// Order-irrelevant set of suppress-flags
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(BTreeSet<FlagType>);

impl FlagSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag (the wildcard is stored as-is and expanded on read)
    pub fn insert(&mut self, flag: FlagType) {
        self.0.insert(flag);
    }

    /// Whether no flags are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `flag` is in effect, counting the wildcard
    #[must_use]
    pub fn contains(&self, flag: FlagType) -> bool {
        self.0.contains(&flag) || self.0.contains(&FlagType::All)
    }

    /// The named flags in effect, each exactly once, in table order
    pub fn expanded(&self) -> impl Iterator<Item = FlagType> + '_ {
        FlagType::NAMED.into_iter().filter(|flag| self.contains(*flag))
    }

    /// Fold every flag in effect over `display`
    #[must_use]
    pub fn decorate<D: Decoration>(&self, mut display: D) -> D {
        for flag in self.expanded() {
            display.apply_flag(flag);
        }
        display
    }
}

impl FromIterator<FlagType> for FlagSet {
    fn from_iter<I: IntoIterator<Item = FlagType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<FlagType> for FlagSet {
    fn extend<I: IntoIterator<Item = FlagType>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// Reference display value
///
/// Hosts with their own item type implement [`Decoration`] for it instead.
/// `ItemDisplay` is what the in-memory host and the demo render.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDisplay {
    /// Item identifier (e.g. `minecraft:diamond`)
    pub item: String,
    /// Stack size
    pub count: u8,
    /// Custom name, if decorated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Lore lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lore: Vec<String>,
    /// Components carried by the item, by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, serde_json::Value>,
    /// Components whose tooltip line is suppressed
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub hidden: BTreeSet<String>,
}

impl ItemDisplay {
    /// A single item with no decoration
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            count: 1,
            ..Self::default()
        }
    }

    /// Set the stack size
    #[must_use]
    pub fn with_count(mut self, count: u8) -> Self {
        self.count = count;
        self
    }

    /// Attach a component
    #[must_use]
    pub fn with_component(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.components.insert(name.into(), value);
        self
    }

    /// Whether the tooltip line for `component` is suppressed
    #[must_use]
    pub fn is_hidden(&self, component: &str) -> bool {
        self.hidden.contains(component)
    }
}

impl Decoration for ItemDisplay {
    fn apply_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn apply_lore(&mut self, lore: &[String]) {
        self.lore = lore.to_vec();
    }

    fn apply_flag(&mut self, flag: FlagType) {
        let Some(spec) = flag.spec() else {
            return;
        };
        if spec.requires_component && !self.components.contains_key(spec.component) {
            return;
        }
        self.hidden.insert(spec.component.to_string());
    }
}
