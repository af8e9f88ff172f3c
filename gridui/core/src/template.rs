//! Templates
//!
//! A template maps every cell of a fixed rows x columns grid to an optional
//! button. Cells are addressed by linear index (`row * columns + column`).
//!
//! Templates are immutable. A [`TemplateBuilder`] collects placements and
//! `build()` takes a snapshot; mutating the builder afterwards never reaches
//! a template that was already built.
//!
//! # Geometry
//!
//! ```text
//!   border(0, 0, 2, 4, b)        fill(0, 0, 2, 4, b)
//!   b b b b b                    b b b b b
//!   b . . . b                    b b b b b
//!   b b b b b                    b b b b b
//! ```
//!
//! Rectangles are inclusive on both ends. A rectangle that is inverted or
//! leaves the grid is rejected with [`UiError::InvalidRegion`] before any
//! cell is written.

use std::fmt;
use std::sync::Arc;

use crate::button::ButtonRef;
use crate::config::ContainerLimits;
use crate::display::ItemDisplay;
use crate::error::{UiError, UiResult};

/// Columns in a standard chest row
pub const DEFAULT_COLUMNS: usize = 9;

/// Rows of the player inventory region (three storage rows plus the hotbar)
pub const INVENTORY_ROWS: usize = 4;

/// Immutable slot-to-button mapping with fixed geometry
pub struct Template<D = ItemDisplay> {
    rows: usize,
    columns: usize,
    slots: Arc<[Option<ButtonRef<D>>]>,
}

impl<D> Clone for Template<D> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows,
            columns: self.columns,
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<D> Template<D> {
    /// Builder for a grid of `rows` standard-width rows
    ///
    /// Checked against [`ContainerLimits::default`], not the loaded
    /// configuration; use [`TemplateBuilder::new`] to apply configured limits.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidGeometry`] if the grid is empty or larger
    /// than the default container.
    pub fn builder(rows: usize) -> UiResult<TemplateBuilder<D>> {
        TemplateBuilder::new(rows, DEFAULT_COLUMNS, &ContainerLimits::default())
    }

    /// Builder for a grid with explicit columns
    ///
    /// Like [`Template::builder`], only the default limits apply.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidGeometry`] if the grid is empty or larger
    /// than the default container.
    pub fn builder_with_columns(rows: usize, columns: usize) -> UiResult<TemplateBuilder<D>> {
        TemplateBuilder::new(rows, columns, &ContainerLimits::default())
    }

    /// Builder for the player inventory region shown under a chest
    #[must_use]
    pub fn inventory() -> TemplateBuilder<D> {
        TemplateBuilder::unchecked(INVENTORY_ROWS, DEFAULT_COLUMNS)
    }

    /// Number of rows
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Total number of cells
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Button at a linear index (`None` when empty or out of range)
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ButtonRef<D>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Button at a row and column
    #[must_use]
    pub fn get_at(&self, row: usize, column: usize) -> Option<&ButtonRef<D>> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.get(row * self.columns + column)
    }

    /// Populated cells in index order
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &ButtonRef<D>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|button| (index, button)))
    }

    /// Indices of placeholder cells, in index order
    #[must_use]
    pub fn placeholders(&self) -> Vec<usize> {
        self.occupied()
            .filter(|(_, button)| button.is_placeholder())
            .map(|(index, _)| index)
            .collect()
    }

    /// What each cell shows, in index order
    pub fn displays(&self) -> impl Iterator<Item = Option<&D>> + '_ {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().and_then(|button| button.display()))
    }

    /// Builder pre-filled with this template's cells
    #[must_use]
    pub fn to_builder(&self) -> TemplateBuilder<D> {
        TemplateBuilder {
            rows: self.rows,
            columns: self.columns,
            slots: self.slots.to_vec(),
        }
    }
}

impl<D> fmt::Debug for Template<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("occupied", &self.occupied().count())
            .finish()
    }
}

/// Mutable, single-use staging area for a [`Template`]
pub struct TemplateBuilder<D = ItemDisplay> {
    rows: usize,
    columns: usize,
    slots: Vec<Option<ButtonRef<D>>>,
}

impl<D> TemplateBuilder<D> {
    /// Builder checked against explicit container limits
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidGeometry`] if `rows` or `columns` is zero or
    /// the grid holds more cells than `limits.max_slots`.
    pub fn new(rows: usize, columns: usize, limits: &ContainerLimits) -> UiResult<Self> {
        let fits = rows
            .checked_mul(columns)
            .is_some_and(|size| size <= limits.max_slots);
        if rows == 0 || columns == 0 || !fits {
            return Err(UiError::InvalidGeometry {
                rows,
                columns,
                max_slots: limits.max_slots,
            });
        }
        Ok(Self::unchecked(rows, columns))
    }

    fn unchecked(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            slots: vec_of_none(rows * columns),
        }
    }

    /// Number of cells
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Place `button` at a linear index
    ///
    /// # Errors
    ///
    /// Returns [`UiError::OutOfBounds`] if `index` is outside the grid; the
    /// builder is left untouched.
    pub fn set(&mut self, index: usize, button: ButtonRef<D>) -> UiResult<&mut Self> {
        let size = self.size();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(UiError::OutOfBounds { index, size })?;
        *slot = Some(button);
        Ok(self)
    }

    /// Place `button` at a row and column
    ///
    /// # Errors
    ///
    /// Returns [`UiError::OutOfBounds`] if the cell is outside the grid.
    pub fn set_at(&mut self, row: usize, column: usize, button: ButtonRef<D>) -> UiResult<&mut Self> {
        if row >= self.rows || column >= self.columns {
            return Err(UiError::OutOfBounds {
                index: row.saturating_mul(self.columns).saturating_add(column),
                size: self.size(),
            });
        }
        self.set(row * self.columns + column, button)
    }

    /// Place `button` in every cell of the rectangle
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidRegion`] if the rectangle is inverted or
    /// leaves the grid.
    pub fn fill(
        &mut self,
        row_start: usize,
        col_start: usize,
        row_end: usize,
        col_end: usize,
        button: ButtonRef<D>,
    ) -> UiResult<&mut Self> {
        self.check_region(row_start, col_start, row_end, col_end)?;
        for row in row_start..=row_end {
            for column in col_start..=col_end {
                self.slots[row * self.columns + column] = Some(Arc::clone(&button));
            }
        }
        Ok(self)
    }

    /// Place `button` on the perimeter of the rectangle only
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidRegion`] if the rectangle is inverted or
    /// leaves the grid.
    pub fn border(
        &mut self,
        row_start: usize,
        col_start: usize,
        row_end: usize,
        col_end: usize,
        button: ButtonRef<D>,
    ) -> UiResult<&mut Self> {
        self.check_region(row_start, col_start, row_end, col_end)?;
        for row in row_start..=row_end {
            for column in col_start..=col_end {
                let edge = row == row_start || row == row_end || column == col_start || column == col_end;
                if edge {
                    self.slots[row * self.columns + column] = Some(Arc::clone(&button));
                }
            }
        }
        Ok(self)
    }

    /// Place `button` across a whole row
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidRegion`] if `row` is outside the grid.
    pub fn row(&mut self, row: usize, button: ButtonRef<D>) -> UiResult<&mut Self> {
        let last = self.columns - 1;
        self.fill(row, 0, row, last, button)
    }

    /// Place `button` down a whole column
    ///
    /// # Errors
    ///
    /// Returns [`UiError::InvalidRegion`] if `column` is outside the grid.
    pub fn column(&mut self, column: usize, button: ButtonRef<D>) -> UiResult<&mut Self> {
        let last = self.rows - 1;
        self.fill(0, column, last, column, button)
    }

    /// Place `button` in every cell that is still empty
    pub fn fill_empty(&mut self, button: ButtonRef<D>) -> &mut Self {
        for slot in self.slots.iter_mut().filter(|slot| slot.is_none()) {
            *slot = Some(Arc::clone(&button));
        }
        self
    }

    /// Empty one cell
    ///
    /// # Errors
    ///
    /// Returns [`UiError::OutOfBounds`] if `index` is outside the grid.
    pub fn clear(&mut self, index: usize) -> UiResult<&mut Self> {
        let size = self.size();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(UiError::OutOfBounds { index, size })?;
        *slot = None;
        Ok(self)
    }

    /// Empty every cell
    pub fn clear_all(&mut self) -> &mut Self {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self
    }

    /// Snapshot the current placements
    #[must_use]
    pub fn build(&self) -> Template<D> {
        Template {
            rows: self.rows,
            columns: self.columns,
            slots: self.slots.iter().cloned().collect(),
        }
    }

    fn check_region(
        &self,
        row_start: usize,
        col_start: usize,
        row_end: usize,
        col_end: usize,
    ) -> UiResult<()> {
        let inverted = row_end < row_start || col_end < col_start;
        let outside = row_end >= self.rows || col_end >= self.columns;
        if inverted || outside {
            return Err(UiError::InvalidRegion {
                row_start,
                col_start,
                row_end,
                col_end,
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(())
    }
}

fn vec_of_none<T>(len: usize) -> Vec<Option<T>> {
    std::iter::repeat_with(|| None).take(len).collect()
}
