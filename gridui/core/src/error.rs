//! Construction Errors
//!
//! Every error in this module is a local validation failure raised while
//! building a button, template or page. Dispatch never produces these: the
//! manager only ever touches snapshots that already passed validation.

use thiserror::Error;

/// Errors raised by the button, template and page builders
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UiError {
    /// A button was built without a display
    #[error("button display must be defined")]
    InvalidButtonState,

    /// A slot index outside the template grid
    #[error("slot {index} is out of bounds for a template of {size} slots")]
    OutOfBounds {
        /// The rejected index
        index: usize,
        /// Total slot count of the template
        size: usize,
    },

    /// An inverted or out-of-grid rectangle passed to `fill` or `border`
    #[error(
        "region ({row_start},{col_start})..=({row_end},{col_end}) is invalid for a {rows}x{columns} grid"
    )]
    InvalidRegion {
        /// First row of the rectangle
        row_start: usize,
        /// First column of the rectangle
        col_start: usize,
        /// Last row of the rectangle (inclusive)
        row_end: usize,
        /// Last column of the rectangle (inclusive)
        col_end: usize,
        /// Row count of the grid
        rows: usize,
        /// Column count of the grid
        columns: usize,
    },

    /// Template geometry that the host container cannot hold
    #[error("a {rows}x{columns} grid does not fit a container of {max_slots} slots")]
    InvalidGeometry {
        /// Requested row count
        rows: usize,
        /// Requested column count
        columns: usize,
        /// Host container capacity
        max_slots: usize,
    },

    /// A page (or a paginated page set) that cannot be assembled
    #[error("invalid page: {0}")]
    InvalidPageState(String),
}

/// Convenience alias for builder results
pub type UiResult<T> = Result<T, UiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_message() {
        let err = UiError::OutOfBounds { index: 60, size: 54 };
        assert_eq!(
            err.to_string(),
            "slot 60 is out of bounds for a template of 54 slots"
        );
    }

    #[test]
    fn test_region_message_names_grid() {
        let err = UiError::InvalidRegion {
            row_start: 0,
            col_start: 0,
            row_end: 6,
            col_end: 8,
            rows: 5,
            columns: 9,
        };
        assert!(err.to_string().contains("5x9"));
    }
}
