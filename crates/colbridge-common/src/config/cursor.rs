//! Cursor options supplied by the statement that produced a result.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FETCH_SIZE;

/// Direction in which rows are expected to be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchDirection {
    /// First to last.
    #[default]
    Forward,
    /// Last to first.
    Reverse,
    /// No hint.
    Unknown,
}

impl FetchDirection {
    /// Returns the tabular-client constant for this direction.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Forward => 1000,
            Self::Reverse => 1001,
            Self::Unknown => 1002,
        }
    }

    /// Looks up a direction by its tabular-client constant.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1000 => Some(Self::Forward),
            1001 => Some(Self::Reverse),
            1002 => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Scrollability of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorType {
    /// Single pass, forward only.
    #[default]
    ForwardOnly,
    /// Scrollable, not sensitive to concurrent changes.
    ScrollInsensitive,
    /// Scrollable, sensitive to concurrent changes.
    ScrollSensitive,
}

impl CursorType {
    /// Returns the tabular-client constant for this type.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ForwardOnly => 1003,
            Self::ScrollInsensitive => 1004,
            Self::ScrollSensitive => 1005,
        }
    }
}

/// Options a cursor inherits from its statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorOptions {
    /// Rows requested per page.
    pub fetch_size: i32,
    /// Fetch direction hint.
    pub fetch_direction: FetchDirection,
    /// Cursor scrollability.
    pub cursor_type: CursorType,
    /// Catalog name reported by result metadata (the cluster name).
    pub catalog: Option<String>,
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            fetch_size: DEFAULT_FETCH_SIZE,
            fetch_direction: FetchDirection::Forward,
            cursor_type: CursorType::ForwardOnly,
            catalog: None,
        }
    }
}

impl CursorOptions {
    /// Creates default cursor options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fetch size.
    #[must_use]
    pub fn fetch_size(mut self, size: i32) -> Self {
        self.fetch_size = size;
        self
    }

    /// Sets the fetch direction.
    #[must_use]
    pub fn fetch_direction(mut self, direction: FetchDirection) -> Self {
        self.fetch_direction = direction;
        self
    }

    /// Sets the catalog name.
    #[must_use]
    pub fn catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_direction_codes() {
        for direction in [
            FetchDirection::Forward,
            FetchDirection::Reverse,
            FetchDirection::Unknown,
        ] {
            assert_eq!(FetchDirection::from_code(direction.code()), Some(direction));
        }
        assert_eq!(FetchDirection::from_code(7), None);
    }

    #[test]
    fn test_defaults() {
        let options = CursorOptions::default();
        assert_eq!(options.fetch_size, DEFAULT_FETCH_SIZE);
        assert_eq!(options.fetch_direction, FetchDirection::Forward);
        assert_eq!(options.cursor_type.code(), 1003);
        assert!(options.catalog.is_none());
    }

    #[test]
    fn test_builder() {
        let options = CursorOptions::new().fetch_size(500).catalog("Test Cluster");
        assert_eq!(options.fetch_size, 500);
        assert_eq!(options.catalog.as_deref(), Some("Test Cluster"));
    }
}
