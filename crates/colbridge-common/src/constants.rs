//! System-wide constants for colbridge.
//!
//! Display widths, protocol defaults, and the sentinels used by the cursor
//! and the session lifecycle manager.

// =============================================================================
// Display Constants
// =============================================================================

/// Maximum column display width reported by result metadata.
///
/// Text and blob columns have an unbounded natural precision; their display
/// size is capped to this width.
pub const MAX_COLUMN_WIDTH: i32 = 40;

/// Precision reported for types whose natural precision is unbounded.
pub const UNBOUNDED_PRECISION: i32 = i32::MAX;

// =============================================================================
// Connection Defaults
// =============================================================================

/// Default native protocol port.
pub const DEFAULT_PORT: u16 = 9042;

/// Separator between contact points in the `host` parameter.
pub const HOST_SEPARATOR: &str = "--";

/// Default number of rows requested per page.
pub const DEFAULT_FETCH_SIZE: i32 = 100;

// =============================================================================
// Wire Format Constants
// =============================================================================

/// Offset applied to the unsigned day count of the `date` type.
///
/// Day `2^31` is the Unix epoch (1970-01-01).
pub const DATE_EPOCH_OFFSET: i64 = 1 << 31;

/// Nanoseconds per millisecond, used when exposing `time` values.
pub const NANOS_PER_MILLI: i64 = 1_000_000;

/// Nanoseconds in one day. Valid `time` values are below this bound.
pub const NANOS_PER_DAY: i64 = 86_400 * 1_000_000_000;

// =============================================================================
// Cursor and Session Sentinels
// =============================================================================

/// Row number reported once a cursor has moved past its last row.
pub const AFTER_LAST_ROW: u64 = u64::MAX;

/// Reference count value marking a disposed session handle.
pub const DISPOSED_REFS: i32 = -1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_epoch_offset() {
        assert_eq!(DATE_EPOCH_OFFSET, 2_147_483_648);
    }

    #[test]
    fn test_nanos_per_day() {
        assert_eq!(NANOS_PER_DAY / NANOS_PER_MILLI, 86_400_000);
    }

    #[test]
    fn test_disposed_sentinel_is_negative() {
        assert!(DISPOSED_REFS < 0);
    }
}
