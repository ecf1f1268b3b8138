//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for action times and roster lookups.
///
/// Shift dates and times are facility wall-clock values; the facility clock
/// is taken to be UTC.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
