//! Shared primitive IDs and timestamps.

use chrono::{DateTime, Utc};

/// Storage-assigned RSVP identifier. Monotonic, never reused.
pub type RsvpId = i64;

/// Creation timestamp attached to every record.
pub type Timestamp = DateTime<Utc>;
