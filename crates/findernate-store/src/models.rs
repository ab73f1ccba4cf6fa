//! Records read back from the local store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the cross-process signal log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signal {
    /// Monotonic sequence number assigned by SQLite.
    pub seq: i64,
    /// Id of the process that published the signal.
    pub origin: String,
    /// Event name.
    pub name: String,
    /// JSON payload (opaque to the store).
    pub payload: String,
    /// When the signal was written.
    pub created_at: DateTime<Utc>,
}
