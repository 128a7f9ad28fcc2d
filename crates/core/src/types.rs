/// Server-assigned identifiers are opaque strings (UUIDs on the current
/// backend, but the client never interprets them).
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
