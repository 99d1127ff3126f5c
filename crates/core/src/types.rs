/// Process-local work item sequence number.
///
/// Unique only within one running process. Never persist it as an identity.
pub type SequenceNumber = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
