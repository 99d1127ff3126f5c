use ingest_core::error::JobError;

/// Error returned by [`Warehouse`](crate::Warehouse) and
/// [`DocumentStore`](crate::DocumentStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or is temporarily refusing work.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A write collided with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored record could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Any other query failure.
    #[error("Query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_) => StoreError::Unavailable(err.to_string()),
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => StoreError::Corrupt(err.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code();
                classify_sqlstate(code.as_deref().unwrap_or_default(), err.to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// Classify a PostgreSQL SQLSTATE code.
///
/// - `23505` (unique violation) is a conflict.
/// - Class `08` (connection), `53` (insufficient resources), `57P0x`
///   (shutdown), `40001`/`40P01` (serialization, deadlock) are transient.
/// - Everything else is a plain query failure.
pub fn classify_sqlstate(code: &str, message: String) -> StoreError {
    match code {
        "23505" => StoreError::Conflict(message),
        "40001" | "40P01" => StoreError::Unavailable(message),
        c if c.starts_with("08") || c.starts_with("53") || c.starts_with("57P0") => {
            StoreError::Unavailable(message)
        }
        _ => StoreError::Query(message),
    }
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => JobError::Unavailable(msg),
            StoreError::Conflict(msg) => JobError::Conflict(msg),
            StoreError::Corrupt(msg) => JobError::Conflict(format!("stored record unreadable: {msg}")),
            StoreError::Query(msg) => JobError::Internal(msg),
        }
    }
}
