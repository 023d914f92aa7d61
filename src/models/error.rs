/// Everything that can go wrong while keeping the rendered path in sync.
///
/// None of these are fatal: a failed synchronization leaves the last good
/// path on the map.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error("Invalid coordinate ({latitude}, {longitude}).")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Path service unavailable: {0}")]
    PathServiceUnavailable(String),

    #[error("Malformed path service response: {0}")]
    MalformedResponse(String),

    /// Raised by the path service itself when a query cannot be parsed.
    #[error("Malformed path query: {0}")]
    MalformedQuery(String),
}

impl SyncError {
    /// Transport and decoding failures are transient; bad input is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::PathServiceUnavailable(_) | SyncError::MalformedResponse(_)
        )
    }
}
