//! Error types for the store layer.

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage backend failed (connection, quota, corruption).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A value could not be serialized or deserialized.
    #[error("value (de)serialization failed for key '{key}': {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create a backend error from a message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a codec error for a key.
    pub fn codec(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Codec {
            key: key.into(),
            source,
        }
    }
}
