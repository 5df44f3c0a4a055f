use std::fmt;

/// Which transform hook produced an invalid return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Reader,
    Writer,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Reader => write!(f, "reader"),
            Hook::Writer => write!(f, "writer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// A transform hook returned something that is neither a record-shaped
    /// value nor the skip sentinel.
    HookViolation { hook: Hook, got: String },
    /// `save` was called with a record whose identity is not tracked by this
    /// collection (stale or foreign record).
    StaleId { collection: String, id: u64 },
    /// The backing store failed the availability probe at construction.
    StorageUnavailable,
    /// Encode/decode failure at the store boundary.
    Codec(String),
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::HookViolation { hook, got } => {
                write!(f, "{} hook returned a non-record value: {}", hook, got)
            }
            CollectionError::StaleId { collection, id } => write!(
                f,
                "record id {} is not tracked by collection {:?}",
                id, collection
            ),
            CollectionError::StorageUnavailable => {
                write!(f, "backing store is unavailable")
            }
            CollectionError::Codec(msg) => write!(f, "codec error: {}", msg),
        }
    }
}

impl std::error::Error for CollectionError {}
