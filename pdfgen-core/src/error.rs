/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or writing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required argument was absent or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was called before its preconditions were met.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A cross-reference slot was addressed that the table never claimed.
    #[error("Object {id} is out of range (table has {count} slots)")]
    OutOfRange {
        /// Object number that was requested
        id: u32,
        /// Number of slots in the table, including slot 0
        count: usize,
    },

    /// Failure raised by a font source.
    #[error("Font error: {0}")]
    Font(String),

    /// Failure writing to the destination.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn invalid_operation(msg: impl Into<String>) -> Self {
        Error::InvalidOperation(msg.into())
    }
}
