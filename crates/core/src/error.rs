/// Result alias that carries the custom [`TimelineError`] type.
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// A scene name that is not registered with the manager.
    #[error("unknown scene `{0}`")]
    UnknownScene(String),
    /// A generator index outside of the scene's generator list.
    #[error("scene `{scene}` has no generator at index {index}")]
    UnknownGenerator { scene: String, index: usize },
    /// Two scenes handed to the same manager share a name.
    #[error("scene `{0}` is registered more than once")]
    DuplicateScene(String),
    /// [`DataStore::apply`](crate::DataStore::apply) on a key that was never set.
    #[error("no value stored under key `{0}`")]
    MissingKey(String),
    /// A predicate factory received parameters it cannot evaluate.
    #[error("invalid predicate parameters: {0}")]
    InvalidPredicateParameters(String),
    /// Free-form failure raised by custom event actions or hosts.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed host configuration.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl TimelineError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn invalid_predicate<T: Into<String>>(msg: T) -> Self {
        Self::InvalidPredicateParameters(msg.into())
    }
}

impl From<&str> for TimelineError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for TimelineError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
