use std::fmt;

/// Errors that can occur while moving media to or from a store.
#[derive(Debug)]
pub enum MediaError {
    /// The referenced object does not exist.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The storage id is malformed or outside the store's namespace.
    InvalidId(String),
    /// The remote provider rejected or failed the request.
    Remote(String),
    /// The store did not answer within the configured deadline.
    Timeout(std::time::Duration),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "media object not found: {id}"),
            Self::Io(err) => write!(f, "media IO error: {err}"),
            Self::InvalidId(id) => write!(f, "invalid storage id: {id:?}"),
            Self::Remote(msg) => write!(f, "media provider error: {msg}"),
            Self::Timeout(after) => write!(f, "media store timed out after {}s", after.as_secs()),
        }
    }
}

impl std::error::Error for MediaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
