/// Errors surfaced by the remote transport.
///
/// Transient transport failures are retried inside the client before
/// one of these reaches a caller, so every variant here is terminal for
/// the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid request input: {0}")]
    InvalidInput(String),

    #[error("unexpected response from server")]
    InvalidResponse,

    #[error("server returned HTTP {0}")]
    Http(u16),

    #[error("failed to decode response: {0}")]
    Decoding(String),

    #[error("network error: {0}")]
    Unknown(String),
}

impl NetworkError {
    /// True when the error corresponds to a definitive server answer
    /// rather than a transport failure.
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Error delivered to every subscriber of a coordinated fetch.
///
/// Cloned for fan-out, so it collapses the underlying failure to its
/// message; the owner of the fetch keeps the typed original.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FetchError(pub String);

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<NetworkError> for FetchError {
    fn from(error: NetworkError) -> Self {
        Self(error.to_string())
    }
}
