use thiserror::Error;

/// Coarse classification of every failure the core can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    InvalidInput,
    NotFound,
    Unauthorized,
    RateLimited,
    ProviderError,
    NetworkError,
    MalformedResponse,
    StorageError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "invalid-input",
            FailureKind::NotFound => "not-found",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::RateLimited => "rate-limited",
            FailureKind::ProviderError => "provider-error",
            FailureKind::NetworkError => "network-error",
            FailureKind::MalformedResponse => "malformed-response",
            FailureKind::StorageError => "storage-error",
        }
    }

    /// Failures that may be papered over with a cached record.
    pub fn is_network_related(&self) -> bool {
        matches!(self, FailureKind::NetworkError)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while fetching and normalizing provider data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("city name is empty")]
    InvalidInput,

    #[error("provider could not resolve the requested city")]
    NotFound,

    #[error("provider rejected the API key")]
    Unauthorized,

    #[error("provider rate limit exceeded")]
    RateLimited,

    #[error("provider returned status {status}")]
    Provider { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::InvalidInput => FailureKind::InvalidInput,
            FetchError::NotFound => FailureKind::NotFound,
            FetchError::Unauthorized => FailureKind::Unauthorized,
            FetchError::RateLimited => FailureKind::RateLimited,
            FetchError::Provider { .. } => FailureKind::ProviderError,
            FetchError::Network(_) => FailureKind::NetworkError,
            FetchError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }
}

/// Errors from the persistent key-value layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode stored value: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage rejected the operation: {0}")]
    Rejected(String),
}

impl StorageError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::StorageError
    }
}
