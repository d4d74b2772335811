/// Canonical error type used across all modules.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid uuid: '{0}'")]
    InvalidNamespace(String),
    #[error("invalid sequence: '{0}'")]
    InvalidSequence(String),
    #[error("malformed request: {0}")]
    MalformedBody(String),
    #[error("404 page not found")]
    NotFound,
    #[error("405 method not allowed")]
    MethodNotAllowed,
    #[error("request body too large (max {0} bytes)")]
    PayloadTooLarge(usize),
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
    #[error("sequence not initialized: {0}")]
    SequenceInitFault(String),
    #[error("sequence store failure: {0}")]
    Store(String),
}

/// Broad error category for status code selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidRequest,
    NotFound,
    MethodNotAllowed,
    PayloadTooLarge,
    ServerError,
}

impl ServiceError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            ServiceError::InvalidNamespace(_)
            | ServiceError::InvalidSequence(_)
            | ServiceError::MalformedBody(_) => ErrorCategory::InvalidRequest,
            ServiceError::NotFound => ErrorCategory::NotFound,
            ServiceError::MethodNotAllowed => ErrorCategory::MethodNotAllowed,
            ServiceError::PayloadTooLarge(_) => ErrorCategory::PayloadTooLarge,
            ServiceError::Entropy(_)
            | ServiceError::SequenceInitFault(_)
            | ServiceError::Store(_) => ErrorCategory::ServerError,
        }
    }

    #[must_use]
    pub fn status(&self) -> http::StatusCode {
        http_status_for_category(self.category())
    }

    /// Server-side failures, as opposed to anything the caller sent.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::ServerError
    }
}

fn http_status_for_category(cat: ErrorCategory) -> http::StatusCode {
    match cat {
        ErrorCategory::InvalidRequest => http::StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => http::StatusCode::NOT_FOUND,
        ErrorCategory::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
        ErrorCategory::PayloadTooLarge => http::StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCategory::ServerError => http::StatusCode::INTERNAL_SERVER_ERROR,
    }
}
