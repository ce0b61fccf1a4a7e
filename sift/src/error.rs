//! Error types for request building, response extraction and transport

/// Errors surfaced by the search service or the transport in front of it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("Search service unreachable: {0}")]
    Unreachable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Bad request ({status}): {reason}")]
    BadRequest { status: u16, reason: String },

    #[error("Server error ({status}): {reason}")]
    ServerError { status: u16, reason: String },
}

impl ServiceError {
    /// Stable label for log fields
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "unreachable",
            Self::Timeout(_) => "timeout",
            Self::BadRequest { .. } => "bad_request",
            Self::ServerError { .. } => "server_error",
        }
    }

    /// HTTP status reported by the service, if the call got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { status, .. } | Self::ServerError { status, .. } => Some(*status),
            Self::Unreachable(_) | Self::Timeout(_) => None,
        }
    }
}

/// sift errors
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Aggregation not found: {0}")]
    AggregationNotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Config error: {0}")]
    Config(String),
}

impl SiftError {
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRange(_) => "invalid_range",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::AggregationNotFound(_) => "aggregation_not_found",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Service(e) => e.error_type(),
            Self::Config(_) => "config",
        }
    }

    /// True for errors raised before any request left the process
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::InvalidRange(_) | Self::InvalidParameter(_) | Self::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_labels() {
        assert_eq!(ServiceError::Unreachable("x".into()).error_type(), "unreachable");
        assert_eq!(ServiceError::Timeout("x".into()).error_type(), "timeout");
        let bad = ServiceError::BadRequest {
            status: 400,
            reason: "parsing_exception".into(),
        };
        assert_eq!(bad.error_type(), "bad_request");
        assert_eq!(bad.status(), Some(400));
        assert_eq!(ServiceError::Timeout("x".into()).status(), None);
    }

    #[test]
    fn test_service_error_wraps_transparently() {
        let err: SiftError = ServiceError::ServerError {
            status: 503,
            reason: "unavailable".into(),
        }
        .into();
        assert_eq!(err.error_type(), "server_error");
        assert_eq!(err.to_string(), "Server error (503): unavailable");
        assert!(!err.is_client_side());
    }

    #[test]
    fn test_builder_errors_are_client_side() {
        assert!(SiftError::InvalidRange("no bounds".into()).is_client_side());
        assert!(SiftError::InvalidParameter("slop".into()).is_client_side());
        assert!(!SiftError::AggregationNotFound("x".into()).is_client_side());
    }
}
