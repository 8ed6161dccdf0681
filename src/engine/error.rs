//! Error types shared by the game-engine client implementations.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`EngineError`] failures.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures that can occur while talking to the game engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build engine client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request to an engine endpoint could not be sent.
    #[error("failed to send engine request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The engine returned an unexpected status code.
    #[error("unexpected engine response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// The engine is shedding load; callers should back off before retrying.
    #[error("engine reported resource exhaustion for `{path}`")]
    ResourceExhausted { path: String },
    /// Response payload could not be parsed into the expected shape.
    #[error("failed to decode engine response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The per-call deadline elapsed before the engine answered.
    #[error("engine request to `{path}` timed out")]
    Timeout { path: String },
}

impl EngineError {
    /// Build the status-code variant, special-casing load shedding.
    pub fn from_status(path: impl Into<String>, status: StatusCode) -> Self {
        let path = path.into();
        if status == StatusCode::TOO_MANY_REQUESTS {
            EngineError::ResourceExhausted { path }
        } else {
            EngineError::RequestStatus { path, status }
        }
    }

    /// Whether the failure is the load-shedding class that warrants a polling cool-down.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, EngineError::ResourceExhausted { .. })
    }

    /// Classify the failure for the connection monitor's operator-facing message.
    pub fn probe_failure(&self) -> ProbeFailure {
        match self {
            EngineError::RequestStatus { status, .. }
                if *status == StatusCode::METHOD_NOT_ALLOWED =>
            {
                ProbeFailure::MethodRejected
            }
            EngineError::RequestSend { source, .. } if source.is_connect() => {
                ProbeFailure::Unreachable
            }
            EngineError::Timeout { .. } => ProbeFailure::Unreachable,
            _ => ProbeFailure::Other,
        }
    }
}

/// Coarse classification of a failed reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    /// The host answered but rejected the request method (HTTP 405).
    MethodRejected,
    /// The host could not be reached at all.
    Unreachable,
    /// Any other failure (bad status, decode error, ...).
    Other,
}

impl ProbeFailure {
    /// Operator-facing description used in connection alerts.
    pub fn message(self) -> &'static str {
        match self {
            ProbeFailure::MethodRejected => {
                "the engine rejected the request method (405 Method Not Allowed)"
            }
            ProbeFailure::Unreachable => {
                "the engine host is unreachable; make sure the engine is running"
            }
            ProbeFailure::Other => "the engine returned an unexpected response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_requests_maps_to_resource_exhaustion() {
        let err = EngineError::from_status("gamesession/ui-sync-status", StatusCode::TOO_MANY_REQUESTS);
        assert!(err.is_resource_exhausted());
    }

    #[test]
    fn other_statuses_keep_their_code() {
        let err = EngineError::from_status("gamesession/ui-sync-status", StatusCode::BAD_GATEWAY);
        assert!(!err.is_resource_exhausted());
        match err {
            EngineError::RequestStatus { status, .. } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn method_rejection_is_classified_for_probes() {
        let err = EngineError::from_status("gamesession/ui-sync-status", StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.probe_failure(), ProbeFailure::MethodRejected);
    }

    #[test]
    fn timeout_counts_as_unreachable() {
        let err = EngineError::Timeout {
            path: "gamesession/ui-sync-status".into(),
        };
        assert_eq!(err.probe_failure(), ProbeFailure::Unreachable);
    }
}
