//! Error types for request handling.

use super::HandlerResponse;
use crate::model::MethodResponses;
use crate::naming::NameError;
use flat_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// A failed request. The variant decides the status code; the message is
/// what the client sees in `{"message": ...}`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HandlerError {
    /// Missing hierarchy parameter, malformed body, singleton-name mismatch,
    /// write to the bookkeeping key.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Create collided, or an update raced another writer.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> u16 {
        match self {
            HandlerError::BadRequest(_) => 400,
            HandlerError::NotFound(_) => 404,
            HandlerError::Conflict(_) => 409,
            HandlerError::Forbidden(_) => 403,
            HandlerError::Invalid(_) => 422,
            HandlerError::Internal(_) => 500,
        }
    }

    /// Swaps the message for the configured description of this status, if
    /// the method declares one. The status itself never changes.
    pub fn configured(self, responses: &MethodResponses) -> Self {
        let Some(description) = responses.get(&self.status()) else {
            return self;
        };
        let description = description.clone();
        match self {
            HandlerError::BadRequest(_) => HandlerError::BadRequest(description),
            HandlerError::NotFound(_) => HandlerError::NotFound(description),
            HandlerError::Conflict(_) => HandlerError::Conflict(description),
            HandlerError::Forbidden(_) => HandlerError::Forbidden(description),
            HandlerError::Invalid(_) => HandlerError::Invalid(description),
            HandlerError::Internal(_) => HandlerError::Internal(description),
        }
    }

    pub fn into_response(self) -> HandlerResponse {
        HandlerResponse::json(self.status(), json!({ "message": self.to_string() }))
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        let msg = err.to_string();
        match err {
            StoreError::NotFound { .. } => HandlerError::NotFound(msg),
            StoreError::AlreadyExists { .. } | StoreError::Conflict { .. } => HandlerError::Conflict(msg),
            StoreError::Forbidden(_) => HandlerError::Forbidden(msg),
            StoreError::Invalid(_) => HandlerError::Invalid(msg),
            StoreError::BadRequest(_) => HandlerError::BadRequest(msg),
            StoreError::Internal(_) | StoreError::ActorClosed | StoreError::ActorDropped => {
                HandlerError::Internal(msg)
            }
        }
    }
}

impl From<NameError> for HandlerError {
    fn from(err: NameError) -> Self {
        HandlerError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RestMethod;

    #[test]
    fn test_store_error_mapping() {
        let cases = [
            (StoreError::not_found("k", "n"), 404),
            (
                StoreError::AlreadyExists {
                    kind: "k".into(),
                    name: "n".into(),
                },
                409,
            ),
            (
                StoreError::Conflict {
                    kind: "k".into(),
                    name: "n".into(),
                    reason: "stale".into(),
                },
                409,
            ),
            (StoreError::Forbidden("no".into()), 403),
            (StoreError::Invalid("bad path".into()), 422),
            (StoreError::Internal("boom".into()), 500),
            (StoreError::ActorClosed, 500),
        ];
        for (err, status) in cases {
            assert_eq!(HandlerError::from(err).status(), status);
        }
    }

    #[test]
    fn test_configured_description_keeps_status() {
        let mut responses = RestMethod::Get.default_responses();
        responses.insert(500, "Backend unavailable".into());

        let err = HandlerError::from(StoreError::Internal("etcd".into())).configured(&responses);
        assert_eq!(err, HandlerError::Internal("Backend unavailable".into()));

        let err = HandlerError::Conflict("raced".into()).configured(&responses);
        assert_eq!(err, HandlerError::Conflict("raced".into()));
    }
}
