//! API error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::debug;

use crate::service::ServiceError;
use crate::types::PhaseKey;

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,

    /// Phases durably written before a recalculation batch failed. Omitted
    /// for every other error.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub written: Vec<PhaseKey>,
}

/// Wrapper turning a [`ServiceError`] into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.code() {
            "unknown_phase" | "invalid_date" | "cyclic_dependency" => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            "unauthorized" => StatusCode::FORBIDDEN,
            "preceding_phase_incomplete"
            | "entry_criteria_incomplete"
            | "phase_already_completed"
            | "phase_not_started"
            | "stale_write" => StatusCode::CONFLICT,
            "not_found" => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            code: self.0.code(),
            message: self.0.to_string(),
            written: self.0.written().to_vec(),
        };
        debug!(code = body.code, status = %status, "request rejected");
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PhaseKey, Role};
    use crate::workflow::WorkflowError;

    #[test]
    fn unauthorized_maps_to_403() {
        let err = ApiError(ServiceError::Workflow(WorkflowError::Unauthorized {
            role: Role::Qa,
            phase: PhaseKey::new("planning"),
        }));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn gate_failure_maps_to_409() {
        let err = ApiError(ServiceError::Workflow(
            WorkflowError::EntryCriteriaIncomplete {
                completed: 3,
                mandatory: 5,
            },
        ));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn stale_write_maps_to_409() {
        let err = ApiError(ServiceError::Store(
            crate::store::StoreError::StaleWrite {
                phase: PhaseKey::new("development"),
                expected: 1,
                actual: 2,
            },
        ));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_failure_maps_to_502() {
        let err = ApiError(ServiceError::Store(crate::store::StoreError::Unavailable(
            "backend down".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn partial_recalc_body_names_the_written_phases() {
        let err = ApiError(ServiceError::PartialRecalc {
            written: vec![PhaseKey::new("development")],
            source: crate::store::StoreError::Unavailable("backend down".to_string()),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let body = ErrorBody {
            code: err.0.code(),
            message: err.0.to_string(),
            written: err.0.written().to_vec(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "store_unavailable");
        assert_eq!(json["written"][0], "development");
    }
}
