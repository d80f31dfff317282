//! Schedule recalculation endpoint handler.

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::service::RecalculateResult;
use crate::types::{PhaseKey, ProjectId, SchedulePhase};

#[derive(Debug, Deserialize)]
pub struct RecalculateRequest {
    /// The phase's new end date (ISO 8601 calendar date).
    pub end_date: NaiveDate,
}

/// Response shape: the persisted rows plus the cascade count the caller
/// usually wants to display.
#[derive(Debug, Serialize)]
pub struct RecalculateResponse {
    pub modified: SchedulePhase,
    pub cascade: Vec<SchedulePhase>,
    pub cascade_count: usize,
}

impl From<RecalculateResult> for RecalculateResponse {
    fn from(result: RecalculateResult) -> Self {
        let cascade_count = result.cascade_count();
        RecalculateResponse {
            modified: result.modified,
            cascade: result.cascade,
            cascade_count,
        }
    }
}

/// `POST /api/v1/projects/{project}/phases/{phase}/recalculate`
///
/// Moves one schedule phase's end date and rewrites every transitive
/// dependent's dates and delay status.
pub async fn recalculate_handler(
    State(state): State<AppState>,
    Path((project, phase)): Path<(String, String)>,
    Json(body): Json<RecalculateRequest>,
) -> Result<Json<RecalculateResponse>, ApiError> {
    let result = state
        .service()
        .recalculate(
            &ProjectId::new(project),
            &PhaseKey::new(phase),
            body.end_date,
        )
        .await?;
    Ok(Json(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_an_iso_date() {
        let body: RecalculateRequest =
            serde_json::from_str(r#"{"end_date": "2024-01-15"}"#).unwrap();
        assert_eq!(
            body.end_date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn malformed_date_is_rejected() {
        assert!(serde_json::from_str::<RecalculateRequest>(r#"{"end_date": "15/01/2024"}"#).is_err());
    }
}
