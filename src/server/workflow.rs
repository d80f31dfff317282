//! Workflow endpoint handlers: start, approve, criterion toggle.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use axum::http::StatusCode;

use super::{ApiError, AppState};
use crate::service::{ApprovePhaseResult, NewCriterion, StartPhaseResult, ToggleCriterionResult};
use crate::types::{Actor, CriterionId, EntryCriterion, PhaseKey, ProjectId, Role};

/// Request body identifying who is acting.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorBody {
    pub actor_id: String,
    pub role: Role,
}

impl ActorBody {
    fn into_actor(self) -> Actor {
        Actor::new(self.actor_id, self.role)
    }
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    #[serde(flatten)]
    pub actor: ActorBody,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `POST /api/v1/projects/{project}/phases/{phase}/start`
///
/// Starts a phase. Responds with the instance, the advanced phase pointer,
/// and any criteria seeded from the phase template.
pub async fn start_handler(
    State(state): State<AppState>,
    Path((project, phase)): Path<(String, String)>,
) -> Result<Json<StartPhaseResult>, ApiError> {
    let result = state
        .service()
        .start_phase(&ProjectId::new(project), &PhaseKey::new(phase))
        .await?;
    Ok(Json(result))
}

/// `POST /api/v1/projects/{project}/phases/{phase}/approve`
///
/// Completes a phase on behalf of the request's actor. The gate must be
/// satisfied and the actor's role must be in the phase's approver set.
pub async fn approve_handler(
    State(state): State<AppState>,
    Path((project, phase)): Path<(String, String)>,
    Json(body): Json<ApproveRequest>,
) -> Result<Json<ApprovePhaseResult>, ApiError> {
    let result = state
        .service()
        .approve_phase(
            &ProjectId::new(project),
            &PhaseKey::new(phase),
            &body.actor.into_actor(),
            body.notes,
        )
        .await?;
    Ok(Json(result))
}

/// `POST /api/v1/criteria/{id}/toggle`
///
/// Flips one criterion's completion state and reports the phase's gate
/// status afterwards.
pub async fn toggle_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<ActorBody>,
) -> Result<Json<ToggleCriterionResult>, ApiError> {
    let result = state
        .service()
        .toggle_criterion(CriterionId::new(id), &body.into_actor())
        .await?;
    Ok(Json(result))
}

/// `POST /api/v1/projects/{project}/phases/{phase}/criteria`
///
/// Adds a manual entry criterion to a phase. 201 with the stored row.
pub async fn add_criterion_handler(
    State(state): State<AppState>,
    Path((project, phase)): Path<(String, String)>,
    Json(body): Json<NewCriterion>,
) -> Result<(StatusCode, Json<EntryCriterion>), ApiError> {
    let criterion = state
        .service()
        .add_criterion(&ProjectId::new(project), &PhaseKey::new(phase), body)
        .await?;
    Ok((StatusCode::CREATED, Json(criterion)))
}

/// `DELETE /api/v1/criteria/{id}`
pub async fn delete_criterion_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.service().delete_criterion(CriterionId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_request_parses_with_flattened_actor() {
        let body: ApproveRequest = serde_json::from_str(
            r#"{"actor_id": "po@example.com", "role": "product_owner", "notes": "ship it"}"#,
        )
        .unwrap();
        assert_eq!(body.actor.role, Role::ProductOwner);
        assert_eq!(body.notes.as_deref(), Some("ship it"));
    }

    #[test]
    fn notes_are_optional() {
        let body: ApproveRequest =
            serde_json::from_str(r#"{"actor_id": "pm@example.com", "role": "project_manager"}"#)
                .unwrap();
        assert!(body.notes.is_none());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = serde_json::from_str::<ActorBody>(
            r#"{"actor_id": "x@example.com", "role": "intern"}"#,
        );
        assert!(err.is_err());
    }
}
