//! Join, leave, reconcile and membership routes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;

use super::{blocking, parse_body, AppState};
use crate::error::HubError;
use crate::model::ModelStore;
use crate::roster::{id_field, MembershipRequest, ReconcileReport, Relationship};

/// `POST`: add the user to the parent. Responds with the updated parent.
pub(super) async fn join_handler<S, R>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<Json<R::Parent>, HubError>
where
    S: ModelStore + Clone + 'static,
    R: Relationship,
{
    let request = MembershipRequest::from_json(&parse_body(&body)?, R::PARENT_FIELD)?;
    let parent = blocking(move || {
        state
            .roster
            .join::<R>(request.parent_id, request.user_id)
    })
    .await?;
    Ok(Json(parent))
}

/// `DELETE`: remove the user from the parent. Responds with the updated parent.
pub(super) async fn leave_handler<S, R>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<Json<R::Parent>, HubError>
where
    S: ModelStore + Clone + 'static,
    R: Relationship,
{
    let request = MembershipRequest::from_json(&parse_body(&body)?, R::PARENT_FIELD)?;
    let parent = blocking(move || {
        state
            .roster
            .leave::<R>(request.parent_id, request.user_id)
    })
    .await?;
    Ok(Json(parent))
}

pub(super) async fn reconcile_handler<S, R>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<Json<ReconcileReport>, HubError>
where
    S: ModelStore + Clone + 'static,
    R: Relationship,
{
    let parent_id = id_field(&parse_body(&body)?, R::PARENT_FIELD)?;
    let report = blocking(move || state.roster.reconcile::<R>(parent_id)).await?;
    Ok(Json(report))
}

/// `GET /api/users/:id/<parents>`: the parents the user belongs to.
pub(super) async fn memberships_handler<S, R>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<u64>,
) -> Result<Json<Vec<R::Parent>>, HubError>
where
    S: ModelStore + Clone + 'static,
    R: Relationship,
{
    let parents = blocking(move || state.roster.memberships::<R>(user_id)).await?;
    Ok(Json(parents))
}
