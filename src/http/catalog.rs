//! List, create and get routes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::{blocking, parse_body, AppState};
use crate::catalog::{CatalogEntry, Draft};
use crate::error::HubError;
use crate::model::{Model, ModelStore};

pub(super) async fn list_handler<S, M>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<M>>, HubError>
where
    S: ModelStore + Clone + 'static,
    M: CatalogEntry,
{
    let models = blocking(move || state.catalog.list::<M>()).await?;
    Ok(Json(models))
}

pub(super) async fn get_handler<S, M>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<u64>,
) -> Result<Json<M>, HubError>
where
    S: ModelStore + Clone + 'static,
    M: CatalogEntry,
{
    let model = blocking(move || state.catalog.get::<M>(id)).await?;
    Ok(Json(model))
}

/// `POST`: create a record from the body. Responds 201 with the stored record.
pub(super) async fn create_handler<S, D>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<(StatusCode, Json<D::Model>), HubError>
where
    S: ModelStore + Clone + 'static,
    D: Draft,
{
    let draft: D = serde_json::from_value(parse_body(&body)?).map_err(|e| {
        HubError::Validation(format!(
            "invalid {} payload: {}",
            <D::Model as Model>::COLLECTION,
            e
        ))
    })?;
    let model = blocking(move || state.catalog.create(draft)).await?;
    Ok((StatusCode::CREATED, Json(model)))
}
