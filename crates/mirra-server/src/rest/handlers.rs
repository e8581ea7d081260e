//! CRUD request handlers. Every mutation persists, then broadcasts
//! `{"entity", "mode", "data"}` through the durable broadcaster.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use mirra_core::EntityDef;
use mirra_store::StoreError;
use serde_json::{Value, json};
use tracing::info;

use super::query::parse_list_options;
use crate::errors::ApiError;
use crate::server::AppState;

fn lookup<'a>(state: &'a AppState, entity: &str) -> Result<&'a EntityDef, ApiError> {
    state
        .entities
        .get(entity)
        .ok_or_else(|| ApiError::UnknownEntity(entity.to_string()))
}

fn map_store(err: StoreError) -> ApiError {
    match err {
        StoreError::InvalidDocument(msg) => ApiError::BadRequest(msg),
        StoreError::DocumentExists { collection, id } => {
            ApiError::Conflict(format!("{collection}/{id}"))
        }
        StoreError::DocumentNotFound { collection, id } => {
            ApiError::NotFound(format!("{collection}/{id}"))
        }
        other => ApiError::Store(other),
    }
}

async fn broadcast_mutation(
    state: &AppState,
    entity: &str,
    mode: &str,
    data: &Value,
) -> Result<(), ApiError> {
    let payload = json!({"entity": entity, "mode": mode, "data": data});
    let id = state.broadcaster.broadcast(&payload).await?;
    info!(entity, mode, event_id = id, "mutation broadcast");
    Ok(())
}

/// `POST /{entity}` — create a document, 201 with the saved body.
pub async fn create_document(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let def = lookup(&state, &entity)?;
    let collection = def.name.clone();

    let saved = state
        .store
        .insert_document(&collection, body)
        .map_err(map_store)?;
    broadcast_mutation(&state, &collection, "create", &saved).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// `GET /{entity}` — list documents with pagination, sort, and filters.
pub async fn list_documents(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let def = lookup(&state, &entity)?;
    let opts = parse_list_options(def, &params)?;

    let docs = state
        .store
        .list_documents(&def.name, &opts)
        .map_err(map_store)?;
    Ok(Json(Value::Array(docs)))
}

/// `GET /{entity}/{id}` — fetch one document.
pub async fn get_document(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let def = lookup(&state, &entity)?;

    let doc = state
        .store
        .get_document(&def.name, &id)
        .map_err(map_store)?
        .ok_or_else(|| ApiError::NotFound(format!("{entity}/{id}")))?;
    Ok(Json(doc))
}

/// `PUT /{entity}/{id}` — replace a document's fields, keeping its `_id`.
pub async fn update_document(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let def = lookup(&state, &entity)?;
    let collection = def.name.clone();

    let updated = state
        .store
        .update_document(&collection, &id, body)
        .map_err(map_store)?
        .ok_or_else(|| ApiError::NotFound(format!("{entity}/{id}")))?;
    broadcast_mutation(&state, &collection, "update", &updated).await?;
    Ok(Json(updated))
}

/// `DELETE /{entity}/{id}` — remove a document, returning its last body.
pub async fn delete_document(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let def = lookup(&state, &entity)?;
    let collection = def.name.clone();

    let deleted = state
        .store
        .delete_document(&collection, &id)
        .map_err(map_store)?
        .ok_or_else(|| ApiError::NotFound(format!("{entity}/{id}")))?;
    broadcast_mutation(&state, &collection, "delete", &deleted).await?;
    Ok(Json(deleted))
}
