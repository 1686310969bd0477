//! Generic CRUD handlers.
//!
//! Two dispatchers serve every content type: `collection` for
//! `/api/:resource` and `item` for `/api/:resource/:id`. Method dispatch,
//! validation, and the envelope are shared; everything per-resource comes
//! from the registry spec.

pub mod upload;

use axum::{
    extract::{Path, Query, State},
    http::Method,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::api::ApiResponse;
use crate::error::ApiError;
use crate::registry::{self, ResourceSpec, SchemaError};
use crate::store::Document;
use crate::AppState;

/// `/api/:resource` - list, create, and the singleton upsert.
pub async fn collection(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    method: Method,
    Query(params): Query<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> Response {
    let Some(spec) = registry::find(&resource) else {
        return ApiError::not_found(format!("unknown resource: {}", resource)).into_response();
    };

    match dispatch_collection(&state, spec, &method, &params, body).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// `/api/:resource/:id` - update and delete by id.
pub async fn item(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    method: Method,
    body: Option<Json<Value>>,
) -> Response {
    let Some(spec) = registry::find(&resource) else {
        return ApiError::not_found(format!("unknown resource: {}", resource)).into_response();
    };

    match dispatch_item(&state, spec, &method, &id, body).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn dispatch_collection(
    state: &AppState,
    spec: &'static ResourceSpec,
    method: &Method,
    params: &HashMap<String, String>,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    if *method == Method::GET && spec.allows(&Method::GET) {
        if spec.singleton {
            return singleton_get(state, spec).await;
        }
        return list(state, spec, params).await;
    }

    if *method == Method::POST && spec.allows(&Method::POST) {
        if spec.create_stubbed {
            return Err(ApiError::not_implemented(format!(
                "{} creation is not implemented",
                spec.label
            )));
        }
        if spec.singleton {
            return singleton_upsert(state, spec, body).await;
        }
        return create(state, spec, body).await;
    }

    // PUT and DELETE belong on the item path; reaching them here means the
    // caller supplied no id.
    if *method == Method::PUT && spec.allows(&Method::PUT) {
        if spec.singleton {
            return singleton_upsert(state, spec, body).await;
        }
        return Err(ApiError::missing_id(spec.label));
    }

    if *method == Method::DELETE && spec.allows(&Method::DELETE) {
        return Err(ApiError::missing_id(spec.label));
    }

    Err(ApiError::method_not_allowed(spec.allow_header()))
}

async fn dispatch_item(
    state: &AppState,
    spec: &'static ResourceSpec,
    method: &Method,
    id: &str,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    if spec.item_methods().is_empty() {
        return Err(ApiError::not_found(format!(
            "no such route for {}",
            spec.name
        )));
    }

    if *method == Method::PUT && spec.allows(&Method::PUT) {
        return update(state, spec, id, body).await;
    }

    if *method == Method::DELETE && spec.allows(&Method::DELETE) {
        return delete(state, spec, id).await;
    }

    Err(ApiError::method_not_allowed(spec.item_allow_header()))
}

async fn list(
    state: &AppState,
    spec: &'static ResourceSpec,
    params: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let filters: Vec<(&str, &str)> = spec
        .filterable
        .iter()
        .filter_map(|field| params.get(*field).map(|value| (*field, value.as_str())))
        .collect();

    let docs = state.store.list(spec, &filters).await?;
    let data: Vec<Value> = docs.iter().map(Document::to_value).collect();
    Ok(ApiResponse::success(data).into_response())
}

async fn create(
    state: &AppState,
    spec: &'static ResourceSpec,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let input = registry::sanitize(spec, object_body(body)?);
    registry::validate_create(spec, &input)?;

    if let Some((first, second)) = spec.unique_key {
        let pairs = unique_pairs(&input, first, second);
        if state.store.find_by_fields(spec, &pairs).await?.is_some() {
            return Err(ApiError::duplicate(format!(
                "{} with {} '{}' and {} '{}' already exists",
                spec.label, first, pairs[0].1, second, pairs[1].1
            )));
        }
    }

    let data = registry::apply_defaults(spec, input);
    let doc = state.store.insert(spec, data).await?;
    Ok(ApiResponse::created(doc.to_value()).into_response())
}

async fn update(
    state: &AppState,
    spec: &'static ResourceSpec,
    id: &str,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let id = parse_id(spec, id)?;
    let input = registry::sanitize(spec, object_body(body)?);
    registry::validate_update(spec, &input)?;

    match state.store.update(spec, id, input).await? {
        Some(doc) => Ok(ApiResponse::success(doc.to_value()).into_response()),
        None => Err(ApiError::not_found(format!("{} not found", spec.label))),
    }
}

async fn delete(
    state: &AppState,
    spec: &'static ResourceSpec,
    id: &str,
) -> Result<Response, ApiError> {
    let id = parse_id(spec, id)?;

    if state.store.delete(spec, id).await? {
        Ok(ApiResponse::success(json!({})).into_response())
    } else {
        Err(ApiError::not_found(format!("{} not found", spec.label)))
    }
}

/// GET on the singleton: return the document, creating the default first
/// if the collection is empty.
async fn singleton_get(
    state: &AppState,
    spec: &'static ResourceSpec,
) -> Result<Response, ApiError> {
    if let Some(doc) = state.store.find_first(spec).await? {
        return Ok(ApiResponse::success(doc.to_value()).into_response());
    }

    let defaults = registry::apply_defaults(spec, Map::new());
    let doc = state.store.insert(spec, defaults).await?;
    Ok(ApiResponse::success(doc.to_value()).into_response())
}

/// POST and PUT on the singleton both upsert.
async fn singleton_upsert(
    state: &AppState,
    spec: &'static ResourceSpec,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let input = registry::sanitize(spec, object_body(body)?);
    registry::validate_update(spec, &input)?;

    match state.store.find_first(spec).await? {
        Some(existing) => match state.store.update(spec, existing.id, input).await? {
            Some(doc) => Ok(ApiResponse::success(doc.to_value()).into_response()),
            None => Err(ApiError::not_found(format!("{} not found", spec.label))),
        },
        None => {
            let doc = state
                .store
                .insert(spec, registry::apply_defaults(spec, input))
                .await?;
            Ok(ApiResponse::created(doc.to_value()).into_response())
        }
    }
}

fn object_body(body: Option<Json<Value>>) -> Result<Map<String, Value>, ApiError> {
    match body {
        Some(Json(Value::Object(map))) => Ok(map),
        _ => Err(SchemaError::ExpectedObject.into()),
    }
}

fn parse_id(spec: &ResourceSpec, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::bad_request(format!("invalid {} id: {}", spec.label, raw)))
}

fn unique_pairs<'a>(
    input: &'a Map<String, Value>,
    first: &'static str,
    second: &'static str,
) -> Vec<(&'static str, &'a str)> {
    [first, second]
        .iter()
        .map(|field| {
            (
                *field,
                input.get(*field).and_then(Value::as_str).unwrap_or_default(),
            )
        })
        .collect()
}
