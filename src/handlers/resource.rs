//! Resource handlers: list, search, autocomplete, create, read, update, delete, bulk.
//! Generic over the resource type; each route instantiates them with `::<E>`.

use crate::error::{AppError, ReflectError};
use crate::query::Filter;
use crate::reflect::ClassDescriptor;
use crate::repository::Resource;
use crate::response::{success_many, success_one, success_updated, MetaCount};
use crate::state::ResourceState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    pub field: String,
    #[serde(default)]
    pub q: String,
    pub limit: Option<u32>,
}

fn parse_id<E: Resource>(raw: &str) -> Result<E::Id, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", raw)))
}

fn body_to_entity<E: Resource>(value: Value) -> Result<E, AppError> {
    if !value.is_object() {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| AppError::BadRequest(format!("invalid {}: {}", E::NAME, e)))
}

fn body_to_entities<E: Resource>(value: Value) -> Result<Vec<E>, AppError> {
    match value {
        Value::Array(items) => items.into_iter().map(body_to_entity::<E>).collect(),
        _ => Err(AppError::BadRequest("body must be a JSON array".into())),
    }
}

fn parse_param(name: &str, raw: &str) -> Result<u32, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid {}: {}", name, raw)))
}

/// Typed filter value for a query-string parameter, following the field's declared type:
/// the raw text is tried as a string first, then as JSON (numbers, booleans).
fn query_value<E: Resource>(descriptor: &ClassDescriptor<E>, field: &str, raw: &str) -> Result<Value, AppError> {
    if !descriptor.scalar_fields().any(|f| f.name() == field) {
        return Err(ReflectError::NoSuchField {
            class: descriptor.class_name(),
            field: field.to_string(),
        }
        .into());
    }
    let mut probe = descriptor.new_instance();
    if descriptor.set(&mut probe, field, Value::String(raw.to_string())).is_err() {
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|_| AppError::BadRequest(format!("invalid value for {}: {}", field, raw)))?;
        descriptor
            .set(&mut probe, field, parsed)
            .map_err(|_| AppError::BadRequest(format!("invalid value for {}: {}", field, raw)))?;
    }
    Ok(descriptor.get(&probe, field)?)
}

/// GET / with `limit`, `offset` and `field=value` equality filters.
pub async fn list<E: Resource>(
    State(state): State<ResourceState<E>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let descriptor = state.service.descriptor()?;
    let mut limit = None;
    let mut offset = None;
    let mut filter = Filter::new();
    for (key, raw) in params {
        match key.as_str() {
            "limit" => limit = Some(parse_param("limit", &raw)?),
            "offset" => offset = Some(parse_param("offset", &raw)?),
            _ => {
                let value = query_value(&descriptor, &key, &raw)?;
                filter = filter.eq(key, value);
            }
        }
    }
    let rows = state.service.list(&filter, limit, offset).await?;
    let total = state.service.count(&filter).await?;
    Ok(success_many(
        StatusCode::OK,
        rows,
        MetaCount {
            total: Some(total),
            ..MetaCount::default()
        },
    ))
}

/// POST /search: an object queries by example, an array by any of several examples.
pub async fn search<E: Resource>(
    State(state): State<ResourceState<E>>,
    Query(page): Query<PageParams>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let rows = match body {
        Value::Array(_) => {
            let probes = body_to_entities::<E>(body)?;
            state.service.find_any_of(&probes, page.limit, page.offset).await?
        }
        other => {
            let probe = body_to_entity::<E>(other)?;
            state.service.find_by_example(&probe, page.limit, page.offset).await?
        }
    };
    Ok(success_many(StatusCode::OK, rows, MetaCount::default()))
}

pub async fn autocomplete<E: Resource>(
    State(state): State<ResourceState<E>>,
    Query(params): Query<AutocompleteParams>,
) -> Result<impl IntoResponse, AppError> {
    let values = state
        .service
        .autocomplete(&params.field, &params.q, params.limit)
        .await?;
    Ok(success_many(StatusCode::OK, values, MetaCount::default()))
}

pub async fn create<E: Resource>(
    State(state): State<ResourceState<E>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let payload = body_to_entity::<E>(body)?;
    let created = state.service.create(&payload).await?;
    Ok(success_one(StatusCode::CREATED, created))
}

pub async fn read<E: Resource>(
    State(state): State<ResourceState<E>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<E>(&id)?;
    let entity = state.service.read(&id).await?;
    Ok(success_one(StatusCode::OK, entity))
}

pub async fn update<E: Resource>(
    State(state): State<ResourceState<E>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<E>(&id)?;
    let payload = body_to_entity::<E>(body)?;
    let updated = state.service.update(&id, &payload).await?;
    Ok(success_updated(updated.entity, updated.changed))
}

pub async fn delete<E: Resource>(
    State(state): State<ResourceState<E>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<E>(&id)?;
    state.service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_create<E: Resource>(
    State(state): State<ResourceState<E>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let payloads = body_to_entities::<E>(body)?;
    let created = state.service.bulk_create(&payloads).await?;
    Ok(success_many(StatusCode::CREATED, created, MetaCount::default()))
}

pub async fn bulk_update<E: Resource>(
    State(state): State<ResourceState<E>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let payloads = body_to_entities::<E>(body)?;
    let updated = state.service.bulk_update(&payloads).await?;
    let changed = updated.iter().filter(|u| u.changed).count() as u64;
    let rows = updated.into_iter().map(|u| u.entity).collect();
    Ok(success_many(
        StatusCode::OK,
        rows,
        MetaCount {
            changed: Some(changed),
            ..MetaCount::default()
        },
    ))
}
