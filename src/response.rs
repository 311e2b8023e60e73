//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Debug, Default, Serialize)]
pub struct MetaCount {
    pub count: u64,
    /// Matching rows regardless of paging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Items modified by a bulk update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<u64>,
}

pub fn success_one<T: Serialize>(status: StatusCode, data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (status, Json(SuccessOne { data, meta: None }))
}

/// Single entity after an update, with `meta.changed`.
pub fn success_updated<T: Serialize>(data: T, changed: bool) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::OK,
        Json(SuccessOne {
            data,
            meta: Some(serde_json::json!({ "changed": changed })),
        }),
    )
}

pub fn success_many<T: Serialize>(status: StatusCode, data: Vec<T>, mut meta: MetaCount) -> (StatusCode, Json<SuccessMany<T>>) {
    meta.count = data.len() as u64;
    (status, Json(SuccessMany { data, meta }))
}
