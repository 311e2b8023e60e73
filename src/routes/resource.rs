//! Resource routes: one router per resource type, nested by the caller under its path.

use crate::handlers::resource::{
    autocomplete, bulk_create, bulk_update, create, delete as delete_handler, list, read, search,
    update,
};
use crate::repository::Resource;
use crate::state::ResourceState;
use axum::extract::DefaultBodyLimit;
use axum::{routing::get, routing::post, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// CRUD, search, autocomplete and bulk routes for `E`, with the request body limit applied.
pub fn resource_routes<E: Resource>(state: ResourceState<E>) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/", get(list::<E>).post(create::<E>))
        .route("/search", post(search::<E>))
        .route("/autocomplete", get(autocomplete::<E>))
        .route("/bulk", post(bulk_create::<E>).patch(bulk_update::<E>))
        .route(
            "/:id",
            get(read::<E>).patch(update::<E>).delete(delete_handler::<E>),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

/// Nests [`resource_routes`] under `/<E::NAME>`.
pub fn mount<E: Resource>(router: Router, state: ResourceState<E>) -> Router {
    router.nest(&format!("/{}", E::NAME), resource_routes(state))
}
