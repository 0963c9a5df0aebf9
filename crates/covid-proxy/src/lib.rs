//! HTTP proxy in front of the RapidAPI covid-193 statistics API.
//!
//! Each endpoint makes one upstream call, reshapes the `response` payload
//! into a smaller schema and wraps it in `{success, data}`. Upstream
//! failures are reported as `{success: false, error: {kind, message}}`
//! with a 4xx/5xx status instead of an empty body.

pub mod config;
pub mod error;
/// Request, response and upstream record types.
pub mod models;
pub mod provider;
pub mod proxy;
/// Shared handler state.
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::proxy::{
    all_handler, country_data_handler, country_list_handler, method_not_allowed, not_found,
    sanity_check,
};
use crate::state::AppState;

/// Build the router with every endpoint and middleware attached.
pub fn app(state: AppState) -> Router {
    // Any origin, method and header, with credentials. Origin, methods and
    // headers are mirrored because a `*` is not allowed with credentials.
    let cors = CorsLayer::very_permissive();

    // Every response is JSON, including unknown paths and wrong methods.
    Router::new()
        .route("/", get(sanity_check).fallback(method_not_allowed))
        .route("/countryList", get(country_list_handler).fallback(method_not_allowed))
        .route("/data", post(country_data_handler).fallback(method_not_allowed))
        .route("/all", get(all_handler).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
