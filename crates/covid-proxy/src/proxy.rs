//! Request handlers for the public endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, Uri},
    Json,
};
use tracing::info;

use crate::error::{AppError, UpstreamError};
use crate::models::{CountryData, CountryQuery, CountryStat, Envelope, StatusResponse};
use crate::state::AppState;

/// Status string returned by the liveness check.
pub const READY_MESSAGE: &str = "Up & Running fine. UwU";

/// Handler for `GET /`
pub async fn sanity_check() -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        status: READY_MESSAGE.to_string(),
    })
}

/// Handler for `GET /countryList`
pub async fn country_list_handler(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<String>>>, AppError> {
    let countries = state.provider.countries().await?;
    info!("Returning {} countries", countries.len());
    Ok(Json(Envelope::ok(countries)))
}

/// Handler for `POST /data`
///
/// An unknown country/day pair is not an error for callers: it answers
/// 200 with `success: false` and every field set to -1.
pub async fn country_data_handler(
    State(state): State<AppState>,
    body: Result<Json<CountryQuery>, JsonRejection>,
) -> Result<Json<Envelope<CountryData>>, AppError> {
    let Json(query) = body?;
    if query.country.trim().is_empty() {
        return Err(AppError::InvalidRequestBody(
            "country must not be empty".to_string(),
        ));
    }

    info!("Fetching history for {} on {}", query.country, query.date);
    match state.provider.history(&query.country, &query.date).await {
        Ok(record) => Ok(Json(Envelope::ok(CountryData::from(record)))),
        Err(UpstreamError::EmptyResult) => {
            info!("No history for {} on {}", query.country, query.date);
            Ok(Json(Envelope::missing(CountryData::NOT_FOUND)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Handler for `GET /all`
pub async fn all_handler(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<CountryStat>>>, AppError> {
    let stats: Vec<CountryStat> = state
        .provider
        .statistics()
        .await?
        .into_iter()
        .map(CountryStat::from)
        .collect();
    info!("Returning statistics for {} countries", stats.len());
    Ok(Json(Envelope::ok(stats)))
}

/// Fallback for paths with no route.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// Fallback for a known path called with the wrong method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
