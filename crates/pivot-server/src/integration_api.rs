//! Integration listing, search, and user settings endpoints
//!
//! Search streams one JSON object per line per source outcome, in
//! completion order; the response body ends when every eligible source has
//! reported. Client disconnects stop the stream without retracting
//! in-flight fetches.

use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pivot_core::{Indicator, IndicatorType};
use pivot_engine::{QueryRequest, VisibilityFilter};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::info;

/// GET /api/integration — registered sources and their capabilities
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    state.auth.authenticate(&headers).await?;
    let descriptors = state.registry.descriptors();
    Ok(Json(json!({ "integrations": descriptors })).into_response())
}

/// Query-string options for search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Explicit indicator type; omitted means classify
    #[serde(rename = "type")]
    pub itype: Option<String>,
    /// Comma-separated source subset; omitted means all eligible
    pub sources: Option<String>,
}

/// GET /api/integration/search/:query — run an orchestrated query and
/// stream NDJSON outcomes
pub async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = state.auth.authenticate(&headers).await?;

    let indicator = match &params.itype {
        Some(name) => {
            let itype: IndicatorType = name
                .parse()
                .map_err(|e: pivot_core::PivotError| ApiError::BadRequest(e.to_string()))?;
            Indicator::new(itype, &query)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?
        }
        None => Indicator::classify(&query).map_err(|e| ApiError::BadRequest(e.to_string()))?,
    };

    let sources = params.sources.as_deref().map(|csv| {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect::<Vec<_>>()
    });

    let settings = state.settings.get(&user.user_id).await?;
    let groups = state.link_groups.all().await?;
    let filter = Arc::new(VisibilityFilter::new(groups));

    info!(indicator = %indicator, user = %user.user_id, "search");

    let request = QueryRequest {
        indicator,
        user: user.clone(),
        settings,
        sources,
    };
    let outcomes = state.orchestrator.orchestrate(request);

    let lines = outcomes.map(move |outcome| {
        let filtered = filter.filter(outcome, &user);
        let mut line = serde_json::to_string(&filtered).unwrap_or_else(|e| {
            json!({
                "source": filtered.source_id,
                "status": "error",
                "error": format!("serialization: {e}"),
            })
            .to_string()
        });
        line.push('\n');
        Ok::<_, Infallible>(line)
    });

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response())
}

/// GET /api/integration/userSettings — the caller's settings, secrets masked
pub async fn user_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = state.auth.authenticate(&headers).await?;
    let settings = state
        .settings
        .get(&user.user_id)
        .await?
        .unwrap_or_else(|| pivot_engine::UserIntegrationSettings::defaults(&user.user_id));
    Ok(Json(settings.masked()).into_response())
}

/// GET /api/roles — the catalogue of assignable roles
pub async fn roles(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    state.auth.authenticate(&headers).await?;
    Ok(Json(json!({ "roles": pivot_core::ASSIGNABLE_ROLES })).into_response())
}
