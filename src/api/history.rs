// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! History endpoints.

use axum::{extract::State, Json};

use super::{extract::ApiQuery, run_blocking};
use crate::{
    error::ApiError,
    models::{ClearHistoryResponse, HistoryQuery, HistoryResponse},
    state::AppState,
};

/// List recorded actions, newest first.
#[utoipa::path(
    get,
    path = "/api/history",
    params(HistoryQuery),
    tag = "History",
    responses((status = 200, body = HistoryResponse))
)]
pub async fn get_history(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    run_blocking(move || {
        let (history, total) = state
            .history()
            .list_page(query.limit, query.offset.unwrap_or(0))?;
        Ok(Json(HistoryResponse {
            success: true,
            history,
            total,
        }))
    })
    .await
}

/// Remove every history entry. Irreversible.
#[utoipa::path(
    delete,
    path = "/api/history",
    tag = "History",
    responses((status = 200, body = ClearHistoryResponse))
)]
pub async fn clear_history(
    State(state): State<AppState>,
) -> Result<Json<ClearHistoryResponse>, ApiError> {
    run_blocking(move || {
        let removed = state.history().clear()?;
        tracing::info!(removed, "History cleared");
        Ok(Json(ClearHistoryResponse {
            success: true,
            removed,
        }))
    })
    .await
}
