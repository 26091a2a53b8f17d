// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    cards::Card,
    error::{ApiError, ErrorBody},
    models::{
        CardsResponse, ChangePasswordRequest, ClearHistoryResponse, DeckListResponse, DeckSummary,
        HistoryResponse, LoginRequest, LoginResponse, ProfileResponse, RegisterRequest,
        SuccessResponse, UploadForm, UploadResponse,
    },
    state::AppState,
    storage::{HistoryAction, HistoryEntry, Theme},
};

pub mod auth;
pub mod decks;
pub mod extract;
pub mod health;
pub mod history;
pub mod profile;

/// Run storage or hashing work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(ApiError::internal)?
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    let cors = cors_layer(&state.config.cors_allowed_origins);

    let api_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route(
            "/profile",
            get(profile::get_profile).delete(profile::delete_account),
        )
        .route("/profile/change_password", post(profile::change_password))
        .route("/upload", post(decks::upload_deck))
        .route("/decks", get(decks::list_decks))
        .route("/decks/{name}", axum::routing::delete(decks::delete_deck))
        .route(
            "/decks/{name}/cards",
            post(decks::create_cards).get(decks::get_cards),
        )
        .route(
            "/history",
            get(history::get_history).delete(history::clear_history),
        );

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Registers the bearer token scheme referenced by protected endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        profile::get_profile,
        profile::change_password,
        profile::delete_account,
        decks::upload_deck,
        decks::list_decks,
        decks::create_cards,
        decks::get_cards,
        decks::delete_deck,
        history::get_history,
        history::clear_history,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            ErrorBody,
            SuccessResponse,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ProfileResponse,
            ChangePasswordRequest,
            Theme,
            UploadForm,
            UploadResponse,
            DeckSummary,
            DeckListResponse,
            Card,
            CardsResponse,
            HistoryAction,
            HistoryEntry,
            HistoryResponse,
            ClearHistoryResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Profile", description = "Account management"),
        (name = "Decks", description = "Deck upload, listing and card generation"),
        (name = "History", description = "Action history"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
