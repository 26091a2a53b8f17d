// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deck endpoints: upload, listing, card generation and deletion.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    Json,
};

use super::run_blocking;
use crate::{
    auth::{authenticate_token, OptionalAuth},
    cards::synthesize_cards,
    error::ApiError,
    models::{CardsResponse, DeckListResponse, SuccessResponse, UploadResponse},
    state::AppState,
    storage::HistoryEntry,
};

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(err.status(), "validation_error", err.body_text())
}

/// Fields read from an upload form.
#[derive(Default)]
struct UploadFields {
    file: Option<(String, Vec<u8>)>,
    token: Option<String>,
}

async fn read_upload_fields(mut multipart: Multipart) -> Result<UploadFields, ApiError> {
    let mut fields = UploadFields::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::bad_request("File field has no filename"))?;
                let bytes = field.bytes().await.map_err(multipart_error)?;
                fields.file = Some((filename, bytes.to_vec()));
            }
            Some("token") => {
                fields.token = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }
    Ok(fields)
}

/// Upload a PDF deck.
///
/// Authentication is optional. When present, the uploader is recorded on
/// the deck and in the history.
#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = crate::models::UploadForm, content_type = "multipart/form-data"),
    tag = "Decks",
    security((), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deck stored", body = UploadResponse),
        (status = 400, description = "Not a PDF or invalid name", body = crate::error::ErrorBody),
        (status = 401, description = "Token present but invalid", body = crate::error::ErrorBody),
        (status = 409, description = "A deck with this name exists", body = crate::error::ErrorBody),
    )
)]
pub async fn upload_deck(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let fields = read_upload_fields(multipart).await?;
    let (filename, content) = fields
        .file
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let actor = match (user, fields.token) {
        (Some(user), _) => Some(user.email),
        (None, Some(token)) if state.config.allow_body_token => {
            Some(authenticate_token(&state, token.trim())?.email)
        }
        _ => None,
    };

    run_blocking(move || {
        let deck = state
            .decks()
            .upload(&filename, &content, actor.as_deref())?;

        tracing::info!(deck = %deck.name, size = deck.size_bytes, "Deck uploaded");
        let mut entry = HistoryEntry::upload(&deck.name, deck.size_bytes);
        if let Some(actor) = &actor {
            entry = entry.with_actor(actor);
        }
        state.history().append(entry);

        Ok(Json(UploadResponse {
            success: true,
            filename: deck.name,
            size: deck.size_bytes,
        }))
    })
    .await
}

/// List all decks, ordered by name.
#[utoipa::path(
    get,
    path = "/api/decks",
    tag = "Decks",
    responses((status = 200, body = DeckListResponse))
)]
pub async fn list_decks(State(state): State<AppState>) -> Result<Json<DeckListResponse>, ApiError> {
    run_blocking(move || {
        let decks = state.decks().list()?.into_iter().map(Into::into).collect();
        Ok(Json(DeckListResponse { decks }))
    })
    .await
}

async fn synthesize_for(state: AppState, name: String) -> Result<Json<CardsResponse>, ApiError> {
    run_blocking(move || {
        let cards = synthesize_cards(&state.decks(), state.synthesizer.as_ref(), &name)?;

        state
            .history()
            .append(HistoryEntry::synthesize(&name, cards.len()));

        Ok(Json(CardsResponse {
            success: true,
            total: cards.len(),
            cards,
            deck_name: name,
        }))
    })
    .await
}

/// Generate flashcards from a deck.
#[utoipa::path(
    post,
    path = "/api/decks/{name}/cards",
    params(
        ("name" = String, Path, description = "Deck name")
    ),
    tag = "Decks",
    responses(
        (status = 200, body = CardsResponse),
        (status = 404, description = "No such deck", body = crate::error::ErrorBody),
    )
)]
pub async fn create_cards(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CardsResponse>, ApiError> {
    synthesize_for(state, name).await
}

/// Get the cards of a deck.
///
/// Cards are not stored, so this generates them the same way as the POST
/// route and is recorded in the history likewise.
#[utoipa::path(
    get,
    path = "/api/decks/{name}/cards",
    params(
        ("name" = String, Path, description = "Deck name")
    ),
    tag = "Decks",
    responses(
        (status = 200, body = CardsResponse),
        (status = 404, description = "No such deck", body = crate::error::ErrorBody),
    )
)]
pub async fn get_cards(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CardsResponse>, ApiError> {
    synthesize_for(state, name).await
}

/// Delete a deck and its content.
#[utoipa::path(
    delete,
    path = "/api/decks/{name}",
    params(
        ("name" = String, Path, description = "Deck name")
    ),
    tag = "Decks",
    responses(
        (status = 200, body = SuccessResponse),
        (status = 404, description = "No such deck", body = crate::error::ErrorBody),
    )
)]
pub async fn delete_deck(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, ApiError> {
    run_blocking(move || {
        state.decks().delete(&name)?;

        tracing::info!(deck = %name, "Deck deleted");
        state.history().append(HistoryEntry::delete(&name));
        Ok(Json(SuccessResponse::ok()))
    })
    .await
}
