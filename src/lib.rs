// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Flashdeck - Flashcard Deck Service
//!
//! Users register and log in with email and password, upload PDF decks,
//! generate question/answer cards from them and review a history of the
//! actions taken.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password hashing, bearer tokens and request extractors
//! - `cards` - Card synthesis from stored decks
//! - `storage` - Embedded database and deck content on disk

pub mod api;
pub mod auth;
pub mod cards;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
