//! Song CRUD endpoints
//!
//! - `GET    /api/songs`      all songs keyed by id
//! - `GET    /api/songs/:id`  one song
//! - `POST   /api/songs`      create (broadcasts `new_song`)
//! - `PUT    /api/songs/:id`  replace text fields (broadcasts `updated_song`)
//! - `DELETE /api/songs/:id`  delete, answers with the deleted id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use lyrics_common::{NewSong, Song, SongUpdate};
use std::collections::BTreeMap;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn payload<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

/// GET /api/songs
pub async fn list_songs(State(state): State<AppState>) -> ApiResult<Json<BTreeMap<String, Song>>> {
    Ok(Json(state.songs.list().await?))
}

/// GET /api/songs/:song_id
pub async fn get_song(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> ApiResult<Json<Song>> {
    Ok(Json(state.songs.get(&song_id).await?))
}

/// POST /api/songs
pub async fn create_song(
    State(state): State<AppState>,
    body: Result<Json<NewSong>, JsonRejection>,
) -> ApiResult<Json<Song>> {
    let new = payload(body)?;
    Ok(Json(state.songs.create(new).await?))
}

/// PUT /api/songs/:song_id
pub async fn update_song(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
    body: Result<Json<SongUpdate>, JsonRejection>,
) -> ApiResult<Json<Song>> {
    let update = payload(body)?;
    Ok(Json(state.songs.update(&song_id, update).await?))
}

/// DELETE /api/songs/:song_id
pub async fn delete_song(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> ApiResult<Json<String>> {
    Ok(Json(state.songs.delete(&song_id).await?))
}

/// Build song routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/api/songs", get(list_songs).post(create_song))
        .route(
            "/api/songs/:song_id",
            get(get_song).put(update_song).delete(delete_song),
        )
}
