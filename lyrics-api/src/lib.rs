//! lyrics-api library - Song lyrics catalog service
//!
//! REST endpoints over the song record store plus notification channels
//! (WebSocket and SSE) that receive an event after every create and update.

use axum::http::HeaderValue;
use axum::Router;
use lyrics_common::config::DEFAULT_CORS_ORIGIN;
use lyrics_common::time::Clock;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod cli;
pub mod db;
pub mod error;
pub mod hub;
pub mod service;

pub use crate::error::{ApiError, ApiResult};

use crate::db::SongStore;
use crate::hub::BroadcastHub;
use crate::service::SongService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Song handlers (own the store, hub and clock)
    pub songs: SongService,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn SongStore>, hub: Arc<BroadcastHub>, clock: Arc<dyn Clock>) -> Self {
        Self {
            songs: SongService::new(store, hub, clock),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        self.songs.hub()
    }
}

/// CORS for the configured front-end origins, any method and header,
/// credentials allowed
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .merge(api::song_routes())
        .route("/ws", get(api::ws_handler))
        .route("/api/events", get(api::event_stream))
        .merge(api::status_routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
