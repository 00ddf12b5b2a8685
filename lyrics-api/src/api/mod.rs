//! HTTP API handlers for lyrics-api

pub mod songs;
pub mod sse;
pub mod status;
pub mod ws;

pub use songs::song_routes;
pub use sse::event_stream;
pub use status::status_routes;
pub use ws::ws_handler;
