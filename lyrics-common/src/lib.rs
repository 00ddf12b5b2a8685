//! # Lyrics Common Library
//!
//! Shared code for the lyrics catalog services:
//! - Song models and their validation rules
//! - Broadcast event types (SongEvent)
//! - Object ids for stored records
//! - Configuration loading
//! - Unix time and clock utilities

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod object_id;
pub mod time;

pub use error::{Error, Result};
pub use events::{SongEvent, SongEventStatus};
pub use models::{NewSong, Song, SongUpdate};
pub use object_id::ObjectId;
