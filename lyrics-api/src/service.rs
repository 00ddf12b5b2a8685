//! Song handlers: orchestration between the record store and the broadcast hub
//!
//! Each operation is one store call (update is a lookup plus a replace).
//! Create and update broadcast their result only after the store has
//! acknowledged the write; delete does not broadcast.

use lyrics_common::time::Clock;
use lyrics_common::{NewSong, ObjectId, Song, SongEvent, SongUpdate};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{SongStore, StoreOp};
use crate::hub::BroadcastHub;

/// Failures of the song handlers
///
/// A missing update target is `BadRequest`, while a missing read or delete
/// target is `NotFound`; clients of the catalog depend on that distinction.
#[derive(Debug, Error)]
pub enum SongError {
    /// Payload failed validation
    #[error("{0}")]
    Validation(String),

    /// No song with this id (read-one, delete, update race)
    #[error("Song {0} not found")]
    NotFound(String),

    /// Update target does not exist
    #[error("Bad Request: no song {0} to update")]
    BadRequest(String),

    /// The record store call failed
    #[error("Store {op} failed: {source}")]
    Store {
        op: StoreOp,
        source: lyrics_common::Error,
    },
}

impl SongError {
    fn store(op: StoreOp) -> impl FnOnce(lyrics_common::Error) -> SongError {
        move |source| {
            warn!("Store {} failed: {}", op, source);
            SongError::Store { op, source }
        }
    }
}

/// Song operations over an injected store, hub and clock
#[derive(Clone)]
pub struct SongService {
    store: Arc<dyn SongStore>,
    hub: Arc<BroadcastHub>,
    clock: Arc<dyn Clock>,
}

impl SongService {
    pub fn new(store: Arc<dyn SongStore>, hub: Arc<BroadcastHub>, clock: Arc<dyn Clock>) -> Self {
        Self { store, hub, clock }
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// All songs keyed by id
    ///
    /// Entries are ordered by ascending id, which is creation order for ids
    /// minted by one store process, and identical across repeated calls.
    pub async fn list(&self) -> Result<BTreeMap<String, Song>, SongError> {
        let songs = self
            .store
            .find_all()
            .await
            .map_err(SongError::store(StoreOp::FindAll))?;

        Ok(songs
            .into_iter()
            .filter_map(|song| song.id.map(|id| (id.to_hex(), song)))
            .collect())
    }

    /// One song by id; unknown or malformed ids are `NotFound`
    pub async fn get(&self, song_id: &str) -> Result<Song, SongError> {
        let id = ObjectId::parse_str(song_id).map_err(|_| SongError::NotFound(song_id.to_string()))?;

        self.store
            .find_by_id(id)
            .await
            .map_err(SongError::store(StoreOp::FindById))?
            .ok_or_else(|| SongError::NotFound(song_id.to_string()))
    }

    /// Insert a song with `created == updated == now` and broadcast `new_song`
    pub async fn create(&self, new: NewSong) -> Result<Song, SongError> {
        new.validate()
            .map_err(|e| SongError::Validation(e.to_string()))?;

        let mut song = Song::from_new(new, self.clock.now());
        let id = self
            .store
            .insert(&song)
            .await
            .map_err(SongError::store(StoreOp::Insert))?;
        song.id = Some(id);

        info!("Created song {} ({:?})", id, song.name);
        self.hub.broadcast(&SongEvent::new_song(song.clone())).await;
        Ok(song)
    }

    /// Replace a song's text fields, bump `updated` and broadcast `updated_song`
    pub async fn update(&self, song_id: &str, update: SongUpdate) -> Result<Song, SongError> {
        update
            .validate()
            .map_err(|e| SongError::Validation(e.to_string()))?;

        let id = ObjectId::parse_str(song_id)
            .map_err(|_| SongError::BadRequest(song_id.to_string()))?;

        let mut song = self
            .store
            .find_by_id(id)
            .await
            .map_err(SongError::store(StoreOp::FindById))?
            .ok_or_else(|| SongError::BadRequest(song_id.to_string()))?;

        song.apply_update(update, self.clock.now());

        // The record can vanish between the lookup and the replace
        let saved = self
            .store
            .find_and_replace(id, &song)
            .await
            .map_err(SongError::store(StoreOp::FindAndReplace))?
            .ok_or_else(|| SongError::NotFound(song_id.to_string()))?;

        info!("Updated song {} ({:?})", id, saved.name);
        self.hub.broadcast(&SongEvent::updated_song(saved.clone())).await;
        Ok(saved)
    }

    /// Remove a song and return its id; nothing is broadcast
    pub async fn delete(&self, song_id: &str) -> Result<String, SongError> {
        let id = ObjectId::parse_str(song_id).map_err(|_| SongError::NotFound(song_id.to_string()))?;

        let removed = self
            .store
            .delete(id)
            .await
            .map_err(SongError::store(StoreOp::Delete))?;

        if removed == 0 {
            return Err(SongError::NotFound(song_id.to_string()));
        }

        info!("Deleted song {}", id);
        Ok(song_id.to_string())
    }
}
