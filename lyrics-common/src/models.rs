//! Song record models
//!
//! `Song` is the stored and transmitted shape. `NewSong` and `SongUpdate` are
//! the request payloads for create and update.

use serde::{Deserialize, Serialize};

use crate::{Error, ObjectId, Result};

/// A song as stored and transmitted
///
/// The id travels under the `_id` key; `id` is accepted on input as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Store-assigned id, absent until the record is first persisted
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub lyrics: String,
    pub artist: String,
    pub album: String,
    /// Creation time (Unix seconds), never modified after insert
    pub created: i64,
    /// Last modification time (Unix seconds)
    pub updated: i64,
}

/// Create payload
///
/// Unknown keys are ignored, so clients may send `_id`, `created` or
/// `updated`; the store and the handler own those fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSong {
    pub name: String,
    pub lyrics: String,
    pub artist: String,
    pub album: String,
}

/// Update payload: full replacement of the text fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongUpdate {
    pub name: String,
    pub lyrics: String,
    pub artist: String,
    pub album: String,
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("'{}' must not be empty", field)));
    }
    Ok(())
}

fn validate_fields(name: &str, lyrics: &str, artist: &str, album: &str) -> Result<()> {
    require_text("name", name)?;
    require_text("lyrics", lyrics)?;
    require_text("artist", artist)?;
    require_text("album", album)
}

impl NewSong {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, &self.lyrics, &self.artist, &self.album)
    }
}

impl SongUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, &self.lyrics, &self.artist, &self.album)
    }
}

impl Song {
    /// Build an unsaved record with `created == updated == now`
    pub fn from_new(new: NewSong, now: i64) -> Self {
        Self {
            id: None,
            name: new.name,
            lyrics: new.lyrics,
            artist: new.artist,
            album: new.album,
            created: now,
            updated: now,
        }
    }

    /// Overwrite the text fields and bump `updated`
    ///
    /// `updated` becomes `now`, or one second past the previous value when
    /// the clock has not moved past it, so it always strictly increases.
    /// `id` and `created` are left alone.
    pub fn apply_update(&mut self, update: SongUpdate, now: i64) {
        self.name = update.name;
        self.lyrics = update.lyrics;
        self.artist = update.artist;
        self.album = update.album;
        self.updated = now.max(self.updated.saturating_add(1));
    }
}
