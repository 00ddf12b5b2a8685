//! Broadcast event types
//!
//! Events are pushed to every connected notification channel after the
//! corresponding store write has been acknowledged. They are not persisted
//! and not replayed.

use serde::{Deserialize, Serialize};

use crate::Song;

/// What happened to the song carried by a [`SongEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongEventStatus {
    /// A song was created
    NewSong,
    /// An existing song was replaced
    UpdatedSong,
}

/// Message pushed to notification channels
///
/// Wire form: `{"status": "new_song" | "updated_song", "song": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongEvent {
    pub status: SongEventStatus,
    pub song: Song,
}

impl SongEvent {
    pub fn new_song(song: Song) -> Self {
        Self {
            status: SongEventStatus::NewSong,
            song,
        }
    }

    pub fn updated_song(song: Song) -> Self {
        Self {
            status: SongEventStatus::UpdatedSong,
            song,
        }
    }

    /// Event type string for logging
    pub fn event_type(&self) -> &'static str {
        match self.status {
            SongEventStatus::NewSong => "new_song",
            SongEventStatus::UpdatedSong => "updated_song",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectId;

    #[test]
    fn test_event_wire_shape() {
        let song = Song {
            id: Some(ObjectId::from_bytes([0x0a; 12])),
            name: "Yahweh".to_string(),
            lyrics: "You are Yahweh".to_string(),
            artist: "Steve Crown".to_string(),
            album: "Faith Is Rising".to_string(),
            created: 5,
            updated: 5,
        };

        let value = serde_json::to_value(SongEvent::new_song(song.clone())).unwrap();
        assert_eq!(value["status"], "new_song");
        assert_eq!(value["song"]["_id"], "0a0a0a0a0a0a0a0a0a0a0a0a");
        assert_eq!(value["song"]["name"], "Yahweh");

        let updated = SongEvent::updated_song(song);
        assert_eq!(updated.event_type(), "updated_song");
        assert_eq!(serde_json::to_value(&updated).unwrap()["status"], "updated_song");
    }
}
