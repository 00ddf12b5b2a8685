//! SQLite-backed song store

use async_trait::async_trait;
use lyrics_common::{Error, ObjectId, Result, Song};
use sqlx::SqlitePool;

use super::SongStore;

/// (id, name, lyrics, artist, album, created, updated)
type SongRow = (String, String, String, String, String, i64, i64);

fn song_from_row(row: SongRow) -> Result<Song> {
    let (id, name, lyrics, artist, album, created, updated) = row;
    let id = ObjectId::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Corrupt id in songs table: {}", e)))?;

    Ok(Song {
        id: Some(id),
        name,
        lyrics,
        artist,
        album,
        created,
        updated,
    })
}

/// Song collection stored in the `songs` table
#[derive(Clone)]
pub struct SqliteSongStore {
    pool: SqlitePool,
}

impl SqliteSongStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SongStore for SqliteSongStore {
    async fn find_all(&self) -> Result<Vec<Song>> {
        let rows = sqlx::query_as::<_, SongRow>(
            "SELECT id, name, lyrics, artist, album, created, updated FROM songs ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(song_from_row).collect()
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Song>> {
        let row = sqlx::query_as::<_, SongRow>(
            "SELECT id, name, lyrics, artist, album, created, updated FROM songs WHERE id = ?",
        )
        .bind(id.to_hex())
        .fetch_optional(&self.pool)
        .await?;

        row.map(song_from_row).transpose()
    }

    async fn insert(&self, song: &Song) -> Result<ObjectId> {
        let id = ObjectId::generate();

        sqlx::query(
            r#"
            INSERT INTO songs (id, name, lyrics, artist, album, created, updated)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_hex())
        .bind(&song.name)
        .bind(&song.lyrics)
        .bind(&song.artist)
        .bind(&song.album)
        .bind(song.created)
        .bind(song.updated)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_and_replace(&self, id: ObjectId, song: &Song) -> Result<Option<Song>> {
        // Single statement: the replace and the read-back are atomic.
        // `created` is never rewritten.
        let row = sqlx::query_as::<_, SongRow>(
            r#"
            UPDATE songs
            SET name = ?, lyrics = ?, artist = ?, album = ?, updated = ?
            WHERE id = ?
            RETURNING id, name, lyrics, artist, album, created, updated
            "#,
        )
        .bind(&song.name)
        .bind(&song.lyrics)
        .bind(&song.artist)
        .bind(&song.album)
        .bind(song.updated)
        .bind(id.to_hex())
        .fetch_optional(&self.pool)
        .await?;

        row.map(song_from_row).transpose()
    }

    async fn delete(&self, id: ObjectId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM songs WHERE id = ?")
            .bind(id.to_hex())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
