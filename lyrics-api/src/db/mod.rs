//! Record store for song documents
//!
//! Handlers only see the [`SongStore`] trait: five primitives over a
//! collection of song records keyed by [`ObjectId`]. [`SqliteSongStore`] is
//! the implementation used by the service.

use async_trait::async_trait;
use lyrics_common::{ObjectId, Result, Song};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

mod songs;
pub use songs::SqliteSongStore;

/// Store primitives consumed by the song handlers
///
/// Ids are minted by the store on insert, never by callers.
#[async_trait]
pub trait SongStore: Send + Sync {
    /// Every record, in ascending id order
    async fn find_all(&self) -> Result<Vec<Song>>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Song>>;

    /// Persist a new record and return the id assigned to it
    ///
    /// Any `id` already present on `song` is ignored.
    async fn insert(&self, song: &Song) -> Result<ObjectId>;

    /// Atomically replace the record's mutable fields and return the stored
    /// result, or `None` if no record has this id
    async fn find_and_replace(&self, id: ObjectId, song: &Song) -> Result<Option<Song>>;

    /// Remove a record, returning how many were removed (0 or 1)
    async fn delete(&self, id: ObjectId) -> Result<u64>;
}

/// Store primitive, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    FindAll,
    FindById,
    Insert,
    FindAndReplace,
    Delete,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::FindAll => "find_all",
            StoreOp::FindById => "find_by_id",
            StoreOp::Insert => "insert",
            StoreOp::FindAndReplace => "find_and_replace",
            StoreOp::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Open (creating if missing) the SQLite database file at `db_path`
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}

/// Open a private in-memory database
///
/// Limited to one connection that is never recycled, since every SQLite
/// in-memory connection is its own database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Create the songs table if it does not exist
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            lyrics TEXT NOT NULL,
            artist TEXT NOT NULL,
            album TEXT NOT NULL,
            created INTEGER NOT NULL,
            updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
