//! Object ids for stored song records
//!
//! A 12-byte identifier rendered as 24 lowercase hex characters:
//!
//! | bytes | content |
//! |-------|---------|
//! | 0..4  | creation time, Unix seconds, big-endian |
//! | 4..9  | random value fixed for the lifetime of the process |
//! | 9..12 | counter, big-endian, seeded randomly and incremented per id |
//!
//! The timestamp leads, so ordering ids lexicographically (as bytes or as hex
//! text) is deterministic and sorts ids minted in different seconds by
//! creation time. Within one second a process's ids follow mint order unless
//! the 24-bit counter wraps from 0xFFFFFF to 0 in that second.
//!
//! Only the record store mints ids. Handlers treat them as opaque.

use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::time::now_unix;
use crate::Error;

/// Length of an object id in bytes
pub const OBJECT_ID_LEN: usize = 12;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(|| rand::thread_rng().gen());

static COUNTER: Lazy<AtomicU32> =
    Lazy::new(|| AtomicU32::new(rand::thread_rng().gen::<u32>() & COUNTER_MASK));

/// Store-assigned record identifier
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Mint a new id stamped with the current time
    pub fn generate() -> Self {
        Self::with_timestamp(now_unix())
    }

    /// Mint a new id stamped with `unix_seconds`
    ///
    /// Seconds outside the u32 range are clamped.
    pub fn with_timestamp(unix_seconds: i64) -> Self {
        let seconds = unix_seconds.clamp(0, i64::from(u32::MAX)) as u32;
        let count = COUNTER.fetch_add(1, Ordering::SeqCst) & COUNTER_MASK;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Creation time embedded in the id (Unix seconds)
    pub fn timestamp(&self) -> i64 {
        let mut seconds = [0u8; 4];
        seconds.copy_from_slice(&self.0[0..4]);
        i64::from(u32::from_be_bytes(seconds))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 24 character hex string
    pub fn parse_str(s: &str) -> Result<Self, Error> {
        if s.len() != OBJECT_ID_LEN * 2 {
            return Err(Error::InvalidInput(format!(
                "'{}' is not a valid object id: expected {} hex characters",
                s,
                OBJECT_ID_LEN * 2
            )));
        }

        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| {
            Error::InvalidInput(format!("'{}' is not a valid object id: {}", s, e))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_str(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_hex()
    }
}
