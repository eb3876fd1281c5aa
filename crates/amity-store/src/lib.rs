//! Amity Storage Layer
//!
//! Implements the RelationshipStore trait on SQLite.
//!
//! # Architecture
//!
//! - One `edges` row per unordered user pair, enforced by a unique index on
//!   the sorted `(pair_low, pair_high)` columns
//! - Status transitions are single `UPDATE … WHERE id = ? AND status = ?`
//!   statements, so the status predicate and the write are atomic even
//!   across connections
//! - A `profiles` table stands in for the profile projection joined into
//!   request and friend listings
//!
//! # Examples
//!
//! ```no_run
//! use amity_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for edge operations
//! ```

#![warn(missing_docs)]

use amity_domain::traits::{RelationshipStore, StoreFailure};
use amity_domain::{Edge, EdgeId, EdgeStatus, Friend, FriendRequest, Profile, UserId};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// How long a connection waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const EDGE_COLUMNS: &str = "id, requester_id, receiver_id, status, created_at, updated_at";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Write rejected by the one-edge-per-pair constraint
    #[error("An edge already exists for this pair")]
    Conflict,
}

impl StoreFailure for StoreError {
    fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict)
    }
}

/// SQLite-based implementation of RelationshipStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share one store behind a mutex,
/// or open one SqliteStore per thread against the same database file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use amity_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("amity.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Insert or replace a user's profile
    pub fn upsert_profile(&mut self, profile: &Profile) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO profiles (id, display_name, avatar_url) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
             display_name = excluded.display_name, avatar_url = excluded.avatar_url",
            params![profile.id.as_str(), &profile.display_name, &profile.avatar_url],
        )?;
        Ok(())
    }

    /// Get a user's profile, if one was recorded
    pub fn get_profile(&self, id: &UserId) -> Result<Option<Profile>, StoreError> {
        let profile = self
            .conn
            .query_row(
                "SELECT id, display_name, avatar_url FROM profiles WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(Profile {
                        id: UserId::new(row.get::<_, String>(0)?),
                        display_name: row.get(1)?,
                        avatar_url: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    /// Convert EdgeId to bytes for storage
    fn edge_id_to_bytes(id: EdgeId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to EdgeId
    fn bytes_to_edge_id(bytes: &[u8]) -> Result<EdgeId, StoreError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| {
            StoreError::InvalidData(format!("Expected 16 bytes for EdgeId, got {}", bytes.len()))
        })?;
        Ok(EdgeId::from_value(u128::from_be_bytes(arr)))
    }

    /// The pair's user ids in the order used by the unique index
    fn ordered_pair<'a>(a: &'a UserId, b: &'a UserId) -> (&'a str, &'a str) {
        if a <= b {
            (a.as_str(), b.as_str())
        } else {
            (b.as_str(), a.as_str())
        }
    }

    fn column_error(idx: usize, ty: rusqlite::types::Type, e: StoreError) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
    }

    fn read_edge_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<EdgeId> {
        let bytes: Vec<u8> = row.get(idx)?;
        Self::bytes_to_edge_id(&bytes)
            .map_err(|e| Self::column_error(idx, rusqlite::types::Type::Blob, e))
    }

    /// Map a row selected with [`EDGE_COLUMNS`]
    fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<Edge> {
        let status_str: String = row.get(3)?;
        let status = EdgeStatus::parse(&status_str).ok_or_else(|| {
            Self::column_error(
                3,
                rusqlite::types::Type::Text,
                StoreError::InvalidData(format!("Unknown edge status: {}", status_str)),
            )
        })?;

        Ok(Edge {
            id: Self::read_edge_id(row, 0)?,
            requester_id: UserId::new(row.get::<_, String>(1)?),
            receiver_id: UserId::new(row.get::<_, String>(2)?),
            status,
            created_at: row.get::<_, i64>(4)? as u64,
            updated_at: row.get::<_, i64>(5)? as u64,
        })
    }

    /// Profile columns from a LEFT JOIN; missing rows fall back to the id
    fn joined_profile(
        id: UserId,
        display_name: Option<String>,
        avatar_url: Option<String>,
    ) -> Profile {
        match display_name {
            Some(name) => Profile::new(id, name, avatar_url),
            None => Profile::fallback(id),
        }
    }

    fn is_unique_violation(e: &rusqlite::Error) -> bool {
        match e {
            rusqlite::Error::SqliteFailure(err, _) => {
                err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }
}

impl RelationshipStore for SqliteStore {
    type Error = StoreError;

    fn insert(&mut self, edge: Edge) -> Result<Edge, Self::Error> {
        let (low, high) = Self::ordered_pair(&edge.requester_id, &edge.receiver_id);

        self.conn
            .execute(
                "INSERT INTO edges (id, requester_id, receiver_id, pair_low, pair_high, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    Self::edge_id_to_bytes(edge.id),
                    edge.requester_id.as_str(),
                    edge.receiver_id.as_str(),
                    low,
                    high,
                    edge.status.as_str(),
                    edge.created_at as i64,
                    edge.updated_at as i64,
                ],
            )
            .map_err(|e| {
                if Self::is_unique_violation(&e) {
                    StoreError::Conflict
                } else {
                    StoreError::Database(e)
                }
            })?;

        Ok(edge)
    }

    fn find_by_id(&self, id: EdgeId) -> Result<Option<Edge>, Self::Error> {
        let edge = self
            .conn
            .query_row(
                &format!("SELECT {} FROM edges WHERE id = ?1", EDGE_COLUMNS),
                params![Self::edge_id_to_bytes(id)],
                Self::row_to_edge,
            )
            .optional()?;
        Ok(edge)
    }

    fn find_by_pair(&self, a: &UserId, b: &UserId) -> Result<Option<Edge>, Self::Error> {
        let (low, high) = Self::ordered_pair(a, b);
        let edge = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM edges WHERE pair_low = ?1 AND pair_high = ?2",
                    EDGE_COLUMNS
                ),
                params![low, high],
                Self::row_to_edge,
            )
            .optional()?;
        Ok(edge)
    }

    fn list_pending_for_receiver(&self, user: &UserId) -> Result<Vec<FriendRequest>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.requester_id, e.created_at, p.display_name, p.avatar_url
             FROM edges e LEFT JOIN profiles p ON p.id = e.requester_id
             WHERE e.receiver_id = ?1 AND e.status = 'pending'
             ORDER BY e.created_at DESC, e.id DESC",
        )?;

        let requests = stmt
            .query_map(params![user.as_str()], |row| {
                let requester = UserId::new(row.get::<_, String>(1)?);
                Ok(FriendRequest {
                    id: Self::read_edge_id(row, 0)?,
                    requester: Self::joined_profile(requester, row.get(3)?, row.get(4)?),
                    created_at: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(requests)
    }

    fn list_accepted_for(&self, user: &UserId) -> Result<Vec<Friend>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id,
                    CASE WHEN e.requester_id = ?1 THEN e.receiver_id ELSE e.requester_id END,
                    e.updated_at, p.display_name, p.avatar_url
             FROM edges e
             LEFT JOIN profiles p
                 ON p.id = CASE WHEN e.requester_id = ?1 THEN e.receiver_id ELSE e.requester_id END
             WHERE (e.requester_id = ?1 OR e.receiver_id = ?1) AND e.status = 'accepted'
             ORDER BY e.updated_at DESC, e.id DESC",
        )?;

        let friends = stmt
            .query_map(params![user.as_str()], |row| {
                let other = UserId::new(row.get::<_, String>(1)?);
                Ok(Friend {
                    friendship_id: Self::read_edge_id(row, 0)?,
                    user: Self::joined_profile(other, row.get(3)?, row.get(4)?),
                    since: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(friends)
    }

    fn update_status_where(
        &mut self,
        id: EdgeId,
        expected: EdgeStatus,
        new: EdgeStatus,
        now: u64,
    ) -> Result<Option<Edge>, Self::Error> {
        let edge = self
            .conn
            .query_row(
                &format!(
                    "UPDATE edges SET status = ?1, updated_at = ?2
                     WHERE id = ?3 AND status = ?4
                     RETURNING {}",
                    EDGE_COLUMNS
                ),
                params![
                    new.as_str(),
                    now as i64,
                    Self::edge_id_to_bytes(id),
                    expected.as_str(),
                ],
                Self::row_to_edge,
            )
            .optional()?;
        Ok(edge)
    }

    fn delete_where(&mut self, id: EdgeId, expected: EdgeStatus) -> Result<bool, Self::Error> {
        let affected = self.conn.execute(
            "DELETE FROM edges WHERE id = ?1 AND status = ?2",
            params![Self::edge_id_to_bytes(id), expected.as_str()],
        )?;
        Ok(affected == 1)
    }

    fn delete_by_pair_where(
        &mut self,
        a: &UserId,
        b: &UserId,
        expected: EdgeStatus,
    ) -> Result<bool, Self::Error> {
        let (low, high) = Self::ordered_pair(a, b);
        let affected = self.conn.execute(
            "DELETE FROM edges WHERE pair_low = ?1 AND pair_high = ?2 AND status = ?3",
            params![low, high, expected.as_str()],
        )?;
        Ok(affected == 1)
    }
}
