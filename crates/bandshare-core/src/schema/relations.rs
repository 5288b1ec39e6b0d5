//! Many-to-many relations and their managers.
//!
//! Each relation is a join table with one column per side. Adding a pair
//! that already exists is a no-op, so repeated adds never duplicate a row
//! and never overwrite extra columns on the join row (such as a member's
//! role).

use rusqlite::types::{FromSql, ToSql};
use std::marker::PhantomData;

use crate::error::Result;
use crate::model::{ArtistId, GenreId, GroupId, InstrumentId, SetlistId, SongId, UserId};
use crate::schema::db::Database;
use crate::schema::quote;
use crate::schema::tables::Table;

/// A join table linking `S` ids to `T` ids.
#[derive(Debug, Clone, Copy)]
pub struct ManyToMany<S, T> {
    pub table: &'static str,
    pub source_column: &'static str,
    pub target_column: &'static str,
    marker: PhantomData<fn() -> (S, T)>,
}

impl<S, T> ManyToMany<S, T> {
    pub const fn new(
        table: &'static str,
        source_column: &'static str,
        target_column: &'static str,
    ) -> Self {
        Self {
            table,
            source_column,
            target_column,
            marker: PhantomData,
        }
    }

    /// The same join table seen from the other side.
    pub const fn reversed(&self) -> ManyToMany<T, S> {
        ManyToMany::new(self.table, self.target_column, self.source_column)
    }
}

pub const USER_GENRES: ManyToMany<UserId, GenreId> =
    ManyToMany::new("user_genres", "user_id", "genre_id");
pub const GENRE_USERS: ManyToMany<GenreId, UserId> = USER_GENRES.reversed();

pub const USER_INSTRUMENTS: ManyToMany<UserId, InstrumentId> =
    ManyToMany::new("user_instruments", "user_id", "instrument_id");

pub const GROUP_GENRES: ManyToMany<GroupId, GenreId> =
    ManyToMany::new("group_genres", "group_id", "genre_id");

/// Group members. Rows added through this relation get an empty role; use
/// [`Database::add_member`] to supply one.
pub const GROUP_MEMBERS: ManyToMany<GroupId, UserId> =
    ManyToMany::new("group_memberships", "group_id", "user_id");
pub const USER_GROUPS: ManyToMany<UserId, GroupId> = GROUP_MEMBERS.reversed();

pub const SONG_GENRES: ManyToMany<SongId, GenreId> =
    ManyToMany::new("song_genres", "song_id", "genre_id");

pub const SONG_ARTISTS: ManyToMany<SongId, ArtistId> =
    ManyToMany::new("song_artists", "song_id", "artist_id");
pub const ARTIST_SONGS: ManyToMany<ArtistId, SongId> = SONG_ARTISTS.reversed();

/// Songs on a setlist, kept in the order they were added.
pub const SETLIST_SONGS: ManyToMany<SetlistId, SongId> =
    ManyToMany::new("setlist_songs", "setlist_id", "song_id");

/// The targets related to one source row.
#[derive(Debug)]
pub struct Related<'a, S, T> {
    db: &'a Database,
    relation: ManyToMany<S, T>,
    source: S,
}

impl<'a, S, T> Related<'a, S, T> {
    pub(crate) fn new(db: &'a Database, relation: ManyToMany<S, T>, source: S) -> Self {
        Self {
            db,
            relation,
            source,
        }
    }
}

impl<S, T> Related<'_, S, T>
where
    S: ToSql + Copy,
    T: ToSql + FromSql,
{
    /// Link `target`. Returns `false` when the link already existed.
    pub fn add(&self, target: T) -> Result<bool> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
            quote(self.relation.table),
            quote(self.relation.source_column),
            quote(self.relation.target_column),
        );
        let inserted = self
            .db
            .conn()
            .execute(&sql, rusqlite::params![self.source, target])?;
        if inserted > 0 {
            log::debug!("Linked row in {}", self.relation.table);
        }
        Ok(inserted > 0)
    }

    /// Unlink `target`. Returns `false` when there was no link.
    pub fn remove(&self, target: T) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
            quote(self.relation.table),
            quote(self.relation.source_column),
            quote(self.relation.target_column),
        );
        let removed = self
            .db
            .conn()
            .execute(&sql, rusqlite::params![self.source, target])?;
        Ok(removed > 0)
    }

    /// Unlink every target. Returns how many links were removed.
    pub fn clear(&self) -> Result<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote(self.relation.table),
            quote(self.relation.source_column),
        );
        Ok(self.db.conn().execute(&sql, [self.source])?)
    }

    pub fn count(&self) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            quote(self.relation.table),
            quote(self.relation.source_column),
        );
        let count: i64 = self
            .db
            .conn()
            .query_row(&sql, [self.source], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn contains(&self, target: T) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1 AND {} = ?2)",
            quote(self.relation.table),
            quote(self.relation.source_column),
            quote(self.relation.target_column),
        );
        Ok(self
            .db
            .conn()
            .query_row(&sql, rusqlite::params![self.source, target], |row| {
                row.get(0)
            })?)
    }

    /// Target ids in the order they were linked.
    pub fn ids(&self) -> Result<Vec<T>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY rowid",
            quote(self.relation.target_column),
            quote(self.relation.table),
            quote(self.relation.source_column),
        );
        let mut stmt = self.db.conn().prepare(&sql)?;
        let ids = stmt
            .query_map([self.source], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// Load the linked entities in the order they were linked.
    pub fn fetch<M>(&self) -> Result<Vec<M>>
    where
        M: Table<Id = T>,
    {
        let columns = M::COLUMNS
            .iter()
            .map(|column| format!("t.{}", quote(column)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {} t JOIN {} r ON r.{} = t.id WHERE r.{} = ?1 ORDER BY r.rowid",
            columns,
            quote(M::TABLE),
            quote(self.relation.table),
            quote(self.relation.target_column),
            quote(self.relation.source_column),
        );
        let mut stmt = self.db.conn().prepare(&sql)?;
        let entities = stmt
            .query_map([self.source], M::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entities)
    }
}
