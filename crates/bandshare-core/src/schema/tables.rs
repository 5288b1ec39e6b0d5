//! Mapping between entities and their tables.

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;
use std::fmt;
use std::time::Duration;

use crate::model::{
    Artist, ArtistId, Genre, GenreId, Group, GroupId, Instrument, InstrumentId, Location,
    LocationId, MusicalKey, Setlist, SetlistId, Song, SongId, TimeSignature, User, UserId,
};
use crate::validation::Validate;

/// A uniqueness constraint with the values an entity would store for it.
#[derive(Debug)]
pub struct UniqueConstraint<'a> {
    /// Key the error is reported under: a field name, or `__all__` for
    /// multi-column constraints.
    pub error_field: &'static str,

    /// How the constrained fields read in the error message.
    pub label: &'static str,

    pub columns: &'static [&'static str],
    pub values: Vec<&'a str>,
}

/// A reference to a row in another table.
#[derive(Debug)]
pub struct ForeignKey {
    pub field: &'static str,
    pub table: &'static str,
    /// Lower-case entity name used in the error message.
    pub target: &'static str,
    pub id: String,
}

impl ForeignKey {
    fn new(field: &'static str, table: &'static str, target: &'static str, id: impl fmt::Display) -> Self {
        Self {
            field,
            table,
            target,
            id: id.to_string(),
        }
    }
}

/// An entity stored as one row of one table.
///
/// `COLUMNS` starts with `id` and lists the columns in the order
/// [`Table::to_row`] produces values for them.
pub trait Table: Validate + Sized {
    const TABLE: &'static str;
    const ENTITY: &'static str;
    const COLUMNS: &'static [&'static str];

    type Id: ToSql + FromSql + fmt::Display + Copy;

    fn id(&self) -> Self::Id;

    fn to_row(&self) -> rusqlite::Result<Vec<ToSqlOutput<'_>>>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn unique_constraints(&self) -> Vec<UniqueConstraint<'_>> {
        Vec::new()
    }

    fn foreign_keys(&self) -> Vec<ForeignKey> {
        Vec::new()
    }

    /// Refresh auto-maintained timestamps before an update.
    fn touch(&mut self, _now: DateTime<Utc>) {}
}

macro_rules! impl_sql_for_id {
    ($($name:ident),+ $(,)?) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.to_string()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e| FromSqlError::Other(Box::new(e)))
                }
            }
        )+
    };
}

impl_sql_for_id!(UserId, GroupId, GenreId, InstrumentId, LocationId, ArtistId, SongId, SetlistId);

impl ToSql for MusicalKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MusicalKey {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: crate::Error| FromSqlError::Other(e.to_string().into()))
    }
}

impl ToSql for TimeSignature {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TimeSignature {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: crate::Error| FromSqlError::Other(e.to_string().into()))
    }
}

/// Read a REAL seconds column as a `Duration`.
fn get_duration(row: &Row<'_>, column: &str) -> rusqlite::Result<Duration> {
    let secs: f64 = row.get(column)?;
    Duration::try_from_secs_f64(secs).map_err(|e| {
        let idx = row.as_ref().column_index(column).unwrap_or_default();
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Real, Box::new(e))
    })
}

impl Table for Genre {
    const TABLE: &'static str = "genres";
    const ENTITY: &'static str = "Genre";
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    type Id = GenreId;

    fn id(&self) -> GenreId {
        self.id
    }

    fn to_row(&self) -> rusqlite::Result<Vec<ToSqlOutput<'_>>> {
        Ok(vec![self.id.to_sql()?, self.name.to_sql()?])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }

    fn unique_constraints(&self) -> Vec<UniqueConstraint<'_>> {
        vec![UniqueConstraint {
            error_field: "name",
            label: "Name",
            columns: &["name"],
            values: vec![self.name.as_str()],
        }]
    }
}

impl Table for Instrument {
    const TABLE: &'static str = "instruments";
    const ENTITY: &'static str = "Instrument";
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    type Id = InstrumentId;

    fn id(&self) -> InstrumentId {
        self.id
    }

    fn to_row(&self) -> rusqlite::Result<Vec<ToSqlOutput<'_>>> {
        Ok(vec![self.id.to_sql()?, self.name.to_sql()?])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }

    fn unique_constraints(&self) -> Vec<UniqueConstraint<'_>> {
        vec![UniqueConstraint {
            error_field: "name",
            label: "Name",
            columns: &["name"],
            values: vec![self.name.as_str()],
        }]
    }
}

impl Table for Artist {
    const TABLE: &'static str = "artists";
    const ENTITY: &'static str = "Artist";
    const COLUMNS: &'static [&'static str] = &["id", "name", "created_at", "updated_at"];

    type Id = ArtistId;

    fn id(&self) -> ArtistId {
        self.id
    }

    fn to_row(&self) -> rusqlite::Result<Vec<ToSqlOutput<'_>>> {
        Ok(vec![
            self.id.to_sql()?,
            self.name.to_sql()?,
            self.created_at.to_sql()?,
            self.updated_at.to_sql()?,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn unique_constraints(&self) -> Vec<UniqueConstraint<'_>> {
        vec![UniqueConstraint {
            error_field: "name",
            label: "Name",
            columns: &["name"],
            values: vec![self.name.as_str()],
        }]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Table for Location {
    const TABLE: &'static str = "locations";
    const ENTITY: &'static str = "Location";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "address",
        "city",
        "state",
        "postal_code",
        "country",
    ];

    type Id = LocationId;

    fn id(&self) -> LocationId {
        self.id
    }

    fn to_row(&self) -> rusqlite::Result<Vec<ToSqlOutput<'_>>> {
        Ok(vec![
            self.id.to_sql()?,
            self.name.to_sql()?,
            self.address.to_sql()?,
            self.city.to_sql()?,
            self.state.to_sql()?,
            self.postal_code.to_sql()?,
            self.country.to_sql()?,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            address: row.get("address")?,
            city: row.get("city")?,
            state: row.get("state")?,
            postal_code: row.get("postal_code")?,
            country: row.get("country")?,
        })
    }

    fn unique_constraints(&self) -> Vec<UniqueConstraint<'_>> {
        vec![UniqueConstraint {
            error_field: crate::validation::NON_FIELD_ERRORS,
            label: "Address, City, State, Postal code and Country",
            columns: &["address", "city", "state", "postal_code", "country"],
            values: vec![
                self.address.as_str(),
                self.city.as_str(),
                self.state.as_str(),
                self.postal_code.as_str(),
                self.country.as_str(),
            ],
        }]
    }
}

impl Table for User {
    const TABLE: &'static str = "users";
    const ENTITY: &'static str = "User";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "display_name",
        "first_name",
        "last_name",
        "birth_date",
        "description",
        "bio",
        "location_id",
        "created_at",
        "updated_at",
    ];

    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }

    fn to_row(&self) -> rusqlite::Result<Vec<ToSqlOutput<'_>>> {
        Ok(vec![
            self.id.to_sql()?,
            self.display_name.to_sql()?,
            self.first_name.to_sql()?,
            self.last_name.to_sql()?,
            self.birth_date.to_sql()?,
            self.description.to_sql()?,
            self.bio.to_sql()?,
            self.location.to_sql()?,
            self.created_at.to_sql()?,
            self.updated_at.to_sql()?,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            display_name: row.get("display_name")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            birth_date: row.get("birth_date")?,
            description: row.get("description")?,
            bio: row.get("bio")?,
            location: row.get("location_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn foreign_keys(&self) -> Vec<ForeignKey> {
        self.location
            .map(|id| ForeignKey::new("location", Location::TABLE, "location", id))
            .into_iter()
            .collect()
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Table for Group {
    const TABLE: &'static str = "groups";
    const ENTITY: &'static str = "Group";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "bio",
        "started_date",
        "location_id",
        "created_by_id",
        "owned_by_id",
        "created_at",
        "updated_at",
    ];

    type Id = GroupId;

    fn id(&self) -> GroupId {
        self.id
    }

    fn to_row(&self) -> rusqlite::Result<Vec<ToSqlOutput<'_>>> {
        Ok(vec![
            self.id.to_sql()?,
            self.name.to_sql()?,
            self.description.to_sql()?,
            self.bio.to_sql()?,
            self.started_date.to_sql()?,
            self.location.to_sql()?,
            self.created_by.to_sql()?,
            self.owned_by.to_sql()?,
            self.created_at.to_sql()?,
            self.updated_at.to_sql()?,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            bio: row.get("bio")?,
            started_date: row.get("started_date")?,
            location: row.get("location_id")?,
            created_by: row.get("created_by_id")?,
            owned_by: row.get("owned_by_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn foreign_keys(&self) -> Vec<ForeignKey> {
        let mut keys = vec![ForeignKey::new("created_by", User::TABLE, "user", self.created_by)];
        if let Some(owner) = self.owned_by {
            keys.push(ForeignKey::new("owned_by", User::TABLE, "user", owner));
        }
        if let Some(location) = self.location {
            keys.push(ForeignKey::new("location", Location::TABLE, "location", location));
        }
        keys
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Table for Song {
    const TABLE: &'static str = "songs";
    const ENTITY: &'static str = "Song";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "release_date",
        "musical_key",
        "time_signature",
        "bpm",
        "duration_seconds",
        "created_at",
        "updated_at",
    ];

    type Id = SongId;

    fn id(&self) -> SongId {
        self.id
    }

    fn to_row(&self) -> rusqlite::Result<Vec<ToSqlOutput<'_>>> {
        Ok(vec![
            self.id.to_sql()?,
            self.title.to_sql()?,
            self.release_date.to_sql()?,
            self.musical_key.to_sql()?,
            self.time_signature.to_sql()?,
            self.bpm.to_sql()?,
            ToSqlOutput::from(self.duration.as_secs_f64()),
            self.created_at.to_sql()?,
            self.updated_at.to_sql()?,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            release_date: row.get("release_date")?,
            musical_key: row.get("musical_key")?,
            time_signature: row.get("time_signature")?,
            bpm: row.get("bpm")?,
            duration: get_duration(row, "duration_seconds")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Table for Setlist {
    const TABLE: &'static str = "setlists";
    const ENTITY: &'static str = "Setlist";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "description",
        "owner_group_id",
        "created_at",
        "updated_at",
    ];

    type Id = SetlistId;

    fn id(&self) -> SetlistId {
        self.id
    }

    fn to_row(&self) -> rusqlite::Result<Vec<ToSqlOutput<'_>>> {
        Ok(vec![
            self.id.to_sql()?,
            self.title.to_sql()?,
            self.description.to_sql()?,
            self.owner_group.to_sql()?,
            self.created_at.to_sql()?,
            self.updated_at.to_sql()?,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            owner_group: row.get("owner_group_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn foreign_keys(&self) -> Vec<ForeignKey> {
        vec![ForeignKey::new("owner_group", Group::TABLE, "group", self.owner_group)]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
