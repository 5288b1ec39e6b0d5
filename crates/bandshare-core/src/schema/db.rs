use chrono::Utc;
use rusqlite::types::ToSqlOutput;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Group, GroupId, Membership, User, UserId};
use crate::schema::migrations::{latest_version, Migration, MIGRATIONS};
use crate::schema::quote;
use crate::schema::relations::{ManyToMany, Related, GROUP_MEMBERS};
use crate::schema::tables::Table;
use crate::validation::Validate;

/// A database connection with validation, CRUD and relation methods for
/// bandshare entities.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self::connect(path)?;
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Self::from_connection(Connection::open_in_memory()?)?;
        db.migrate()?;
        Ok(db)
    }

    /// Open a database without applying pending migrations.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Foreign key enforcement is per connection, so it is set on every open.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }
}

// Migrations
impl Database {
    /// Apply every pending migration in version order.
    ///
    /// Each migration runs in its own transaction together with its
    /// `schema_migrations` row. Returns the versions applied by this call.
    pub fn migrate(&self) -> Result<Vec<u32>> {
        self.migrate_to(latest_version())
    }

    /// Apply pending migrations up to and including `target`.
    pub fn migrate_to(&self, target: u32) -> Result<Vec<u32>> {
        let applied = self.applied_migrations()?;
        let mut newly_applied = Vec::new();

        for migration in MIGRATIONS.iter().filter(|m| m.version <= target) {
            if applied.contains(&migration.version) {
                continue;
            }
            log::info!(
                "Applying migration {} ({})",
                migration.version,
                migration.name
            );
            let tx = self.conn.unchecked_transaction()?;
            tx.execute_batch(migration.sql)?;
            tx.execute(
                "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                rusqlite::params![migration.version, migration.name],
            )?;
            tx.commit()?;
            newly_applied.push(migration.version);
        }

        Ok(newly_applied)
    }

    /// Versions recorded in `schema_migrations`, ascending.
    pub fn applied_migrations(&self) -> Result<Vec<u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<u32>>>()?;
        Ok(applied)
    }

    /// Migrations not yet applied, in the order they would run.
    pub fn pending_migrations(&self) -> Result<Vec<&'static Migration>> {
        let applied = self.applied_migrations()?;
        Ok(MIGRATIONS
            .iter()
            .filter(|m| !applied.contains(&m.version))
            .collect())
    }
}

// Validation
impl Database {
    /// Run field validation plus the checks that need the store.
    ///
    /// Uniqueness is checked against every other row, so re-validating a
    /// saved entity passes. A unique check is skipped for fields that
    /// already failed, and every referenced row must exist.
    pub fn full_clean<T: Table>(&self, entity: &T) -> Result<()> {
        let mut errors = entity.clean_fields();
        let id = entity.id().to_string();

        for constraint in entity.unique_constraints() {
            if errors.contains(constraint.error_field)
                || constraint.columns.iter().any(|c| errors.contains(c))
            {
                continue;
            }

            let predicate = constraint
                .columns
                .iter()
                .enumerate()
                .map(|(i, column)| format!("{} = ?{}", quote(column), i + 2))
                .collect::<Vec<_>>()
                .join(" AND ");
            let sql = format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id != ?1 AND {})",
                quote(T::TABLE),
                predicate
            );

            let mut params = vec![ToSqlOutput::from(id.as_str())];
            params.extend(constraint.values.iter().map(|&v| ToSqlOutput::from(v)));

            let taken: bool =
                self.conn
                    .query_row(&sql, rusqlite::params_from_iter(params), |row| row.get(0))?;
            if taken {
                errors.add(
                    constraint.error_field,
                    format!("{} with this {} already exists.", T::ENTITY, constraint.label),
                );
            }
        }

        for key in entity.foreign_keys() {
            if errors.contains(key.field) {
                continue;
            }
            if !self.row_exists(key.table, &key.id)? {
                errors.add(
                    key.field,
                    format!("{} instance with id {} does not exist.", key.target, key.id),
                );
            }
        }

        Ok(errors.into_result()?)
    }

    fn row_exists(&self, table: &str, id: &str) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
            quote(table)
        );
        Ok(self.conn.query_row(&sql, [id], |row| row.get(0))?)
    }
}

// Generic CRUD
impl Database {
    /// Validate and insert a new entity. Nothing is written when validation fails.
    pub fn insert<T: Table>(&self, entity: &T) -> Result<()> {
        self.full_clean(entity)?;

        let placeholders = (1..=T::COLUMNS.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(T::TABLE),
            column_list::<T>(None),
            placeholders
        );
        self.conn
            .execute(&sql, rusqlite::params_from_iter(entity.to_row()?))?;

        log::debug!("Inserted {} {}", T::ENTITY, entity.id());
        Ok(())
    }

    /// Validate and save changes to an existing entity, refreshing its
    /// `updated_at` timestamp. The entity is left untouched when nothing
    /// was written.
    pub fn update<T: Table + Clone>(&self, entity: &mut T) -> Result<()> {
        self.full_clean(entity)?;
        let mut touched = entity.clone();
        touched.touch(Utc::now());

        let assignments = T::COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, column)| format!("{} = ?{}", quote(column), i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?1",
            quote(T::TABLE),
            assignments
        );
        let changed = self
            .conn
            .execute(&sql, rusqlite::params_from_iter(touched.to_row()?))?;
        if changed == 0 {
            return Err(Error::NotFound {
                entity: T::ENTITY,
                id: touched.id().to_string(),
            });
        }

        *entity = touched;
        log::debug!("Updated {} {}", T::ENTITY, entity.id());
        Ok(())
    }

    pub fn get<T: Table>(&self, id: T::Id) -> Result<T> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            column_list::<T>(None),
            quote(T::TABLE)
        );
        self.conn
            .query_row(&sql, [id], T::from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity: T::ENTITY,
                id: id.to_string(),
            })
    }

    /// Every row of the entity's table, in insertion order.
    pub fn all<T: Table>(&self) -> Result<Vec<T>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            column_list::<T>(None),
            quote(T::TABLE)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], T::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every row of the entity's table in insertion order, decoded one at a
    /// time. Each row's id is returned with its decode result, so a row with
    /// an unreadable value does not hide the rows after it.
    pub fn scan<T: Table>(&self) -> Result<Vec<(String, rusqlite::Result<T>)>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            column_list::<T>(None),
            quote(T::TABLE)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>("id")?, T::from_row(row))))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Whether a table of that name exists.
    pub fn has_table(&self, table: &str) -> Result<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [table],
            |row| row.get(0),
        )?)
    }

    pub fn count<T: Table>(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(T::TABLE));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Delete a row, applying each referencing foreign key's on-delete
    /// policy. Returns `false` when no such row existed.
    pub fn delete<T: Table>(&self, id: T::Id) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", quote(T::TABLE));
        let deleted = self.conn.execute(&sql, [id])? > 0;
        if deleted {
            log::debug!("Deleted {} {}", T::ENTITY, id);
        }
        Ok(deleted)
    }

    /// A manager for the targets linked to `source` through `relation`.
    pub fn related<S, T>(&self, relation: ManyToMany<S, T>, source: S) -> Related<'_, S, T> {
        Related::new(self, relation, source)
    }
}

/// Comma-separated, quoted column names, optionally qualified by an alias.
fn column_list<T: Table>(alias: Option<&str>) -> String {
    T::COLUMNS
        .iter()
        .map(|column| match alias {
            Some(alias) => format!("{}.{}", alias, quote(column)),
            None => quote(column),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// Group membership
impl Database {
    /// Add `user` to `group`.
    ///
    /// `role` is stored only when the membership is created; adding an
    /// existing member again changes nothing. Returns whether a membership
    /// was created.
    pub fn add_member(&self, group: GroupId, user: UserId, role: Option<&str>) -> Result<bool> {
        let membership = Membership::new(group, user, role.unwrap_or_default());
        membership.validate()?;
        self.require::<Group>(group)?;
        self.require::<User>(user)?;

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO group_memberships (group_id, user_id, role)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![membership.group, membership.member, membership.role],
        )?;
        if inserted > 0 {
            log::debug!("Added member {} to group {}", user, group);
        }
        Ok(inserted > 0)
    }

    /// Replace the role of an existing member.
    pub fn set_member_role(&self, group: GroupId, user: UserId, role: &str) -> Result<()> {
        Membership::new(group, user, role).validate()?;
        let changed = self.conn.execute(
            "UPDATE group_memberships SET role = ?3 WHERE group_id = ?1 AND user_id = ?2",
            rusqlite::params![group, user, role],
        )?;
        if changed == 0 {
            return Err(Error::NotFound {
                entity: "GroupMembership",
                id: format!("{}/{}", group, user),
            });
        }
        Ok(())
    }

    /// The role `user` plays in `group`, or `None` if they are not a member.
    pub fn member_role(&self, group: GroupId, user: UserId) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT role FROM group_memberships WHERE group_id = ?1 AND user_id = ?2",
                rusqlite::params![group, user],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn remove_member(&self, group: GroupId, user: UserId) -> Result<bool> {
        self.related(GROUP_MEMBERS, group).remove(user)
    }

    /// Memberships of `group` in the order members joined.
    pub fn memberships(&self, group: GroupId) -> Result<Vec<Membership>> {
        let mut stmt = self.conn.prepare(
            "SELECT group_id, user_id, role FROM group_memberships
             WHERE group_id = ?1
             ORDER BY rowid",
        )?;
        let memberships = stmt
            .query_map([group], |row| {
                Ok(Membership {
                    group: row.get(0)?,
                    member: row.get(1)?,
                    role: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(memberships)
    }

    /// Each member of `group` with the role they play, in join order.
    pub fn member_roles(&self, group: GroupId) -> Result<Vec<(User, String)>> {
        let sql = format!(
            "SELECT {}, m.role FROM group_memberships m
             JOIN users u ON u.id = m.user_id
             WHERE m.group_id = ?1
             ORDER BY m.rowid",
            column_list::<User>(Some("u"))
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let members = stmt
            .query_map([group], |row| {
                Ok((User::from_row(row)?, row.get("role")?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members)
    }

    fn require<T: Table>(&self, id: T::Id) -> Result<()> {
        if self.row_exists(T::TABLE, &id.to_string())? {
            Ok(())
        } else {
            Err(Error::NotFound {
                entity: T::ENTITY,
                id: id.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Genre, Location, Song};

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
        assert!(db.pending_migrations().unwrap().is_empty());
        assert_eq!(db.applied_migrations().unwrap().last(), Some(&latest_version()));
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.migrate().unwrap().is_empty());
    }

    #[test]
    fn test_migrate_to_stops_at_target() {
        let db = Database::open_in_memory().unwrap();
        let fresh = Database::from_connection(Connection::open_in_memory().unwrap()).unwrap();
        assert_eq!(fresh.migrate_to(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(fresh.pending_migrations().unwrap().len(), MIGRATIONS.len() - 3);
        assert_eq!(fresh.migrate().unwrap().first(), Some(&4));
        assert_eq!(fresh.applied_migrations().unwrap(), db.applied_migrations().unwrap());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let enabled: bool = db
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }

    #[test]
    fn test_genre_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let rock = Genre::new("Rock");
        db.insert(&rock).unwrap();
        assert_eq!(db.get::<Genre>(rock.id).unwrap(), rock);
        assert_eq!(db.count::<Genre>().unwrap(), 1);
    }

    #[test]
    fn test_get_missing_row() {
        let db = Database::open_in_memory().unwrap();
        let err = db.get::<Genre>(crate::model::GenreId::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Genre", .. }));
    }

    #[test]
    fn test_invalid_insert_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let err = db.insert(&Genre::new("")).unwrap_err();
        assert!(err.validation_errors().unwrap().contains("name"));
        assert_eq!(db.count::<Genre>().unwrap(), 0);
    }

    #[test]
    fn test_update_touches_timestamp() {
        let db = Database::open_in_memory().unwrap();
        let mut user = User::new("bill_nye", "Bill", "Nye")
            .with_birth_date(chrono::NaiveDate::from_ymd_opt(1980, 1, 1).unwrap());
        db.insert(&user).unwrap();
        let before = user.updated_at;

        user.bio = "The Science Guy".to_string();
        db.update(&mut user).unwrap();

        let stored = db.get::<User>(user.id).unwrap();
        assert_eq!(stored.bio, "The Science Guy");
        assert!(stored.updated_at >= before);
        assert_eq!(stored.created_at, user.created_at);
    }

    #[test]
    fn test_update_missing_row() {
        let db = Database::open_in_memory().unwrap();
        let mut genre = Genre::new("Jazz");
        assert!(matches!(
            db.update(&mut genre).unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn test_failed_update_keeps_timestamp() {
        let db = Database::open_in_memory().unwrap();
        let mut song = Song::new("Never Saved");
        let before = song.updated_at;
        assert!(db.update(&mut song).is_err());
        assert_eq!(song.updated_at, before);
    }

    #[test]
    fn test_scan_reports_undecodable_rows() {
        let db = Database::open_in_memory().unwrap();
        let good = Song::new("Seven Nation Army");
        let bad = Song::new("Money");
        db.insert(&good).unwrap();
        db.insert(&bad).unwrap();
        db.conn()
            .execute(
                "UPDATE songs SET time_signature = '11/4' WHERE id = ?1",
                [bad.id],
            )
            .unwrap();

        let rows = db.scan::<Song>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1.as_ref().unwrap(), &good);
        assert_eq!(rows[1].0, bad.id.to_string());
        assert!(rows[1].1.is_err());
        assert!(db.all::<Song>().is_err());
    }

    #[test]
    fn test_has_table() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.has_table("groups").unwrap());
        assert!(!db.has_table("group_members").unwrap());
    }

    #[test]
    fn test_foreign_key_must_exist() {
        let db = Database::open_in_memory().unwrap();
        let group = Group::new("Ghost Band", UserId::new());
        let err = db.insert(&group).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.messages("created_by")[0].starts_with("user instance with id"));
        assert!(errors.contains("owned_by"));
    }

    #[test]
    fn test_revalidating_saved_location_passes() {
        let db = Database::open_in_memory().unwrap();
        let location = Location::new("Scranton", "PA", "18503");
        db.insert(&location).unwrap();
        assert!(db.full_clean(&location).is_ok());
    }
}
