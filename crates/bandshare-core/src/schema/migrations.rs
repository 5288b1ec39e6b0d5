//! The migration log.
//!
//! Migrations are append-only: a released migration is never edited, a new
//! one is added instead. Each carries the SQL that performs it and a list
//! of [`Operation`]s describing the change for `bandshare migrations`.

use std::fmt;

/// What happens to a row when the row it references is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cascade => f.write_str("CASCADE"),
            Self::SetNull => f.write_str("SET NULL"),
        }
    }
}

/// One described step of a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateModel {
        model: &'static str,
    },
    AddField {
        model: &'static str,
        field: &'static str,
        on_delete: Option<OnDelete>,
    },
    RenameField {
        model: &'static str,
        old: &'static str,
        new: &'static str,
    },
    RemoveField {
        model: &'static str,
        field: &'static str,
    },
    AlterField {
        model: &'static str,
        field: &'static str,
    },
    AddConstraint {
        model: &'static str,
        name: &'static str,
    },
    RunSql {
        description: &'static str,
    },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateModel { model } => write!(f, "Create model {}", model),
            Self::AddField {
                model,
                field,
                on_delete: Some(policy),
            } => write!(f, "Add field {} to {} (on delete {})", field, model, policy),
            Self::AddField {
                model,
                field,
                on_delete: None,
            } => write!(f, "Add field {} to {}", field, model),
            Self::RenameField { model, old, new } => {
                write!(f, "Rename field {} on {} to {}", old, model, new)
            }
            Self::RemoveField { model, field } => write!(f, "Remove field {} from {}", field, model),
            Self::AlterField { model, field } => write!(f, "Alter field {} on {}", field, model),
            Self::AddConstraint { model, name } => {
                write!(f, "Add constraint {} on model {}", name, model)
            }
            Self::RunSql { description } => write!(f, "Raw SQL operation: {}", description),
        }
    }
}

/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub operations: &'static [Operation],
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Genres
CREATE TABLE genres (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

-- Users
CREATE TABLE users (
    id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    birth_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Groups (bands, ensembles)
CREATE TABLE "groups" (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    started_date TEXT NOT NULL,
    created_by_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_groups_created_by_id ON "groups"(created_by_id);

-- Group members (many-to-many)
CREATE TABLE group_members (
    group_id TEXT NOT NULL REFERENCES "groups"(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    PRIMARY KEY (group_id, user_id)
);

-- User genres (many-to-many)
CREATE TABLE user_genres (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    genre_id TEXT NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, genre_id)
);

-- Group genres (many-to-many)
CREATE TABLE group_genres (
    group_id TEXT NOT NULL REFERENCES "groups"(id) ON DELETE CASCADE,
    genre_id TEXT NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (group_id, genre_id)
);
"#;

const MIGRATION_002: &str = r#"
ALTER TABLE users ADD COLUMN description TEXT NOT NULL DEFAULT '';
ALTER TABLE users ADD COLUMN bio TEXT NOT NULL DEFAULT '';
ALTER TABLE "groups" ADD COLUMN description TEXT NOT NULL DEFAULT '';
ALTER TABLE "groups" ADD COLUMN bio TEXT NOT NULL DEFAULT '';
"#;

const MIGRATION_003: &str = r#"
CREATE TABLE locations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    city TEXT NOT NULL,
    state TEXT NOT NULL,
    postal_code TEXT NOT NULL,
    country TEXT NOT NULL DEFAULT 'United States of America',
    CONSTRAINT general_location UNIQUE (address, city, state, postal_code, country)
);

ALTER TABLE users ADD COLUMN location_id TEXT REFERENCES locations(id) ON DELETE SET NULL;
ALTER TABLE "groups" ADD COLUMN location_id TEXT REFERENCES locations(id) ON DELETE SET NULL;

CREATE INDEX idx_users_location_id ON users(location_id);
CREATE INDEX idx_groups_location_id ON "groups"(location_id);
"#;

const MIGRATION_004: &str = r#"
CREATE TABLE instruments (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE user_instruments (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    instrument_id TEXT NOT NULL REFERENCES instruments(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, instrument_id)
);
"#;

const MIGRATION_005: &str = r#"
CREATE TABLE artists (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE songs (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    release_date TEXT,
    "key" TEXT NOT NULL DEFAULT '',
    time_signature TEXT NOT NULL DEFAULT '4/4',
    bpm INTEGER NOT NULL DEFAULT 120,
    time_seconds REAL NOT NULL DEFAULT 180,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE song_artists (
    song_id TEXT NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
    artist_id TEXT NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
    PRIMARY KEY (song_id, artist_id)
);

CREATE TABLE song_genres (
    song_id TEXT NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
    genre_id TEXT NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (song_id, genre_id)
);
"#;

const MIGRATION_006: &str = r#"
CREATE TABLE setlists (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    owner_group_id TEXT NOT NULL REFERENCES "groups"(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_setlists_owner_group_id ON setlists(owner_group_id);

CREATE TABLE setlist_songs (
    setlist_id TEXT NOT NULL REFERENCES setlists(id) ON DELETE CASCADE,
    song_id TEXT NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
    PRIMARY KEY (setlist_id, song_id)
);
"#;

// Choices for musical_key and time_signature live in code. The column
// defaults ('' and '4/4') stay as created; every insert supplies both.
const MIGRATION_007: &str = r#"
ALTER TABLE songs RENAME COLUMN time_seconds TO duration_seconds;
ALTER TABLE songs RENAME COLUMN "key" TO musical_key;
"#;

const MIGRATION_008: &str = r#"
CREATE TABLE group_memberships (
    group_id TEXT NOT NULL REFERENCES "groups"(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (group_id, user_id)
);

CREATE INDEX idx_group_memberships_user_id ON group_memberships(user_id);

INSERT INTO group_memberships (group_id, user_id)
    SELECT group_id, user_id FROM group_members;

DROP TABLE group_members;
"#;

const MIGRATION_009: &str = r#"
ALTER TABLE "groups" ADD COLUMN owned_by_id TEXT REFERENCES users(id) ON DELETE SET NULL;

UPDATE "groups" SET owned_by_id = created_by_id;
"#;

// Song artists stay a join table rather than a single required artist
// foreign key, so songs with several credited artists keep every credit.
const MIGRATION_010: &str = r#"
CREATE INDEX idx_song_artists_artist_id ON song_artists(artist_id);
"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        operations: &[
            Operation::CreateModel { model: "genre" },
            Operation::CreateModel { model: "user" },
            Operation::CreateModel { model: "group" },
            Operation::AddField {
                model: "group",
                field: "members",
                on_delete: Some(OnDelete::Cascade),
            },
            Operation::AddField {
                model: "user",
                field: "genres",
                on_delete: Some(OnDelete::Cascade),
            },
            Operation::AddField {
                model: "group",
                field: "genres",
                on_delete: Some(OnDelete::Cascade),
            },
        ],
        sql: MIGRATION_001,
    },
    Migration {
        version: 2,
        name: "profile_text",
        operations: &[
            Operation::AddField {
                model: "user",
                field: "description",
                on_delete: None,
            },
            Operation::AddField {
                model: "user",
                field: "bio",
                on_delete: None,
            },
            Operation::AddField {
                model: "group",
                field: "description",
                on_delete: None,
            },
            Operation::AddField {
                model: "group",
                field: "bio",
                on_delete: None,
            },
        ],
        sql: MIGRATION_002,
    },
    Migration {
        version: 3,
        name: "location",
        operations: &[
            Operation::CreateModel { model: "location" },
            Operation::AddConstraint {
                model: "location",
                name: "general_location",
            },
            Operation::AddField {
                model: "user",
                field: "location",
                on_delete: Some(OnDelete::SetNull),
            },
            Operation::AddField {
                model: "group",
                field: "location",
                on_delete: Some(OnDelete::SetNull),
            },
        ],
        sql: MIGRATION_003,
    },
    Migration {
        version: 4,
        name: "instrument",
        operations: &[
            Operation::CreateModel {
                model: "instrument",
            },
            Operation::AddField {
                model: "user",
                field: "instruments",
                on_delete: Some(OnDelete::Cascade),
            },
        ],
        sql: MIGRATION_004,
    },
    Migration {
        version: 5,
        name: "artist_song",
        operations: &[
            Operation::CreateModel { model: "artist" },
            Operation::CreateModel { model: "song" },
            Operation::AddField {
                model: "song",
                field: "artists",
                on_delete: Some(OnDelete::Cascade),
            },
            Operation::AddField {
                model: "song",
                field: "genres",
                on_delete: Some(OnDelete::Cascade),
            },
        ],
        sql: MIGRATION_005,
    },
    Migration {
        version: 6,
        name: "setlist",
        operations: &[
            Operation::CreateModel { model: "setlist" },
            Operation::AddField {
                model: "setlist",
                field: "owner_group",
                on_delete: Some(OnDelete::Cascade),
            },
            Operation::AddField {
                model: "setlist",
                field: "songs",
                on_delete: Some(OnDelete::Cascade),
            },
        ],
        sql: MIGRATION_006,
    },
    Migration {
        version: 7,
        name: "rename_song_fields",
        operations: &[
            Operation::RenameField {
                model: "song",
                old: "time_seconds",
                new: "duration_seconds",
            },
            Operation::RenameField {
                model: "song",
                old: "key",
                new: "musical_key",
            },
        ],
        sql: MIGRATION_007,
    },
    Migration {
        version: 8,
        name: "group_membership_role",
        operations: &[
            Operation::CreateModel {
                model: "groupmembership",
            },
            Operation::RunSql {
                description: "copy group members into group_memberships",
            },
            Operation::RemoveField {
                model: "group",
                field: "members",
            },
        ],
        sql: MIGRATION_008,
    },
    Migration {
        version: 9,
        name: "group_owned_by",
        operations: &[
            Operation::AddField {
                model: "group",
                field: "owned_by",
                on_delete: Some(OnDelete::SetNull),
            },
            Operation::RunSql {
                description: "default owned_by to created_by",
            },
        ],
        sql: MIGRATION_009,
    },
    Migration {
        version: 10,
        name: "song_artists_many_to_many",
        operations: &[Operation::RunSql {
            description: "keep song.artists many-to-many and index song_artists by artist",
        }],
        sql: MIGRATION_010,
    },
];

/// The newest schema version.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_strictly_increase() {
        let versions: Vec<u32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(versions.first(), Some(&1));
        assert_eq!(latest_version(), 10);
    }

    #[test]
    fn test_every_migration_is_described() {
        for migration in MIGRATIONS {
            assert!(!migration.operations.is_empty(), "{}", migration.name);
            assert!(!migration.sql.trim().is_empty(), "{}", migration.name);
        }
    }

    #[test]
    fn test_described_changes_appear_in_sql() {
        for migration in MIGRATIONS {
            for operation in migration.operations {
                match operation {
                    Operation::RenameField { new, .. } => {
                        let rename = format!("TO {}", new);
                        assert!(migration.sql.contains(&rename), "{}: {}", migration.name, operation);
                    }
                    Operation::AlterField { field, .. } | Operation::RemoveField { field, .. } => {
                        assert!(migration.sql.contains(field), "{}: {}", migration.name, operation);
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_song_field_renames_alter_nothing_else() {
        let renames = MIGRATIONS.iter().find(|m| m.name == "rename_song_fields").unwrap();
        assert!(renames
            .operations
            .iter()
            .all(|op| matches!(op, Operation::RenameField { .. })));
    }

    #[test]
    fn test_operation_display() {
        let op = Operation::AddField {
            model: "user",
            field: "location",
            on_delete: Some(OnDelete::SetNull),
        };
        assert_eq!(op.to_string(), "Add field location to user (on delete SET NULL)");

        let op = Operation::RenameField {
            model: "song",
            old: "key",
            new: "musical_key",
        };
        assert_eq!(op.to_string(), "Rename field key on song to musical_key");
    }
}
