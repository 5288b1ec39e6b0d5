//! SQLite schema, migrations and data access.

pub mod db;
pub mod migrations;
pub mod relations;
pub mod tables;

pub use db::Database;
pub use migrations::{Migration, OnDelete, Operation, MIGRATIONS};
pub use relations::{ManyToMany, Related};
pub use tables::Table;

/// Quote an SQL identifier.
pub(crate) fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
