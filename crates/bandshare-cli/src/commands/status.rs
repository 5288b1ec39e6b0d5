use anyhow::Result;
use bandshare_core::model::{Artist, Genre, Group, Instrument, Location, Setlist, Song, User};
use bandshare_core::schema::{Database, Table};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct StatusReport {
    database: String,
    schema_version: u32,
    pending_migrations: usize,
    tables: Vec<TableCount>,
}

#[derive(Debug, Serialize)]
struct TableCount {
    table: &'static str,
    /// `None` when the table has not been created yet.
    rows: Option<usize>,
}

fn count<T: Table>(db: &Database) -> Result<TableCount> {
    let rows = if db.has_table(T::TABLE)? {
        Some(db.count::<T>()?)
    } else {
        None
    };
    Ok(TableCount {
        table: T::TABLE,
        rows,
    })
}

fn count_memberships(db: &Database) -> Result<TableCount> {
    let rows = if db.has_table("group_memberships")? {
        let rows: i64 =
            db.conn()
                .query_row("SELECT COUNT(*) FROM group_memberships", [], |row| row.get(0))?;
        Some(usize::try_from(rows).unwrap_or_default())
    } else {
        None
    };
    Ok(TableCount {
        table: "group_memberships",
        rows,
    })
}

fn collect(db: &Database, db_path: &Path) -> Result<StatusReport> {
    Ok(StatusReport {
        database: db_path.display().to_string(),
        schema_version: db.applied_migrations()?.last().copied().unwrap_or(0),
        pending_migrations: db.pending_migrations()?.len(),
        tables: vec![
            count::<User>(db)?,
            count::<Group>(db)?,
            count_memberships(db)?,
            count::<Genre>(db)?,
            count::<Instrument>(db)?,
            count::<Location>(db)?,
            count::<Artist>(db)?,
            count::<Song>(db)?,
            count::<Setlist>(db)?,
        ],
    })
}

/// Report the store as it is; pending migrations are listed, not applied.
pub fn show_status(db_path: &Path, json: bool) -> Result<()> {
    let db = Database::connect(db_path)?;
    let report = collect(&db, db_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n📊 Bandshare Status\n");
    println!("  Database: {}", report.database);
    println!("  Schema version: {}\n", report.schema_version);
    for entry in &report.tables {
        match entry.rows {
            Some(rows) => println!("  {:<18} {:>6}", entry.table, rows),
            None => println!("  {:<18} {:>6}", entry.table, "-"),
        }
    }

    if report.pending_migrations > 0 {
        println!(
            "\n  {} migrations pending; run `bandshare migrate` to apply them",
            report.pending_migrations
        );
    }

    Ok(())
}
