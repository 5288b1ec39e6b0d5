use anyhow::Result;
use bandshare_core::model::{Artist, Genre, Group, Instrument, Location, Setlist, Song, User};
use bandshare_core::schema::{Database, Table};
use bandshare_core::Error;
use std::fmt;
use std::path::Path;

/// A stored record that fails validation.
#[derive(Debug)]
pub struct Failure {
    pub entity: &'static str,
    pub record: String,
    pub errors: String,
}

fn check_table<T: Table + fmt::Display>(db: &Database, failures: &mut Vec<Failure>) -> Result<usize> {
    let rows = db.scan::<T>()?;
    for (id, decoded) in &rows {
        let row = match decoded {
            Ok(row) => row,
            Err(e) => {
                failures.push(Failure {
                    entity: T::ENTITY,
                    record: id.clone(),
                    errors: format!("cannot read stored row: {}", e),
                });
                continue;
            }
        };
        match db.full_clean(row) {
            Ok(()) => {}
            Err(Error::Validation(errors)) => failures.push(Failure {
                entity: T::ENTITY,
                record: format!("{} ({})", row, id),
                errors: errors.to_string(),
            }),
            Err(e) => return Err(e.into()),
        }
    }
    log::debug!("Checked {} {} rows", rows.len(), T::ENTITY);
    Ok(rows.len())
}

/// Validate every stored record. Returns the failures.
pub fn check_all(db: &Database) -> Result<(usize, Vec<Failure>)> {
    let mut failures = Vec::new();
    let checked = check_table::<User>(db, &mut failures)?
        + check_table::<Group>(db, &mut failures)?
        + check_table::<Genre>(db, &mut failures)?
        + check_table::<Instrument>(db, &mut failures)?
        + check_table::<Location>(db, &mut failures)?
        + check_table::<Artist>(db, &mut failures)?
        + check_table::<Song>(db, &mut failures)?
        + check_table::<Setlist>(db, &mut failures)?;
    Ok((checked, failures))
}

pub fn run_check(db_path: &Path) -> Result<()> {
    let db = Database::connect(db_path)?;
    let pending = db.pending_migrations()?.len();
    if pending > 0 {
        anyhow::bail!(
            "{} migrations pending; run `bandshare migrate` before `bandshare check`",
            pending
        );
    }
    let (checked, failures) = check_all(&db)?;

    for failure in &failures {
        println!("✗ {} {}: {}", failure.entity, failure.record, failure.errors);
    }

    if failures.is_empty() {
        println!("✓ {} records valid", checked);
        Ok(())
    } else {
        anyhow::bail!("{} of {} records failed validation", failures.len(), checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_passes_valid_records() {
        let db = Database::open_in_memory().unwrap();
        db.insert(&Genre::new("Polka")).unwrap();
        db.insert(&Song::new("Amish Paradise")).unwrap();

        let (checked, failures) = check_all(&db).unwrap();
        assert_eq!(checked, 2);
        assert!(failures.is_empty());
    }

    #[test]
    fn test_check_reports_undecodable_rows_and_keeps_going() {
        let db = Database::open_in_memory().unwrap();
        let good = Song::new("Seven Nation Army");
        let bad = Song::new("Money");
        db.insert(&good).unwrap();
        db.insert(&bad).unwrap();
        db.insert(&Genre::new("Prog")).unwrap();
        db.conn()
            .execute(
                "UPDATE songs SET time_signature = '11/4' WHERE id = ?1",
                [bad.id],
            )
            .unwrap();

        let (checked, failures) = check_all(&db).unwrap();
        assert_eq!(checked, 3);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].entity, "Song");
        assert_eq!(failures[0].record, bad.id.to_string());
        assert!(failures[0].errors.contains("11/4"));
    }

    #[test]
    fn test_check_refuses_unmigrated_store() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        Database::connect(&db_path).unwrap().migrate_to(3).unwrap();

        assert!(run_check(&db_path).is_err());
        assert_eq!(
            Database::connect(&db_path).unwrap().applied_migrations().unwrap(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_check_reports_invalid_stored_rows() {
        let db = Database::open_in_memory().unwrap();
        let song = Song::new("Albuquerque");
        db.insert(&song).unwrap();
        db.conn()
            .execute("UPDATE songs SET bpm = 500", [])
            .unwrap();

        let (_, failures) = check_all(&db).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].entity, "Song");
        assert!(failures[0].errors.starts_with("bpm: "));
    }
}
