use anyhow::{Context, Result};
use bandshare_core::schema::{Database, MIGRATIONS};
use std::path::Path;

pub fn run_migrate(db_path: &Path, to: Option<u32>) -> Result<()> {
    let db = Database::connect(db_path)
        .with_context(|| format!("Failed to open {}", db_path.display()))?;

    let applied = match to {
        Some(target) => db.migrate_to(target)?,
        None => db.migrate()?,
    };

    if applied.is_empty() {
        println!("No migrations to apply.");
    }
    for version in &applied {
        if let Some(migration) = MIGRATIONS.iter().find(|m| m.version == *version) {
            println!("✓ Applied {:04}_{}", migration.version, migration.name);
        }
    }

    let current = db.applied_migrations()?.last().copied().unwrap_or(0);
    println!("\nSchema version: {}", current);

    Ok(())
}

/// Print the migration log with each migration's state and operations.
pub fn list_migrations(db_path: &Path) -> Result<()> {
    let db = Database::connect(db_path)
        .with_context(|| format!("Failed to open {}", db_path.display()))?;
    let applied = db.applied_migrations()?;

    for migration in MIGRATIONS {
        let mark = if applied.contains(&migration.version) { "[X]" } else { "[ ]" };
        println!("{} {:04}_{}", mark, migration.version, migration.name);
        for operation in migration.operations {
            println!("      - {}", operation);
        }
    }

    let pending = db.pending_migrations()?.len();
    if pending > 0 {
        println!("\n{} pending; run `bandshare migrate` to apply.", pending);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_migrate_then_list() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        run_migrate(&db_path, Some(4)).unwrap();
        assert_eq!(
            Database::connect(&db_path).unwrap().applied_migrations().unwrap(),
            vec![1, 2, 3, 4]
        );

        run_migrate(&db_path, None).unwrap();
        list_migrations(&db_path).unwrap();
        assert!(Database::connect(&db_path)
            .unwrap()
            .pending_migrations()
            .unwrap()
            .is_empty());
    }
}
