//! Extension install records and their SQLite implementation.
//!
//! # Responsibility
//! - Answer whether the extension store exists at all.
//! - List install records for the boot sequence and persist status changes.
//!
//! # Invariants
//! - `store_exists() == false` is a normal state before first migration.
//! - Listing order is deterministic: `created_at ASC, name ASC`.

use crate::db::table_exists;
use crate::model::extension::{ExtensionRecord, ExtensionStatus};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const EXTENSIONS_TABLE: &str = "larke_extensions";

/// Query contract for persisted extension records.
pub trait ExtensionRepository {
    /// Returns whether the backing table exists.
    fn store_exists(&self) -> RepoResult<bool>;
    /// Lists every install record.
    fn list_extensions(&self) -> RepoResult<Vec<ExtensionRecord>>;
    /// Inserts or replaces one record keyed by name.
    fn save_extension(&self, record: &ExtensionRecord) -> RepoResult<()>;
    /// Changes the status of one record.
    fn set_status(&self, name: &str, status: ExtensionStatus) -> RepoResult<()>;
}

/// SQLite-backed extension repository.
///
/// Construction does not require a migrated connection so that a missing
/// table can be reported through [`ExtensionRepository::store_exists`].
pub struct SqliteExtensionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExtensionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn require_store(&self) -> RepoResult<()> {
        if self.store_exists()? {
            Ok(())
        } else {
            Err(RepoError::MissingRequiredTable(EXTENSIONS_TABLE))
        }
    }
}

impl ExtensionRepository for SqliteExtensionRepository<'_> {
    fn store_exists(&self) -> RepoResult<bool> {
        Ok(table_exists(self.conn, EXTENSIONS_TABLE)?)
    }

    fn list_extensions(&self) -> RepoResult<Vec<ExtensionRecord>> {
        self.require_store()?;
        let mut stmt = self.conn.prepare(
            "SELECT name, class_name, version, status
             FROM larke_extensions
             ORDER BY created_at ASC, name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_extension_row(row)?);
        }
        Ok(records)
    }

    fn save_extension(&self, record: &ExtensionRecord) -> RepoResult<()> {
        self.require_store()?;
        self.conn.execute(
            "INSERT INTO larke_extensions (name, class_name, version, status)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                class_name = excluded.class_name,
                version = excluded.version,
                status = excluded.status,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                record.name,
                record.class_name,
                record.version,
                record.status.code(),
            ],
        )?;
        Ok(())
    }

    fn set_status(&self, name: &str, status: ExtensionStatus) -> RepoResult<()> {
        self.require_store()?;
        let changed = self.conn.execute(
            "UPDATE larke_extensions
             SET status = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE name = ?1;",
            params![name, status.code()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(name.to_string()));
        }
        Ok(())
    }
}

fn parse_extension_row(row: &Row<'_>) -> RepoResult<ExtensionRecord> {
    let name: String = row.get("name")?;
    if name.trim().is_empty() {
        return Err(RepoError::InvalidData(
            "empty name in larke_extensions.name".to_string(),
        ));
    }
    Ok(ExtensionRecord {
        name,
        class_name: row.get("class_name")?,
        version: row.get("version")?,
        status: ExtensionStatus::from_code(row.get("status")?),
    })
}

#[cfg(test)]
mod tests {
    use super::{ExtensionRepository, SqliteExtensionRepository};
    use crate::db::open_db_in_memory;
    use crate::model::extension::{ExtensionRecord, ExtensionStatus};
    use crate::repo::RepoError;
    use rusqlite::Connection;

    #[test]
    fn reports_missing_store_on_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let repo = SqliteExtensionRepository::new(&conn);
        assert!(!repo.store_exists().unwrap());
        let err = repo.list_extensions().unwrap_err();
        assert!(matches!(err, RepoError::MissingRequiredTable(_)));
    }

    #[test]
    fn save_upserts_and_set_status_updates() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteExtensionRepository::new(&conn);
        repo.save_extension(&ExtensionRecord::disabled("demo", "demo.service"))
            .unwrap();
        repo.save_extension(&ExtensionRecord::disabled("demo", "demo.service.v2"))
            .unwrap();

        let records = repo.list_extensions().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].class_name, "demo.service.v2");
        assert_eq!(records[0].status, ExtensionStatus::Disabled);

        repo.set_status("demo", ExtensionStatus::Enabled).unwrap();
        assert_eq!(
            repo.list_extensions().unwrap()[0].status,
            ExtensionStatus::Enabled
        );
    }

    #[test]
    fn set_status_on_unknown_name_is_not_found() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteExtensionRepository::new(&conn);
        let err = repo
            .set_status("missing", ExtensionStatus::Enabled)
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(name) if name == "missing"));
    }
}
