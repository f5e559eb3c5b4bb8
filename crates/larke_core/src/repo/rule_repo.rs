//! Authorization rule repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create rule rows through an insert-returning-id contract.
//! - Report the current maximum `listorder` used for ordering new rules.
//!
//! # Invariants
//! - `max_list_order()` is `0` on an empty table.
//! - Child listing is deterministic: `listorder ASC, id ASC`.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::table_exists;
use crate::model::auth_rule::{AuthRule, NewAuthRule};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const RULES_TABLE: &str = "larke_auth_rules";

const RULE_SELECT_SQL: &str = "SELECT
    id,
    parentid,
    listorder,
    title,
    url,
    method,
    slug,
    description
FROM larke_auth_rules";

/// Persistence contract used by the rule tree builder.
pub trait RuleRepository {
    /// Returns the largest persisted `listorder`, or `0` when no rule exists.
    fn max_list_order(&self) -> RepoResult<i64>;
    /// Inserts one rule and returns the stored row with its generated id.
    fn insert_rule(&self, rule: &NewAuthRule) -> RepoResult<AuthRule>;
    fn get_rule(&self, id: i64) -> RepoResult<Option<AuthRule>>;
    fn list_children(&self, parent_id: i64) -> RepoResult<Vec<AuthRule>>;
}

/// SQLite-backed rule repository.
pub struct SqliteRuleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRuleRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected = latest_version();
        let actual = current_user_version(conn)?;
        if actual != expected {
            return Err(RepoError::InvalidData(format!(
                "rule repository requires schema version {expected}, got {actual}"
            )));
        }
        if !table_exists(conn, RULES_TABLE)? {
            return Err(RepoError::MissingRequiredTable(RULES_TABLE));
        }
        Ok(Self { conn })
    }
}

impl RuleRepository for SqliteRuleRepository<'_> {
    fn max_list_order(&self) -> RepoResult<i64> {
        let value = self.conn.query_row(
            "SELECT COALESCE(MAX(listorder), 0) FROM larke_auth_rules;",
            [],
            |row| row.get(0),
        )?;
        Ok(value)
    }

    fn insert_rule(&self, rule: &NewAuthRule) -> RepoResult<AuthRule> {
        self.conn.execute(
            "INSERT INTO larke_auth_rules (
                parentid,
                listorder,
                title,
                url,
                method,
                slug,
                description
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                rule.parent_id,
                rule.list_order,
                rule.title,
                rule.url,
                rule.method,
                rule.slug,
                rule.description,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_rule(id)?
            .ok_or_else(|| RepoError::NotFound(format!("auth rule {id}")))
    }

    fn get_rule(&self, id: i64) -> RepoResult<Option<AuthRule>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RULE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_rule_row(row)?));
        }
        Ok(None)
    }

    fn list_children(&self, parent_id: i64) -> RepoResult<Vec<AuthRule>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RULE_SELECT_SQL} WHERE parentid = ?1 ORDER BY listorder ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([parent_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_rule_row(row)?);
        }
        Ok(items)
    }
}

fn parse_rule_row(row: &Row<'_>) -> RepoResult<AuthRule> {
    Ok(AuthRule {
        id: row.get("id")?,
        parent_id: row.get("parentid")?,
        list_order: row.get("listorder")?,
        title: row.get("title")?,
        url: row.get("url")?,
        method: row.get("method")?,
        slug: row.get("slug")?,
        description: row.get("description")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{RuleRepository, SqliteRuleRepository};
    use crate::db::open_db_in_memory;
    use crate::model::auth_rule::{RuleDraft, ROOT_RULE_PARENT_ID};
    use crate::repo::RepoError;
    use rusqlite::Connection;

    #[test]
    fn rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteRuleRepository::try_new(&conn)
            .err()
            .expect("unmigrated connection must be rejected");
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn max_list_order_is_zero_on_empty_table() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteRuleRepository::try_new(&conn).unwrap();
        assert_eq!(repo.max_list_order().unwrap(), 0);
    }

    #[test]
    fn insert_returns_generated_id_and_children_are_ordered() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteRuleRepository::try_new(&conn).unwrap();

        let root = repo
            .insert_rule(&RuleDraft::titled("Root").to_new_rule(ROOT_RULE_PARENT_ID, 5))
            .unwrap();
        assert!(root.id > 0);
        assert_eq!(root.list_order, 5);

        let late = repo
            .insert_rule(&RuleDraft::titled("Late").to_new_rule(root.id, 9))
            .unwrap();
        let early = repo
            .insert_rule(&RuleDraft::titled("Early").to_new_rule(root.id, 7))
            .unwrap();

        let children = repo.list_children(root.id).unwrap();
        assert_eq!(
            children.iter().map(|rule| rule.id).collect::<Vec<_>>(),
            vec![early.id, late.id]
        );
        assert_eq!(repo.max_list_order().unwrap(), 9);
    }
}
