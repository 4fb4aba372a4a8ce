//! SQL migration definitions for the knowledge base database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: headwords, builds",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Headword -> grammatical gender
CREATE TABLE IF NOT EXISTS headwords (
    headword TEXT PRIMARY KEY,
    gender   TEXT NOT NULL
);

-- Build history
CREATE TABLE IF NOT EXISTS builds (
    id         TEXT PRIMARY KEY,
    language   TEXT NOT NULL,
    built_at   TEXT NOT NULL,
    candidates INTEGER NOT NULL,
    resolved   INTEGER NOT NULL,
    failed     INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_builds_built_at ON builds(built_at);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
