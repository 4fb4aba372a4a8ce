//! libSQL persistence for knowledge bases (offline mode).
//!
//! One database per language variant, at `<knowledge_dir>/mc_<variant>.db`.
//! The builder is the only writer and swaps the whole table at once; merge
//! runs open the database read-only and load it wholesale.

mod migrations;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use uuid::Uuid;

use crammese_shared::{CrammeseError, GenderTag, KnowledgeBase, LanguageVariant, Result};

/// Summary of one knowledge base build, stored alongside the headwords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    pub id: String,
    pub language: String,
    pub built_at: DateTime<Utc>,
    /// Distinct headwords queried.
    pub candidates: u64,
    /// Headwords stored with a gender.
    pub resolved: u64,
    /// Headwords whose lookup failed or matched nothing.
    pub failed: u64,
}

impl BuildRecord {
    /// New record stamped now with a fresh id.
    pub fn new(language: &LanguageVariant, candidates: u64, resolved: u64, failed: u64) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            language: language.to_string(),
            built_at: Utc::now(),
            candidates,
            resolved,
            failed,
        }
    }
}

/// Database file for a variant under `dir`.
pub fn database_path(dir: &Path, variant: &LanguageVariant) -> PathBuf {
    dir.join(format!("mc_{variant}.db"))
}

fn storage_err(e: impl std::fmt::Display) -> CrammeseError {
    CrammeseError::Storage(e.to_string())
}

/// Storage handle wrapping a libSQL database.
pub struct KnowledgeStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl KnowledgeStore {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CrammeseError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let store = Self {
            db,
            conn,
            readonly: false,
        };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Open an existing database at `path` for reading only.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CrammeseError::Storage(format!(
                "knowledge base not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        CrammeseError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 if no migrations have been applied.
    async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(CrammeseError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Knowledge base
    // -----------------------------------------------------------------------

    /// Replace the stored table with `knowledge` and record the build.
    ///
    /// Runs in a single transaction: readers see either the previous table
    /// or the new one, never a mix.
    pub async fn replace_all(&self, knowledge: &KnowledgeBase, record: &BuildRecord) -> Result<()> {
        self.check_writable()?;

        let tx = self.conn.transaction().await.map_err(storage_err)?;

        if let Err(e) = write_table(&tx, knowledge, record).await {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            return Err(e);
        }

        tx.commit().await.map_err(storage_err)?;

        tracing::info!(
            entries = knowledge.len(),
            build = %record.id,
            "knowledge base persisted"
        );
        Ok(())
    }

    /// Load the whole table.
    pub async fn load(&self) -> Result<KnowledgeBase> {
        let mut rows = self
            .conn
            .query("SELECT headword, gender FROM headwords", params![])
            .await
            .map_err(storage_err)?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let headword = row.get::<String>(0).map_err(storage_err)?;
            let gender = row.get::<String>(1).map_err(storage_err)?;
            entries.push((headword, gender.parse::<GenderTag>()?));
        }

        Ok(entries.into_iter().collect())
    }

    /// Most recent build record, if any.
    pub async fn last_build(&self) -> Result<Option<BuildRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, language, built_at, candidates, resolved, failed
                 FROM builds ORDER BY built_at DESC LIMIT 1",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let Some(row) = rows.next().await.map_err(storage_err)? else {
            return Ok(None);
        };

        let built_at = row.get::<String>(2).map_err(storage_err)?;
        let built_at = DateTime::parse_from_rfc3339(&built_at)
            .map_err(|e| CrammeseError::parse(format!("bad build timestamp: {e}")))?
            .with_timezone(&Utc);

        Ok(Some(BuildRecord {
            id: row.get::<String>(0).map_err(storage_err)?,
            language: row.get::<String>(1).map_err(storage_err)?,
            built_at,
            candidates: row.get::<i64>(3).map_err(storage_err)? as u64,
            resolved: row.get::<i64>(4).map_err(storage_err)? as u64,
            failed: row.get::<i64>(5).map_err(storage_err)? as u64,
        }))
    }
}

/// Swap the headword table and append the build record on `conn`.
async fn write_table(conn: &Connection, knowledge: &KnowledgeBase, record: &BuildRecord) -> Result<()> {
    conn.execute("DELETE FROM headwords", params![])
        .await
        .map_err(storage_err)?;

    for (headword, gender) in knowledge.sorted_entries() {
        conn.execute(
            "INSERT INTO headwords (headword, gender) VALUES (?1, ?2)",
            params![headword, gender.as_str()],
        )
        .await
        .map_err(storage_err)?;
    }

    conn.execute(
        "INSERT INTO builds (id, language, built_at, candidates, resolved, failed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.id.as_str(),
            record.language.as_str(),
            record.built_at.to_rfc3339(),
            record.candidates as i64,
            record.resolved as i64,
            record.failed as i64,
        ],
    )
    .await
    .map_err(storage_err)?;

    Ok(())
}

/// Load the knowledge base at `path`, or `None` when no database exists yet.
pub async fn load_if_present(path: &Path) -> Result<Option<KnowledgeBase>> {
    if !path.exists() {
        tracing::info!(?path, "no knowledge base, articles disabled");
        return Ok(None);
    }
    let store = KnowledgeStore::open_readonly(path).await?;
    let knowledge = store.load().await?;
    tracing::info!(?path, entries = knowledge.len(), "knowledge base loaded");
    Ok(Some(knowledge))
}
