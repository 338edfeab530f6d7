//! Persistent seen-key store: one row per canonical URL with its first
//! insertion time. Drives the "what's new" split for the notification;
//! the spreadsheet is governed by the run mode instead.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

const EXPECTED_COLUMNS: &[&str] = &["url", "created_at"];

pub struct SeenStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SeenStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open seen-key store: {}", path.display()))?;
        let mut store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Platform data dir, same placement scheme as the rest of the state.
    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobradar") {
            proj_dirs.data_dir().join("jobs.db")
        } else {
            PathBuf::from("jobs.db")
        }
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn, path: None };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Creates the table, or rebuilds it after backing the file up when
    /// the on-disk schema does not match.
    fn ensure_schema(&mut self) -> Result<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='seen_urls'",
            [],
            |row| row.get(0),
        )?;

        if exists > 0 && !self.schema_matches()? {
            self.backup_file()?;
            self.conn.execute("DROP TABLE seen_urls", [])?;
        }

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS seen_urls (
                url TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn schema_matches(&self) -> Result<bool> {
        let mut stmt = self.conn.prepare("PRAGMA table_info(seen_urls)")?;
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;
        Ok(columns == EXPECTED_COLUMNS)
    }

    fn backup_file(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let backup = path.with_file_name(format!("jobs_backup_{stamp}.db"));
        std::fs::copy(path, &backup)
            .with_context(|| format!("Failed to back up store to {}", backup.display()))?;
        eprintln!(
            "Seen-key store schema changed; rebuilt after backup: {}",
            backup.display()
        );
        Ok(())
    }

    pub fn load(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM seen_urls")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(keys)
    }

    pub fn is_seen(&self, key: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM seen_urls WHERE url = ?1", [key], |row| {
                row.get(0)
            })
            .ok();
        Ok(found.is_some())
    }

    /// Inserts new keys in one transaction. Re-marking a key keeps its
    /// original timestamp.
    pub fn mark_seen(&mut self, keys: &[String], now: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO seen_urls (url, created_at) VALUES (?1, ?2)")?;
            for key in keys {
                stmt.execute(params![key, now])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn total(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seen_urls", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_load() {
        let mut store = SeenStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());

        let keys = vec![
            "https://example.com/job/1".to_string(),
            "https://example.com/job/2".to_string(),
        ];
        store.mark_seen(&keys, "2026-01-05 09:00:00").unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains("https://example.com/job/1"));
        assert!(store.is_seen("https://example.com/job/2").unwrap());
        assert!(!store.is_seen("https://example.com/job/3").unwrap());
        assert_eq!(store.total().unwrap(), 2);
    }

    #[test]
    fn test_remark_keeps_first_timestamp() {
        let mut store = SeenStore::open_in_memory().unwrap();
        let keys = vec!["https://example.com/job/1".to_string()];
        store.mark_seen(&keys, "2026-01-05 09:00:00").unwrap();
        store.mark_seen(&keys, "2026-01-06 09:00:00").unwrap();

        let created: String = store
            .conn
            .query_row(
                "SELECT created_at FROM seen_urls WHERE url = ?1",
                [&keys[0]],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(created, "2026-01-05 09:00:00");
        assert_eq!(store.total().unwrap(), 1);
    }

    #[test]
    fn test_schema_mismatch_rebuilds() {
        let path = std::env::temp_dir().join(format!(
            "jobradar_store_test_{}.db",
            std::process::id()
        ));
        std::fs::remove_file(&path).ok();

        // Seed an old-schema file.
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE seen_urls (url TEXT PRIMARY KEY, company TEXT, title TEXT);
                 INSERT INTO seen_urls (url, company, title) VALUES ('u', 'c', 't');",
            )
            .unwrap();
        }

        let store = SeenStore::open(&path).unwrap();
        assert_eq!(store.total().unwrap(), 0);
        assert!(store.schema_matches().unwrap());

        // A backup of the old file exists next to the store.
        let dir = path.parent().unwrap();
        let backup_found = std::fs::read_dir(dir).unwrap().any(|entry| {
            entry
                .unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with("jobs_backup_")
        });
        assert!(backup_found);

        drop(store);
        std::fs::remove_file(&path).ok();
        for entry in std::fs::read_dir(dir).unwrap().flatten() {
            if entry.file_name().to_string_lossy().starts_with("jobs_backup_") {
                std::fs::remove_file(entry.path()).ok();
            }
        }
    }
}
