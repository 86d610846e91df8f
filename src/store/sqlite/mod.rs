use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, ErrorCode};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::model::{Task, TaskTag};
use crate::query::TasksQuery;
use crate::settings::Settings;
use crate::store::TaskStore;

pub mod migration;
mod settings;
pub mod sql;
mod tags;
mod tasks;

/// Store backed by a single SQLite file owned by this process.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: PathBuf,
    applied_on_open: usize,
}

// Exclusive locking must be chosen before WAL so the WAL index lives in heap
// memory and the file lock is held for the life of the connection. The busy
// handler rusqlite installs on open is cleared so a second opener fails
// immediately instead of retrying.
fn set_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::ZERO)?;
    conn.execute_batch(
        "PRAGMA locking_mode = EXCLUSIVE;
         PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;",
    )
}

fn lock_error(err: rusqlite::Error, path: &Path) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            StoreError::Locked(path.to_path_buf())
        }
        _ => StoreError::from(err),
    }
}

impl SqliteStore {
    /// Open or create the store at `path`, take the file lock and run pending
    /// migrations.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        set_pragmas(&conn).map_err(|e| lock_error(e, path))?;
        conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;")
            .map_err(|e| lock_error(e, path))?;
        Self::init(conn, path.to_path_buf())
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        set_pragmas(&conn)?;
        Self::init(conn, PathBuf::from(":memory:"))
    }

    fn init(mut conn: Connection, path: PathBuf) -> Result<Self> {
        let applied_on_open = migration::migrate(&mut conn)
            .map_err(|e| e.context("migrate", path.display().to_string()))?;
        info!(path = %path.display(), applied = applied_on_open, "opened sqlite store");
        Ok(Self {
            conn: Mutex::new(conn),
            path,
            applied_on_open,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of migrations that ran while opening this handle.
    pub fn applied_on_open(&self) -> usize {
        self.applied_on_open
    }

    /// Close the connection, releasing the file lock.
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        conn.close().map_err(|(_, e)| StoreError::from(e))?;
        info!(path = %self.path.display(), "closed sqlite store");
        Ok(())
    }

    // A panic while holding the lock leaves the connection usable; any open
    // transaction was rolled back when it was dropped.
    pub(crate) fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Connection) -> Result<R>,
    {
        let mut guard = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl TaskStore for SqliteStore {
    fn tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| tasks::all(conn))
            .map_err(|e| e.context("tasks", ""))
    }

    fn find_task(&self, id: &str) -> Result<Task> {
        self.with_conn(|conn| tasks::find(conn, id))
            .map_err(|e| e.context("find_task", id))
    }

    fn find_tasks(&self, query: &TasksQuery) -> Result<Vec<Task>> {
        self.with_conn(|conn| tasks::find_by_query(conn, query))
            .map_err(|e| e.context("find_tasks", ""))
    }

    fn save_task(&self, task: &Task) -> Result<Task> {
        self.with_conn(|conn| tasks::save(conn, task))
            .map_err(|e| e.context("save_task", &task.id))
    }

    fn delete_task(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| tasks::delete(conn, id))
            .map_err(|e| e.context("delete_task", id))
    }

    fn delete_all_tasks(&self) -> Result<()> {
        self.with_conn(|conn| tasks::delete_all(conn))
            .map_err(|e| e.context("delete_all_tasks", ""))
    }

    fn save_tag(&self, tag: &TaskTag) -> Result<()> {
        self.with_conn(|conn| tags::save(conn, tag))
            .map_err(|e| e.context("save_tag", tag.as_str()))
    }

    fn delete_tag(&self, tag: &TaskTag) -> Result<()> {
        self.with_conn(|conn| tags::delete(conn, tag))
            .map_err(|e| e.context("delete_tag", tag.as_str()))
    }

    fn tags(&self) -> Result<Vec<TaskTag>> {
        self.with_conn(|conn| tags::all(conn))
            .map_err(|e| e.context("tags", ""))
    }

    fn add_tag_to_task(&self, task_id: &str, tag: &TaskTag) -> Result<()> {
        self.with_conn(|conn| tags::add_to_task(conn, task_id, tag))
            .map_err(|e| e.context("add_tag_to_task", format!("{task_id}/{tag}")))
    }

    fn remove_tag_from_task(&self, task_id: &str, tag: &TaskTag) -> Result<()> {
        self.with_conn(|conn| tags::remove_from_task(conn, task_id, tag))
            .map_err(|e| e.context("remove_tag_from_task", format!("{task_id}/{tag}")))
    }

    fn task_tags(&self, task_id: &str) -> Result<Vec<TaskTag>> {
        self.with_conn(|conn| tags::for_task(conn, task_id))
            .map_err(|e| e.context("task_tags", task_id))
    }

    fn tasks_tags(&self, task_ids: &[String]) -> Result<HashMap<String, Vec<TaskTag>>> {
        self.with_conn(|conn| tags::for_tasks(conn, task_ids))
            .map_err(|e| e.context("tasks_tags", format!("{} ids", task_ids.len())))
    }

    fn find_settings(&self, id: &str) -> Result<Settings> {
        self.with_conn(|conn| settings::find(conn, id))
            .map_err(|e| e.context("find_settings", id))
    }

    fn save_settings(&self, s: &Settings) -> Result<()> {
        self.with_conn(|conn| settings::save(conn, s))
            .map_err(|e| e.context("save_settings", &s.id))
    }

    fn migration_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| migration::migration_exists(conn, id))
            .map_err(|e| e.context("migration_exists", id))
    }

    fn record_migration(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| migration::record_migration(conn, id))
            .map_err(|e| e.context("record_migration", id))
    }
}

#[cfg(test)]
pub(crate) fn open_memory() -> Result<SqliteStore> {
    SqliteStore::open_in_memory()
}
