use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ParseError, Result};
use crate::model::{Task, TaskTag};
use crate::query::TasksQuery;
use crate::settings::Settings;

pub mod memory;
pub mod noop;
pub mod sqlite;

pub use memory::MemoryStore;
pub use noop::NoopStore;
pub use sqlite::SqliteStore;

/// Everything the service layer needs from a storage backend.
///
/// Tasks returned by the task operations carry no tags; those are loaded
/// through `task_tags` / `tasks_tags`.
pub trait TaskStore: Send + Sync {
    fn tasks(&self) -> Result<Vec<Task>>;
    fn find_task(&self, id: &str) -> Result<Task>;
    fn find_tasks(&self, query: &TasksQuery) -> Result<Vec<Task>>;
    /// Upsert by id, recomputing `value` first. Returns what was written.
    fn save_task(&self, task: &Task) -> Result<Task>;
    /// Removes the task and its tag associations together.
    fn delete_task(&self, id: &str) -> Result<()>;
    /// Removes every task and every association.
    fn delete_all_tasks(&self) -> Result<()>;

    /// Adds a tag to the catalog; an existing tag is left untouched.
    fn save_tag(&self, tag: &TaskTag) -> Result<()>;
    /// Removes a tag from the catalog and from every task.
    fn delete_tag(&self, tag: &TaskTag) -> Result<()>;
    /// All tags, newest first.
    fn tags(&self) -> Result<Vec<TaskTag>>;
    fn add_tag_to_task(&self, task_id: &str, tag: &TaskTag) -> Result<()>;
    fn remove_tag_from_task(&self, task_id: &str, tag: &TaskTag) -> Result<()>;
    fn task_tags(&self, task_id: &str) -> Result<Vec<TaskTag>>;
    /// Batch form of `task_tags`. Ids with no tags have no entry.
    fn tasks_tags(&self, task_ids: &[String]) -> Result<HashMap<String, Vec<TaskTag>>>;

    fn find_settings(&self, id: &str) -> Result<Settings>;
    fn save_settings(&self, settings: &Settings) -> Result<()>;

    fn migration_exists(&self, id: &str) -> Result<bool>;
    /// Fails with `Conflict` if `id` was already recorded.
    fn record_migration(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Sqlite,
    /// Process-local and not persisted. For tests and embedding only.
    Memory,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for Backend {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            _ => Err(ParseError::new("backend", s, "sqlite, memory")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open a store. Schema migrations have run by the time this returns.
/// `path` is ignored by `Backend::Memory`.
pub fn open(backend: Backend, path: &Path) -> Result<Box<dyn TaskStore>> {
    match backend {
        Backend::Sqlite => Ok(Box::new(SqliteStore::open(path)?)),
        Backend::Memory => Ok(Box::new(MemoryStore::new())),
    }
}

/// Association changes needed to move a task from `existing` to `desired` tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub to_add: Vec<TaskTag>,
    pub to_remove: Vec<TaskTag>,
}

impl TagDiff {
    pub fn between(existing: &[TaskTag], desired: &[TaskTag]) -> TagDiff {
        let have: BTreeSet<&TaskTag> = existing.iter().collect();
        let want: BTreeSet<&TaskTag> = desired.iter().filter(|t| !t.is_empty()).collect();
        TagDiff {
            to_add: want.difference(&have).map(|t| (*t).clone()).collect(),
            to_remove: have.difference(&want).map(|t| (*t).clone()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<TaskTag> {
        names.iter().map(|n| TaskTag::from(*n)).collect()
    }

    #[test]
    fn diff_is_plain_set_difference() {
        let diff = TagDiff::between(&tags(&["a", "b", "c"]), &tags(&["b", "d", "c", "e"]));
        assert_eq!(diff.to_add, tags(&["d", "e"]));
        assert_eq!(diff.to_remove, tags(&["a"]));
    }

    #[test]
    fn diff_ignores_duplicates_and_blanks() {
        let diff = TagDiff::between(&[], &tags(&["a", "a", ""]));
        assert_eq!(diff.to_add, tags(&["a"]));
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn same_set_is_empty() {
        let diff = TagDiff::between(&tags(&["x", "y"]), &tags(&["y", "x"]));
        assert!(diff.is_empty());
    }

    #[test]
    fn parse_backend() {
        assert_eq!("sqlite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert_eq!("memory".parse::<Backend>().unwrap(), Backend::Memory);
        assert!("badger".parse::<Backend>().is_err());
    }

    #[test]
    fn open_memory_backend_starts_empty() {
        let store = open(Backend::Memory, Path::new("unused")).unwrap();
        assert!(!store.migration_exists("update_task_value").unwrap());
        assert!(store.tasks().unwrap().is_empty());
        assert!(store.tags().unwrap().is_empty());
    }
}
