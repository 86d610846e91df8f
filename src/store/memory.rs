//! Key-value backend: an ordered map of prefix-keyed JSON records held in
//! process memory.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::model::{self, Task, TaskTag};
use crate::query::{QueryPlan, TasksQuery};
use crate::score::calculate_value;
use crate::settings::Settings;
use crate::store::TaskStore;

const TASK_PREFIX: &str = "task:";
const TAG_PREFIX: &str = "tag:";
const TASK_TAG_PREFIX: &str = "task_tag:";
const SETTINGS_PREFIX: &str = "settings:";
const MIGRATION_PREFIX: &str = "migration:";
// Separates task id and tag inside association keys. Not valid in either.
const KEY_SEP: char = '\u{1f}';

#[derive(Serialize, Deserialize)]
struct TagRecord {
    created: NaiveDateTime,
    seq: u64,
}

#[derive(Serialize, Deserialize)]
struct LinkRecord {
    seq: u64,
}

#[derive(Serialize, Deserialize)]
struct MigrationRecord {
    time: NaiveDateTime,
}

#[derive(Default)]
struct Inner {
    entries: BTreeMap<String, Vec<u8>>,
    seq: u64,
}

fn link_prefix(task_id: &str) -> String {
    format!("{TASK_TAG_PREFIX}{task_id}{KEY_SEP}")
}

fn link_key(task_id: &str, tag: &TaskTag) -> String {
    format!("{}{tag}", link_prefix(task_id))
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.entries.get(key) {
            Some(bytes) => decode(key, bytes).map(Some),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&mut self, key: String, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.entries.insert(key, bytes);
        Ok(())
    }

    fn scan<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a String, &'a Vec<u8>)> + 'a {
        self.entries
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.scan(prefix).map(|(k, _)| k.clone()).collect()
    }

    fn tasks(&self) -> Result<Vec<Task>> {
        self.scan(TASK_PREFIX)
            .map(|(k, v)| decode(k, v))
            .collect()
    }

    fn task_tags(&self, task_id: &str) -> Result<Vec<TaskTag>> {
        let prefix = link_prefix(task_id);
        let mut links = Vec::new();
        for (key, bytes) in self.scan(&prefix) {
            let link: LinkRecord = decode(key, bytes)?;
            links.push((link.seq, TaskTag::from(&key[prefix.len()..])));
        }
        links.sort_by_key(|(seq, _)| *seq);
        Ok(links.into_iter().map(|(_, tag)| tag).collect())
    }

    fn tasks_tags(&self, task_ids: &[String]) -> Result<HashMap<String, Vec<TaskTag>>> {
        let mut result = HashMap::new();
        for id in task_ids {
            let tags = self.task_tags(id)?;
            if !tags.is_empty() {
                result.insert(id.clone(), tags);
            }
        }
        Ok(result)
    }

    fn remove_links_where(&mut self, matches: impl Fn(&str) -> bool) {
        let doomed: Vec<String> = self
            .scan(TASK_TAG_PREFIX)
            .map(|(k, _)| k)
            .filter(|k| matches(k))
            .cloned()
            .collect();
        for key in doomed {
            self.entries.remove(&key);
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| StoreError::corruption(key, String::from_utf8_lossy(bytes), e))
}

/// Non-persistent store. Everything is lost when the value is dropped.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Inner) -> Result<R>,
    {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl TaskStore for MemoryStore {
    fn tasks(&self) -> Result<Vec<Task>> {
        self.with_inner(|inner| inner.tasks())
            .map_err(|e| e.context("tasks", ""))
    }

    fn find_task(&self, id: &str) -> Result<Task> {
        self.with_inner(|inner| {
            inner
                .get(&format!("{TASK_PREFIX}{id}"))?
                .ok_or_else(|| StoreError::not_found("task", id))
        })
        .map_err(|e| e.context("find_task", id))
    }

    fn find_tasks(&self, query: &TasksQuery) -> Result<Vec<Task>> {
        self.with_inner(|inner| {
            let tasks = inner.tasks()?;
            let ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
            let tags = inner.tasks_tags(&ids)?;
            Ok(QueryPlan::compile(query).select(tasks, &tags))
        })
        .map_err(|e| e.context("find_tasks", ""))
    }

    fn save_task(&self, task: &Task) -> Result<Task> {
        let mut saved = task.clone();
        saved.value = calculate_value(task);
        saved.tags = Vec::new();
        self.with_inner(|inner| inner.put(format!("{TASK_PREFIX}{}", saved.id), &saved))
            .map_err(|e| e.context("save_task", &task.id))?;
        saved.tags = task.tags.clone();
        Ok(saved)
    }

    fn delete_task(&self, id: &str) -> Result<()> {
        self.with_inner(|inner| {
            let key = format!("{TASK_PREFIX}{id}");
            if !inner.entries.contains_key(&key) {
                return Err(StoreError::not_found("task", id));
            }
            let prefix = link_prefix(id);
            inner.remove_links_where(|k| k.starts_with(&prefix));
            inner.entries.remove(&key);
            Ok(())
        })
        .map_err(|e| e.context("delete_task", id))
    }

    fn delete_all_tasks(&self) -> Result<()> {
        self.with_inner(|inner| {
            for key in inner.keys_with_prefix(TASK_PREFIX) {
                inner.entries.remove(&key);
            }
            inner.remove_links_where(|_| true);
            Ok(())
        })
        .map_err(|e| e.context("delete_all_tasks", ""))
    }

    fn save_tag(&self, tag: &TaskTag) -> Result<()> {
        self.with_inner(|inner| {
            let key = format!("{TAG_PREFIX}{tag}");
            if inner.entries.contains_key(&key) {
                return Ok(());
            }
            let record = TagRecord {
                created: model::now(),
                seq: inner.next_seq(),
            };
            inner.put(key, &record)
        })
        .map_err(|e| e.context("save_tag", tag.as_str()))
    }

    fn delete_tag(&self, tag: &TaskTag) -> Result<()> {
        self.with_inner(|inner| {
            let key = format!("{TAG_PREFIX}{tag}");
            if inner.entries.remove(&key).is_none() {
                return Err(StoreError::not_found("tag", tag.as_str()));
            }
            let suffix = format!("{KEY_SEP}{tag}");
            inner.remove_links_where(|k| k.ends_with(&suffix));
            Ok(())
        })
        .map_err(|e| e.context("delete_tag", tag.as_str()))
    }

    fn tags(&self) -> Result<Vec<TaskTag>> {
        self.with_inner(|inner| {
            let mut tags = Vec::new();
            for (key, bytes) in inner.scan(TAG_PREFIX) {
                let record: TagRecord = decode(key, bytes)?;
                tags.push((record, TaskTag::from(&key[TAG_PREFIX.len()..])));
            }
            tags.sort_by(|(a, _), (b, _)| {
                b.created.cmp(&a.created).then_with(|| b.seq.cmp(&a.seq))
            });
            Ok(tags.into_iter().map(|(_, tag)| tag).collect())
        })
        .map_err(|e| e.context("tags", ""))
    }

    fn add_tag_to_task(&self, task_id: &str, tag: &TaskTag) -> Result<()> {
        self.with_inner(|inner| {
            if !inner.entries.contains_key(&format!("{TASK_PREFIX}{task_id}")) {
                return Err(StoreError::Conflict(format!("unknown task '{task_id}'")));
            }
            if !inner.entries.contains_key(&format!("{TAG_PREFIX}{tag}")) {
                return Err(StoreError::Conflict(format!("unknown tag '{tag}'")));
            }
            let key = link_key(task_id, tag);
            if inner.entries.contains_key(&key) {
                return Err(StoreError::Conflict(format!(
                    "task '{task_id}' already has tag '{tag}'"
                )));
            }
            let link = LinkRecord {
                seq: inner.next_seq(),
            };
            inner.put(key, &link)
        })
        .map_err(|e| e.context("add_tag_to_task", format!("{task_id}/{tag}")))
    }

    fn remove_tag_from_task(&self, task_id: &str, tag: &TaskTag) -> Result<()> {
        self.with_inner(|inner| match inner.entries.remove(&link_key(task_id, tag)) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(
                "tag association",
                format!("{task_id}/{tag}"),
            )),
        })
        .map_err(|e| e.context("remove_tag_from_task", format!("{task_id}/{tag}")))
    }

    fn task_tags(&self, task_id: &str) -> Result<Vec<TaskTag>> {
        self.with_inner(|inner| inner.task_tags(task_id))
            .map_err(|e| e.context("task_tags", task_id))
    }

    fn tasks_tags(&self, task_ids: &[String]) -> Result<HashMap<String, Vec<TaskTag>>> {
        self.with_inner(|inner| inner.tasks_tags(task_ids))
            .map_err(|e| e.context("tasks_tags", format!("{} ids", task_ids.len())))
    }

    fn find_settings(&self, id: &str) -> Result<Settings> {
        self.with_inner(|inner| {
            inner
                .get(&format!("{SETTINGS_PREFIX}{id}"))?
                .ok_or_else(|| StoreError::not_found("settings", id))
        })
        .map_err(|e| e.context("find_settings", id))
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.with_inner(|inner| inner.put(format!("{SETTINGS_PREFIX}{}", settings.id), settings))
            .map_err(|e| e.context("save_settings", &settings.id))
    }

    fn migration_exists(&self, id: &str) -> Result<bool> {
        self.with_inner(|inner| Ok(inner.entries.contains_key(&format!("{MIGRATION_PREFIX}{id}"))))
            .map_err(|e| e.context("migration_exists", id))
    }

    fn record_migration(&self, id: &str) -> Result<()> {
        self.with_inner(|inner| {
            let key = format!("{MIGRATION_PREFIX}{id}");
            if inner.entries.contains_key(&key) {
                return Err(StoreError::Conflict(format!("migration '{id}' already recorded")));
            }
            inner.put(key, &MigrationRecord { time: model::now() })
        })
        .map_err(|e| e.context("record_migration", id))
    }
}
