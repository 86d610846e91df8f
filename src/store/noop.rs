use std::collections::HashMap;

use crate::error::{Result, StoreError};
use crate::model::{Task, TaskTag};
use crate::query::TasksQuery;
use crate::score::calculate_value;
use crate::settings::Settings;
use crate::store::TaskStore;

/// Accepts every write and remembers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore;

impl TaskStore for NoopStore {
    fn tasks(&self) -> Result<Vec<Task>> {
        Ok(Vec::new())
    }

    fn find_task(&self, id: &str) -> Result<Task> {
        Err(StoreError::not_found("task", id))
    }

    fn find_tasks(&self, _query: &TasksQuery) -> Result<Vec<Task>> {
        Ok(Vec::new())
    }

    fn save_task(&self, task: &Task) -> Result<Task> {
        Ok(Task {
            value: calculate_value(task),
            ..task.clone()
        })
    }

    fn delete_task(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    fn delete_all_tasks(&self) -> Result<()> {
        Ok(())
    }

    fn save_tag(&self, _tag: &TaskTag) -> Result<()> {
        Ok(())
    }

    fn delete_tag(&self, _tag: &TaskTag) -> Result<()> {
        Ok(())
    }

    fn tags(&self) -> Result<Vec<TaskTag>> {
        Ok(Vec::new())
    }

    fn add_tag_to_task(&self, _task_id: &str, _tag: &TaskTag) -> Result<()> {
        Ok(())
    }

    fn remove_tag_from_task(&self, _task_id: &str, _tag: &TaskTag) -> Result<()> {
        Ok(())
    }

    fn task_tags(&self, _task_id: &str) -> Result<Vec<TaskTag>> {
        Ok(Vec::new())
    }

    fn tasks_tags(&self, _task_ids: &[String]) -> Result<HashMap<String, Vec<TaskTag>>> {
        Ok(HashMap::new())
    }

    fn find_settings(&self, _id: &str) -> Result<Settings> {
        Ok(Settings::user_default())
    }

    fn save_settings(&self, _settings: &Settings) -> Result<()> {
        Ok(())
    }

    fn migration_exists(&self, _id: &str) -> Result<bool> {
        Ok(true)
    }

    fn record_migration(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}
