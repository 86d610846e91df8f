use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::{self, Task, TaskTag};
use crate::query::{PreparedQuery, SortColumn, TasksQuery};
use crate::settings::{Settings, USER_SETTINGS_ID};
use crate::store::{TagDiff, TaskStore};

/// Data fixup that re-saves every task so `value` is stored for rows written
/// before scoring existed.
pub const UPDATE_TASK_VALUE_MIGRATION: &str = "update_task_value";

/// Task, tag and settings operations over an injected store handle.
///
/// Tasks returned from here carry their tags.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn TaskStore {
        self.store.as_ref()
    }

    /// Run one-shot data fixups. Call once after opening the store.
    pub fn init(&self) -> Result<()> {
        if self.store.migration_exists(UPDATE_TASK_VALUE_MIGRATION)? {
            return Ok(());
        }
        let tasks = self.store.tasks()?;
        for task in &tasks {
            self.store.save_task(task)?;
        }
        self.store.record_migration(UPDATE_TASK_VALUE_MIGRATION)?;
        info!(
            migration = UPDATE_TASK_VALUE_MIGRATION,
            tasks = tasks.len(),
            "recomputed task values"
        );
        Ok(())
    }

    fn hydrate(&self, mut tasks: Vec<Task>) -> Result<Vec<Task>> {
        let ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        let mut tags = self.store.tasks_tags(&ids)?;
        for task in &mut tasks {
            task.tags = tags.remove(&task.id).unwrap_or_default();
        }
        Ok(tasks)
    }

    pub fn find_task(&self, id: &str) -> Result<Task> {
        let mut task = self.store.find_task(id)?;
        task.tags = self.store.task_tags(id)?;
        Ok(task)
    }

    pub fn find_tasks(&self, query: &TasksQuery) -> Result<Vec<Task>> {
        let tasks = self.store.find_tasks(query)?;
        self.hydrate(tasks)
    }

    /// Tasks matching the saved user filter.
    pub fn visible_tasks(&self) -> Result<Vec<Task>> {
        let settings = self.user_settings()?;
        self.find_tasks(&settings.tasks_query)
    }

    /// Store `task` under a fresh id, attaching `task.tags`.
    pub fn save_new_task(&self, task: Task) -> Result<Task> {
        let task = task.as_new_task();
        let saved = self.store.save_task(&task)?;
        self.update_task_tags(&saved.id, &task.tags)?;
        debug!(id = %saved.id, "saved new task");
        self.find_task(&saved.id)
    }

    /// Merge `change` into the stored task with the same id and make its tags
    /// equal to `change.tags`.
    pub fn update_task(&self, change: Task) -> Result<Task> {
        let original = self.store.find_task(&change.id)?;
        let desired = change.tags.clone();
        let merged = original.update(change);
        let saved = self.store.save_task(&merged)?;
        self.update_task_tags(&saved.id, &desired)?;
        self.find_task(&saved.id)
    }

    /// Apply only the association changes between the current and `desired`
    /// tags. Tags missing from the catalog are added to it.
    pub fn update_task_tags(&self, task_id: &str, desired: &[TaskTag]) -> Result<TagDiff> {
        let existing = self.store.task_tags(task_id)?;
        let diff = TagDiff::between(&existing, desired);
        for tag in &diff.to_add {
            self.store.save_tag(tag)?;
            self.store.add_tag_to_task(task_id, tag)?;
        }
        for tag in &diff.to_remove {
            self.store.remove_tag_from_task(task_id, tag)?;
        }
        if !diff.is_empty() {
            debug!(
                task = task_id,
                added = diff.to_add.len(),
                removed = diff.to_remove.len(),
                "updated task tags"
            );
        }
        Ok(diff)
    }

    /// Complete an open task or reopen a completed one.
    pub fn flip_task(&self, id: &str) -> Result<Task> {
        let task = self.find_task(id)?;
        let flipped = if task.is_completed() {
            task.uncomplete()
        } else {
            task.complete()
        };
        self.store.save_task(&flipped)
    }

    pub fn clone_task(&self, id: &str) -> Result<Task> {
        let copy = self.find_task(id)?.clone_as_new();
        let saved = self.store.save_task(&copy)?;
        self.update_task_tags(&saved.id, &copy.tags)?;
        self.find_task(&saved.id)
    }

    /// Lower the priority of every visible task by one level. Tasks already at
    /// Low are not rewritten. Returns how many tasks changed.
    pub fn reduce_priority_for_visible_tasks(&self) -> Result<usize> {
        let mut changed = 0;
        for task in self.visible_tasks()? {
            let reduced = task.priority.reduce();
            if reduced == task.priority {
                continue;
            }
            self.store.save_task(&Task {
                priority: reduced,
                updated: model::now(),
                ..task
            })?;
            changed += 1;
        }
        info!(changed, "reduced priority of visible tasks");
        Ok(changed)
    }

    pub fn delete_task(&self, id: &str) -> Result<()> {
        debug!(id, "deleting task");
        self.store.delete_task(id)
    }

    pub fn delete_all_tasks(&self) -> Result<()> {
        debug!("deleting all tasks");
        self.store.delete_all_tasks()
    }

    pub fn tags(&self) -> Result<Vec<TaskTag>> {
        self.store.tags()
    }

    pub fn save_tag(&self, tag: &TaskTag) -> Result<()> {
        self.store.save_tag(tag)
    }

    /// Remove a tag from the catalog, every task and the saved filter.
    pub fn delete_tag(&self, tag: &TaskTag) -> Result<()> {
        self.store.delete_tag(tag)?;
        self.remove_tag_from_settings(tag)?;
        Ok(())
    }

    /// The user settings, created with defaults on first access.
    pub fn user_settings(&self) -> Result<Settings> {
        match self.store.find_settings(USER_SETTINGS_ID) {
            Ok(settings) => Ok(settings),
            Err(e) if e.is_not_found() => {
                warn!("no user settings found, creating defaults");
                let settings = Settings::user_default();
                self.store.save_settings(&settings)?;
                Ok(settings)
            }
            Err(e) => Err(e),
        }
    }

    pub fn update_user_settings(&self, settings: &Settings) -> Result<()> {
        self.store.save_settings(settings)
    }

    fn modify_user_settings(&self, f: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let mut settings = self.user_settings()?;
        f(&mut settings);
        self.store.save_settings(&settings)?;
        Ok(settings)
    }

    pub fn set_completed_filter(&self, hide_completed: bool) -> Result<Settings> {
        self.modify_user_settings(|s| s.tasks_query.filter_completed = hide_completed)
    }

    pub fn toggle_sorting(&self, column: SortColumn) -> Result<Settings> {
        self.modify_user_settings(|s| s.toggle_sorting(column))
    }

    pub fn apply_prepared_query(&self, prepared: PreparedQuery) -> Result<Settings> {
        debug!(query = prepared.name(), "applying prepared query");
        let today = model::today();
        self.modify_user_settings(|s| prepared.apply(&mut s.tasks_query, today))
    }

    pub fn remove_tag_from_settings(&self, tag: &TaskTag) -> Result<Settings> {
        let mut settings = self.user_settings()?;
        if settings.tasks_query.remove_tag(tag) {
            self.store.save_settings(&settings)?;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cost, Impact, Priority};
    use crate::query::SortDirection;
    use crate::score::calculate_value;
    use crate::store::sqlite::open_memory;
    use crate::store::{MemoryStore, NoopStore};

    fn services() -> Vec<TaskService> {
        vec![
            TaskService::new(Arc::new(open_memory().unwrap())),
            TaskService::new(Arc::new(MemoryStore::new())),
        ]
    }

    fn tag(s: &str) -> TaskTag {
        TaskTag::from(s)
    }

    fn with_tags(content: &str, tags: &[&str]) -> Task {
        Task {
            tags: tags.iter().map(|t| tag(t)).collect(),
            ..Task::new(content)
        }
    }

    #[test]
    fn new_task_round_trip() {
        for svc in services() {
            let task = Task {
                priority: Priority::High,
                impact: Impact::Considerable,
                ..with_tags("Plan trip\nbook hotel", &["travel", "home"])
            };
            let saved = svc.save_new_task(task).unwrap();
            assert_eq!(saved.title, "Plan trip");
            assert_eq!(saved.tags, vec![tag("home"), tag("travel")]);
            assert_eq!(saved.value, calculate_value(&saved));
            assert_eq!(svc.find_task(&saved.id).unwrap(), saved);
            assert_eq!(svc.tags().unwrap().len(), 2);
        }
    }

    #[test]
    fn update_replaces_tags_with_minimal_churn() {
        for svc in services() {
            let saved = svc.save_new_task(with_tags("t", &["a", "b"])).unwrap();
            let change = Task {
                tags: vec![tag("b"), tag("c")],
                ..saved.clone()
            };
            let updated = svc.update_task(change).unwrap();
            assert_eq!(updated.tags, vec![tag("b"), tag("c")]);
            assert_eq!(updated.id, saved.id);
            assert_eq!(updated.created, saved.created);

            let diff = svc
                .update_task_tags(&saved.id, &[tag("c"), tag("b")])
                .unwrap();
            assert!(diff.is_empty());
        }
    }

    #[test]
    fn update_missing_task_is_not_found() {
        for svc in services() {
            let change = Task {
                id: "ghost".into(),
                ..Task::new("x")
            };
            assert!(svc.update_task(change).unwrap_err().is_not_found());
        }
    }

    #[test]
    fn update_keeps_completion_instant() {
        for svc in services() {
            let saved = svc.save_new_task(Task::new("t")).unwrap();
            let done = svc.flip_task(&saved.id).unwrap();
            let first = done.completed;
            assert!(first.is_some());

            let later = first.map(|c| c + chrono::Duration::hours(5));
            let edited = svc
                .update_task(Task {
                    content: "edited".into(),
                    completed: later,
                    ..done.clone()
                })
                .unwrap();
            assert_eq!(edited.completed, first);

            let reopened = svc
                .update_task(Task {
                    completed: None,
                    ..edited
                })
                .unwrap();
            assert!(reopened.completed.is_none());
        }
    }

    #[test]
    fn flip_toggles_completion() {
        for svc in services() {
            let saved = svc.save_new_task(Task::new("t")).unwrap();
            assert!(svc.flip_task(&saved.id).unwrap().is_completed());
            assert!(svc.find_task(&saved.id).unwrap().is_completed());
            assert!(!svc.flip_task(&saved.id).unwrap().is_completed());
        }
    }

    #[test]
    fn clone_copies_tags_and_resets_completion() {
        for svc in services() {
            let original = svc
                .save_new_task(Task {
                    title: "Weekly review".into(),
                    cost: Cost::L,
                    ..with_tags("review", &["work"])
                })
                .unwrap();
            svc.flip_task(&original.id).unwrap();
            let copy = svc.clone_task(&original.id).unwrap();
            assert_ne!(copy.id, original.id);
            assert_eq!(copy.title, "Copy of Weekly review");
            assert_eq!(copy.cost, Cost::L);
            assert!(!copy.is_completed());
            assert_eq!(copy.tags, vec![tag("work")]);
            assert_eq!(svc.find_tasks(&TasksQuery::default()).unwrap().len(), 2);
        }
    }

    #[test]
    fn reduce_priority_only_touches_visible() {
        for svc in services() {
            let urgent = svc
                .save_new_task(Task {
                    priority: Priority::Urgent,
                    ..Task::new("urgent")
                })
                .unwrap();
            let low = svc
                .save_new_task(Task {
                    priority: Priority::Low,
                    ..Task::new("low")
                })
                .unwrap();
            let hidden = svc
                .save_new_task(Task {
                    priority: Priority::High,
                    ..Task::new("hidden")
                })
                .unwrap();
            svc.flip_task(&hidden.id).unwrap();

            assert_eq!(svc.reduce_priority_for_visible_tasks().unwrap(), 1);
            assert_eq!(svc.find_task(&urgent.id).unwrap().priority, Priority::High);
            assert_eq!(svc.find_task(&low.id).unwrap().priority, Priority::Low);
            assert_eq!(svc.find_task(&hidden.id).unwrap().priority, Priority::High);
        }
    }

    #[test]
    fn delete_task_and_all() {
        for svc in services() {
            let a = svc.save_new_task(with_tags("a", &["x"])).unwrap();
            svc.save_new_task(with_tags("b", &["x"])).unwrap();
            svc.delete_task(&a.id).unwrap();
            assert!(svc.store().task_tags(&a.id).unwrap().is_empty());
            assert!(svc.delete_task(&a.id).unwrap_err().is_not_found());
            svc.delete_all_tasks().unwrap();
            assert!(svc.find_tasks(&TasksQuery::default()).unwrap().is_empty());
        }
    }

    #[test]
    fn delete_tag_clears_filter() {
        for svc in services() {
            let t = svc.save_new_task(with_tags("t", &["x", "y"])).unwrap();
            let mut settings = svc.user_settings().unwrap();
            settings.tasks_query.tags = vec![tag("x"), tag("y")];
            svc.update_user_settings(&settings).unwrap();

            svc.delete_tag(&tag("x")).unwrap();
            assert_eq!(svc.find_task(&t.id).unwrap().tags, vec![tag("y")]);
            assert_eq!(svc.user_settings().unwrap().tasks_query.tags, vec![tag("y")]);
            assert_eq!(svc.tags().unwrap(), vec![tag("y")]);
        }
    }

    #[test]
    fn settings_are_created_lazily() {
        for svc in services() {
            assert!(svc
                .store()
                .find_settings(USER_SETTINGS_ID)
                .unwrap_err()
                .is_not_found());
            let s = svc.user_settings().unwrap();
            assert!(s.tasks_query.filter_completed);
            assert_eq!(svc.store().find_settings(USER_SETTINGS_ID).unwrap(), s);
        }
    }

    #[test]
    fn settings_mutators_persist() {
        for svc in services() {
            svc.set_completed_filter(false).unwrap();
            assert!(!svc.user_settings().unwrap().tasks_query.filter_completed);

            svc.toggle_sorting(SortColumn::Value).unwrap();
            let s = svc.toggle_sorting(SortColumn::Value).unwrap();
            assert!(s.is_sorted(SortColumn::Value, SortDirection::Asc));
            assert_eq!(svc.user_settings().unwrap(), s);

            let s = svc
                .apply_prepared_query(PreparedQuery::CompletedToday)
                .unwrap();
            assert!(s.tasks_query.filter_incompleted);
            assert!(!s.tasks_query.filter_completed);
            assert_eq!(s.tasks_query.completed_from, Some(model::today()));
            assert_eq!(svc.user_settings().unwrap(), s);
        }
    }

    #[test]
    fn visible_tasks_follow_settings() {
        for svc in services() {
            let open = svc.save_new_task(Task::new("open")).unwrap();
            let done = svc.save_new_task(Task::new("done")).unwrap();
            svc.flip_task(&done.id).unwrap();

            let visible = svc.visible_tasks().unwrap();
            assert_eq!(visible.len(), 1);
            assert_eq!(visible[0].id, open.id);

            svc.apply_prepared_query(PreparedQuery::CompletedToday).unwrap();
            let visible = svc.visible_tasks().unwrap();
            assert_eq!(visible.len(), 1);
            assert_eq!(visible[0].id, done.id);
        }
    }

    #[test]
    fn init_recomputes_values_once() {
        let store = Arc::new(open_memory().unwrap());
        let svc = TaskService::new(store.clone());
        let task = svc.save_new_task(Task::new("t")).unwrap();
        store
            .with_conn(|conn| {
                conn.execute("UPDATE tasks SET value = 0", [])?;
                Ok(())
            })
            .unwrap();
        assert_eq!(svc.find_task(&task.id).unwrap().value, 0.0);

        svc.init().unwrap();
        assert_eq!(svc.find_task(&task.id).unwrap().value, task.value);
        assert!(svc.store().migration_exists(UPDATE_TASK_VALUE_MIGRATION).unwrap());
        svc.init().unwrap();
    }

    #[test]
    fn noop_store_service() {
        let svc = TaskService::new(Arc::new(NoopStore));
        svc.init().unwrap();
        assert!(svc.visible_tasks().unwrap().is_empty());
        assert!(svc.tags().unwrap().is_empty());
        assert!(svc.find_task("x").unwrap_err().is_not_found());
        assert!(svc.user_settings().unwrap().tasks_query.filter_completed);
    }
}
