use serde::{Deserialize, Serialize};

use crate::query::{SortColumn, SortDirection, TasksQuery, DEFAULT_LIMIT_COUNT};

pub const USER_SETTINGS_ID: &str = "UserSettings";

/// A named, persisted `TasksQuery`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub id: String,
    pub tasks_query: TasksQuery,
}

impl Settings {
    /// The row created the first time the user settings are read.
    pub fn user_default() -> Self {
        Self {
            id: USER_SETTINGS_ID.to_string(),
            tasks_query: TasksQuery {
                filter_completed: true,
                limit_count: DEFAULT_LIMIT_COUNT,
                ..TasksQuery::default()
            },
        }
    }

    pub fn is_sorted(&self, column: SortColumn, direction: SortDirection) -> bool {
        self.tasks_query.sort_column == column && self.tasks_query.sort_direction == direction
    }

    /// Sort by `column`; choosing the active column again flips the direction
    /// and a new column starts descending.
    pub fn toggle_sorting(&mut self, column: SortColumn) {
        let q = &mut self.tasks_query;
        if q.sort_column == column {
            q.sort_direction = q.sort_direction.flip();
        } else {
            q.sort_column = column;
            q.sort_direction = SortDirection::Desc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hides_completed() {
        let s = Settings::user_default();
        assert_eq!(s.id, "UserSettings");
        assert!(s.tasks_query.filter_completed);
        assert!(!s.tasks_query.filter_incompleted);
        assert!(!s.tasks_query.enable_limit);
        assert_eq!(s.tasks_query.limit_count, 10);
    }

    #[test]
    fn toggle_same_column_flips() {
        let mut s = Settings::user_default();
        s.toggle_sorting(SortColumn::Value);
        assert!(s.is_sorted(SortColumn::Value, SortDirection::Desc));
        s.toggle_sorting(SortColumn::Value);
        assert!(s.is_sorted(SortColumn::Value, SortDirection::Asc));
        s.toggle_sorting(SortColumn::Value);
        assert!(s.is_sorted(SortColumn::Value, SortDirection::Desc));
    }

    #[test]
    fn toggle_new_column_starts_desc() {
        let mut s = Settings::user_default();
        s.tasks_query.sort_column = SortColumn::Cost;
        s.tasks_query.sort_direction = SortDirection::Asc;
        s.toggle_sorting(SortColumn::Fun);
        assert!(s.is_sorted(SortColumn::Fun, SortDirection::Desc));
    }
}
