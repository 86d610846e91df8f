use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Result, StoreError};
use crate::model::{self, TaskTag, DATE_FORMAT, UNBOUNDED_DATE};
use crate::query::{SortColumn, SortDirection, TasksQuery, DEFAULT_LIMIT_COUNT};
use crate::settings::Settings;

const SETTINGS_COLUMNS: &str = "id, filter_completed, filter_incompleted, active_sort_column, \
     active_sort_direction, completed_from, completed_to, filter_wip, filter_non_wip, planned, \
     non_planned, tags, search_text, enable_limit, limit_count";

const UPSERT: &str = "
INSERT INTO settings (id, filter_completed, filter_incompleted, active_sort_column,
    active_sort_direction, completed_from, completed_to, filter_wip, filter_non_wip, planned,
    non_planned, tags, search_text, enable_limit, limit_count)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
ON CONFLICT(id) DO UPDATE SET
    filter_completed = excluded.filter_completed,
    filter_incompleted = excluded.filter_incompleted,
    active_sort_column = excluded.active_sort_column,
    active_sort_direction = excluded.active_sort_direction,
    completed_from = excluded.completed_from,
    completed_to = excluded.completed_to,
    filter_wip = excluded.filter_wip,
    filter_non_wip = excluded.filter_non_wip,
    planned = excluded.planned,
    non_planned = excluded.non_planned,
    tags = excluded.tags,
    search_text = excluded.search_text,
    enable_limit = excluded.enable_limit,
    limit_count = excluded.limit_count";

fn write_date(date: Option<NaiveDate>) -> String {
    date.as_ref()
        .map(model::format_date)
        .unwrap_or_else(|| UNBOUNDED_DATE.to_string())
}

// Columns added by migrations are NULL in rows written before them.
fn read_date(column: &str, value: Option<String>) -> Result<Option<NaiveDate>> {
    match value.as_deref() {
        None | Some("") | Some(UNBOUNDED_DATE) => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Some)
            .map_err(|e| StoreError::corruption(column, s, e)),
    }
}

fn read_tags(value: Option<String>) -> Result<Vec<TaskTag>> {
    match value.as_deref() {
        None | Some("") => Ok(Vec::new()),
        Some(s) => serde_json::from_str(s).map_err(|e| StoreError::corruption("tags", s, e)),
    }
}

fn read_settings_row(row: &Row) -> Result<Settings> {
    let flag = |idx: usize| -> rusqlite::Result<bool> {
        Ok(row.get::<_, Option<bool>>(idx)?.unwrap_or(false))
    };

    let sort_column = row.get::<_, Option<i64>>(3)?.unwrap_or(0);
    let sort_direction = row.get::<_, Option<i64>>(4)?.unwrap_or(0);
    let limit_count = row.get::<_, Option<i64>>(14)?;

    let tasks_query = TasksQuery {
        filter_completed: flag(1)?,
        filter_incompleted: flag(2)?,
        sort_column: SortColumn::from_ordinal(sort_column).ok_or_else(|| {
            StoreError::corruption("active_sort_column", sort_column.to_string(), "unknown ordinal")
        })?,
        sort_direction: SortDirection::from_ordinal(sort_direction).ok_or_else(|| {
            StoreError::corruption(
                "active_sort_direction",
                sort_direction.to_string(),
                "unknown ordinal",
            )
        })?,
        completed_from: read_date("completed_from", row.get(5)?)?,
        completed_to: read_date("completed_to", row.get(6)?)?,
        filter_wip: flag(7)?,
        filter_non_wip: flag(8)?,
        planned: flag(9)?,
        non_planned: flag(10)?,
        tags: read_tags(row.get(11)?)?,
        search_text: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
        enable_limit: row.get::<_, Option<bool>>(13)?.unwrap_or(true),
        limit_count: match limit_count {
            None => DEFAULT_LIMIT_COUNT,
            Some(n) => u32::try_from(n)
                .map_err(|e| StoreError::corruption("limit_count", n.to_string(), e))?,
        },
    };

    Ok(Settings {
        id: row.get(0)?,
        tasks_query,
    })
}

pub fn find(conn: &Connection, id: &str) -> Result<Settings> {
    let sql = format!("SELECT {SETTINGS_COLUMNS} FROM settings WHERE id = ?1");
    let found = conn
        .query_row(&sql, [id], |row| Ok(read_settings_row(row)))
        .optional()?;
    match found {
        Some(settings) => settings,
        None => Err(StoreError::not_found("settings", id)),
    }
}

pub fn save(conn: &Connection, s: &Settings) -> Result<()> {
    let q = &s.tasks_query;
    let tags = serde_json::to_string(&q.tags)?;
    conn.execute(
        UPSERT,
        params![
            s.id,
            q.filter_completed,
            q.filter_incompleted,
            q.sort_column.ordinal(),
            q.sort_direction.ordinal(),
            write_date(q.completed_from),
            write_date(q.completed_to),
            q.filter_wip,
            q.filter_non_wip,
            q.planned,
            q.non_planned,
            tags,
            q.search_text,
            q.enable_limit,
            i64::from(q.limit_count),
        ],
    )?;
    Ok(())
}
