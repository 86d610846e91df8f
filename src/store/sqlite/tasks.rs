use chrono::NaiveDateTime;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use crate::error::{Result, StoreError};
use crate::model::{Cost, Fun, Impact, Priority, Task, NOT_COMPLETED, TIME_FORMAT};
use crate::query::{QueryPlan, TasksQuery};
use crate::score::calculate_value;

use super::sql::{self, TASK_COLUMNS};

const UPSERT: &str = "
INSERT INTO tasks (id, title, content, created, updated, completed, priority, wip, planned, impact, cost, value, fun)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    content = excluded.content,
    created = excluded.created,
    updated = excluded.updated,
    completed = excluded.completed,
    priority = excluded.priority,
    wip = excluded.wip,
    planned = excluded.planned,
    impact = excluded.impact,
    cost = excluded.cost,
    value = excluded.value,
    fun = excluded.fun";

fn parse_time(column: &str, value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|e| StoreError::corruption(column, value, e))
}

fn parse_completed(value: &str) -> Result<Option<NaiveDateTime>> {
    if value == NOT_COMPLETED {
        return Ok(None);
    }
    parse_time("completed", value).map(Some)
}

fn completed_column(task: &Task) -> String {
    task.completed
        .as_ref()
        .map(crate::model::format_time)
        .unwrap_or_else(|| NOT_COMPLETED.to_string())
}

fn ordinal<T>(row: &Row, idx: usize, column: &str, from: fn(i64) -> Option<T>) -> Result<T> {
    let n: i64 = row.get(idx)?;
    from(n).ok_or_else(|| StoreError::corruption(column, n.to_string(), "unknown ordinal"))
}

fn read_task_row(row: &Row) -> Result<Task> {
    let created: String = row.get(3)?;
    let updated: String = row.get(4)?;
    let completed: String = row.get(5)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created: parse_time("created", &created)?,
        updated: parse_time("updated", &updated)?,
        completed: parse_completed(&completed)?,
        priority: ordinal(row, 6, "priority", Priority::from_ordinal)?,
        wip: row.get(7)?,
        planned: row.get(8)?,
        impact: ordinal(row, 9, "impact", Impact::from_ordinal)?,
        cost: ordinal(row, 10, "cost", Cost::from_ordinal)?,
        value: row.get(11)?,
        fun: ordinal(row, 12, "fun", Fun::from_ordinal)?,
        tags: Vec::new(),
    })
}

fn collect(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(read_task_row(row)?);
    }
    Ok(tasks)
}

pub fn all(conn: &Connection) -> Result<Vec<Task>> {
    collect(conn, &format!("SELECT {TASK_COLUMNS} FROM tasks"), [])
}

pub fn find(conn: &Connection, id: &str) -> Result<Task> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let found = stmt
        .query_row([id], |row| Ok(read_task_row(row)))
        .optional()?;
    match found {
        Some(task) => task,
        None => Err(StoreError::not_found("task", id)),
    }
}

pub fn find_by_query(conn: &Connection, query: &TasksQuery) -> Result<Vec<Task>> {
    let rendered = sql::render(&QueryPlan::compile(query));
    collect(conn, &rendered.sql, params_from_iter(rendered.params.iter()))
}

pub fn save(conn: &Connection, task: &Task) -> Result<Task> {
    let mut saved = task.clone();
    saved.value = calculate_value(task);
    conn.execute(
        UPSERT,
        rusqlite::params![
            saved.id,
            saved.title,
            saved.content,
            crate::model::format_time(&saved.created),
            crate::model::format_time(&saved.updated),
            completed_column(&saved),
            saved.priority.ordinal(),
            saved.wip,
            saved.planned,
            saved.impact.ordinal(),
            saved.cost.ordinal(),
            saved.value,
            saved.fun.ordinal(),
        ],
    )?;
    Ok(saved)
}

/// Delete the task row and its tag associations in one transaction.
pub fn delete(conn: &mut Connection, id: &str) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM TasksTags WHERE task_id = ?1", [id])?;
    let n = tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
    if n == 0 {
        return Err(StoreError::not_found("task", id));
    }
    tx.commit()?;
    Ok(())
}

pub fn delete_all(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM TasksTags", [])?;
    tx.execute("DELETE FROM tasks", [])?;
    tx.commit()?;
    Ok(())
}
