use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection};

use crate::error::{Result, StoreError};
use crate::model::{self, TaskTag};

// Stay well below SQLITE_MAX_VARIABLE_NUMBER for batch lookups.
const BATCH_SIZE: usize = 500;

/// Add `tag` to the catalog. Saving an existing tag keeps its creation time.
pub fn save(conn: &Connection, tag: &TaskTag) -> Result<()> {
    conn.execute(
        "INSERT INTO tags (id, created) VALUES (?1, ?2) ON CONFLICT(id) DO NOTHING",
        params![tag.as_str(), model::format_time(&model::now())],
    )?;
    Ok(())
}

/// Remove `tag` from the catalog and from every task, atomically.
pub fn delete(conn: &mut Connection, tag: &TaskTag) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM TasksTags WHERE tag_id = ?1", [tag.as_str()])?;
    let n = tx.execute("DELETE FROM tags WHERE id = ?1", [tag.as_str()])?;
    if n == 0 {
        return Err(StoreError::not_found("tag", tag.as_str()));
    }
    tx.commit()?;
    Ok(())
}

pub fn all(conn: &Connection) -> Result<Vec<TaskTag>> {
    let mut stmt = conn.prepare("SELECT id FROM tags ORDER BY created DESC, rowid DESC")?;
    let tags = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .map(|r| r.map(TaskTag::from))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

/// Both the task and the tag must exist; a pair already present is a conflict.
pub fn add_to_task(conn: &Connection, task_id: &str, tag: &TaskTag) -> Result<()> {
    conn.execute(
        "INSERT INTO TasksTags (task_id, tag_id) VALUES (?1, ?2)",
        params![task_id, tag.as_str()],
    )?;
    Ok(())
}

pub fn remove_from_task(conn: &Connection, task_id: &str, tag: &TaskTag) -> Result<()> {
    let n = conn.execute(
        "DELETE FROM TasksTags WHERE task_id = ?1 AND tag_id = ?2",
        params![task_id, tag.as_str()],
    )?;
    if n == 0 {
        return Err(StoreError::not_found(
            "tag association",
            format!("{task_id}/{tag}"),
        ));
    }
    Ok(())
}

/// Tags of one task in the order they were attached. Unknown tasks have none.
pub fn for_task(conn: &Connection, task_id: &str) -> Result<Vec<TaskTag>> {
    let mut stmt =
        conn.prepare("SELECT tag_id FROM TasksTags WHERE task_id = ?1 ORDER BY rowid")?;
    let tags = stmt
        .query_map([task_id], |row| row.get::<_, String>(0))?
        .map(|r| r.map(TaskTag::from))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

/// Tags for many tasks with one query per batch of ids.
pub fn for_tasks(conn: &Connection, task_ids: &[String]) -> Result<HashMap<String, Vec<TaskTag>>> {
    let mut result: HashMap<String, Vec<TaskTag>> = HashMap::new();
    for chunk in task_ids.chunks(BATCH_SIZE) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "SELECT task_id, tag_id FROM TasksTags WHERE task_id IN ({placeholders}) ORDER BY rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            let task_id: String = row.get(0)?;
            let tag: String = row.get(1)?;
            result.entry(task_id).or_default().push(TaskTag::from(tag));
        }
    }
    Ok(result)
}
