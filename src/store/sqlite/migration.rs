use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::Result;
use crate::model;

const LEDGER_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS migration (
    id   TEXT PRIMARY KEY,
    time TEXT NOT NULL
);
";

// The first release of the schema. Everything after it is a migration.
const BASE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id        TEXT PRIMARY KEY,
    title     TEXT NOT NULL DEFAULT '',
    content   TEXT NOT NULL DEFAULT '',
    created   TEXT NOT NULL,
    updated   TEXT NOT NULL,
    completed TEXT NOT NULL,
    priority  INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS settings (
    id                    TEXT PRIMARY KEY,
    filter_completed      BOOLEAN,
    active_sort_column    INTEGER,
    active_sort_direction INTEGER
);
";

/// One additive schema change, applied at most once per database.
pub struct Migration {
    pub id: &'static str,
    /// `(table, column)` this migration adds. Databases that predate the
    /// ledger may already have it, in which case only the ledger row is written.
    pub adds_column: Option<(&'static str, &'static str)>,
    pub sql: &'static str,
}

const fn add_column(
    id: &'static str,
    table: &'static str,
    column: &'static str,
    sql: &'static str,
) -> Migration {
    Migration {
        id,
        adds_column: Some((table, column)),
        sql,
    }
}

pub const MIGRATIONS: &[Migration] = &[
    add_column(
        "tasks_table_add_wip_column",
        "tasks",
        "wip",
        "ALTER TABLE tasks ADD COLUMN wip BOOLEAN NOT NULL DEFAULT 0",
    ),
    add_column(
        "tasks_table_add_planned_column",
        "tasks",
        "planned",
        "ALTER TABLE tasks ADD COLUMN planned BOOLEAN NOT NULL DEFAULT 0",
    ),
    add_column(
        "tasks_table_add_impact_column",
        "tasks",
        "impact",
        "ALTER TABLE tasks ADD COLUMN impact INTEGER NOT NULL DEFAULT 2",
    ),
    add_column(
        "tasks_table_add_cost_column",
        "tasks",
        "cost",
        "ALTER TABLE tasks ADD COLUMN cost INTEGER NOT NULL DEFAULT 2",
    ),
    add_column(
        "task_table_add_value_column",
        "tasks",
        "value",
        "ALTER TABLE tasks ADD COLUMN value REAL NOT NULL DEFAULT 0",
    ),
    add_column(
        "tasks_table_add_fun_column",
        "tasks",
        "fun",
        "ALTER TABLE tasks ADD COLUMN fun INTEGER NOT NULL DEFAULT 1",
    ),
    Migration {
        id: "add_tags_support",
        adds_column: None,
        sql: "
CREATE TABLE IF NOT EXISTS tags (
    id      TEXT PRIMARY KEY,
    created TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS TasksTags (
    task_id TEXT NOT NULL REFERENCES tasks(id),
    tag_id  TEXT NOT NULL REFERENCES tags(id),
    PRIMARY KEY (task_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_tasks_tags_tag ON TasksTags(tag_id);
",
    },
    add_column(
        "settings_table_add_completed_from_column",
        "settings",
        "completed_from",
        "ALTER TABLE settings ADD COLUMN completed_from TEXT DEFAULT '0001-01-01'",
    ),
    add_column(
        "settings_table_add_completed_to_column",
        "settings",
        "completed_to",
        "ALTER TABLE settings ADD COLUMN completed_to TEXT DEFAULT '0001-01-01'",
    ),
    add_column(
        "settings_table_add_filter_incompleted_column",
        "settings",
        "filter_incompleted",
        "ALTER TABLE settings ADD COLUMN filter_incompleted BOOLEAN DEFAULT 0",
    ),
    add_column(
        "settings_table_add_filter_wip_column",
        "settings",
        "filter_wip",
        "ALTER TABLE settings ADD COLUMN filter_wip BOOLEAN DEFAULT 0",
    ),
    add_column(
        "settings_table_add_filter_non_wip_column",
        "settings",
        "filter_non_wip",
        "ALTER TABLE settings ADD COLUMN filter_non_wip BOOLEAN DEFAULT 0",
    ),
    add_column(
        "settings_table_add_planned_column",
        "settings",
        "planned",
        "ALTER TABLE settings ADD COLUMN planned BOOLEAN DEFAULT 0",
    ),
    add_column(
        "settings_table_add_non_planned_column",
        "settings",
        "non_planned",
        "ALTER TABLE settings ADD COLUMN non_planned BOOLEAN DEFAULT 0",
    ),
    add_column(
        "settings_table_add_tags_column",
        "settings",
        "tags",
        "ALTER TABLE settings ADD COLUMN tags TEXT DEFAULT '[]'",
    ),
    add_column(
        "settings_table_add_search_text_column",
        "settings",
        "search_text",
        "ALTER TABLE settings ADD COLUMN search_text TEXT DEFAULT ''",
    ),
    add_column(
        "settings_table_add_enable_limit_column",
        "settings",
        "enable_limit",
        "ALTER TABLE settings ADD COLUMN enable_limit BOOLEAN DEFAULT 1",
    ),
    add_column(
        "settings_table_add_limit_count_column",
        "settings",
        "limit_count",
        "ALTER TABLE settings ADD COLUMN limit_count INTEGER DEFAULT 10",
    ),
];

/// Bring the schema up to date. Returns how many migrations were recorded.
///
/// Each migration checks the ledger, runs its body and writes its ledger row
/// inside one transaction, so an interrupted migration is never marked done.
pub fn migrate(conn: &mut Connection) -> Result<usize> {
    conn.execute_batch(LEDGER_SCHEMA)?;
    conn.execute_batch(BASE_SCHEMA)?;

    let mut applied = 0;
    for m in MIGRATIONS {
        let tx = conn.transaction()?;
        if migration_exists(&tx, m.id)? {
            continue;
        }
        let present = match m.adds_column {
            Some((table, column)) => column_exists(&tx, table, column)?,
            None => false,
        };
        if present {
            debug!(migration = m.id, "column already present, recording only");
        } else {
            tx.execute_batch(m.sql)?;
        }
        record_migration(&tx, m.id)?;
        tx.commit()?;
        info!(migration = m.id, "applied migration");
        applied += 1;
    }
    Ok(applied)
}

pub fn migration_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM migration WHERE id = ?1", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Insert a ledger row. A duplicate id is a `Conflict`.
pub fn record_migration(conn: &Connection, id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO migration (id, time) VALUES (?1, ?2)",
        rusqlite::params![id, model::format_time(&model::now())],
    )?;
    Ok(())
}

pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let mut rows = stmt.query([table])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
