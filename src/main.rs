mod cli;
mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use priotasks::model::DATE_FORMAT;
use priotasks::{
    store, Backend, Cost, Fun, Impact, PreparedQuery, Priority, SortColumn, Task, TaskService,
    TaskTag,
};

use cli::{Cli, Command, TagCommand, TaskFields};

fn default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join("priotasks").join("db.sqlite"))
}

fn resolve_db_path(cli_db: Option<String>) -> Result<PathBuf> {
    match cli_db {
        Some(p) => Ok(PathBuf::from(p)),
        None => default_db_path(),
    }
}

fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

// Only warnings and errors by default; routine store events stay at info.
fn default_log_filter(debug: bool) -> &'static str {
    if debug {
        "priotasks=debug"
    } else {
        "priotasks=warn"
    }
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(debug)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_service(db_path: &Path) -> Result<TaskService> {
    ensure_db_dir(db_path)?;
    let store = store::open(Backend::Sqlite, db_path)
        .with_context(|| format!("failed to open store at {}", db_path.display()))?;
    let service = TaskService::new(Arc::from(store));
    service.init().context("failed to run data migrations")?;
    Ok(service)
}

fn parse_date(s: &str) -> Result<Option<NaiveDate>> {
    if s.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT)
        .with_context(|| format!("invalid date '{s}': expected YYYY-MM-DD"))?;
    Ok(Some(date))
}

fn to_tags(tags: Vec<String>) -> Vec<TaskTag> {
    tags.into_iter()
        .map(|t| TaskTag::from(t.trim()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Overlay the attributes given on the command line onto `task`.
fn apply_fields(mut task: Task, fields: TaskFields) -> Result<Task> {
    if let Some(title) = fields.title {
        task.title = title;
    }
    if let Some(p) = fields.priority {
        task.priority = p.parse::<Priority>()?;
    }
    if let Some(i) = fields.impact {
        task.impact = i.parse::<Impact>()?;
    }
    if let Some(c) = fields.cost {
        task.cost = c.parse::<Cost>()?;
    }
    if let Some(f) = fields.fun {
        task.fun = f.parse::<Fun>()?;
    }
    if let Some(wip) = fields.wip {
        task.wip = wip;
    }
    if let Some(planned) = fields.planned {
        task.planned = planned;
    }
    if !fields.tags.is_empty() {
        task.tags = to_tags(fields.tags);
    }
    Ok(task)
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let db_path = resolve_db_path(cli.db)?;
    let svc = open_service(&db_path)?;

    match cli.command {
        Command::Add { content, fields } => {
            let task = apply_fields(Task::new(content), fields)?;
            let task = svc.save_new_task(task)?;
            println!("{}", task.id);
            eprintln!("Added task '{}'", task.title);
        }

        Command::Edit {
            id,
            content,
            fields,
            clear_tags,
        } => {
            let current = svc.find_task(&id)?;
            let title_was_derived = fields.title.is_none() && content.is_some();
            let mut change = apply_fields(current, fields)?;
            if let Some(content) = content {
                change.content = content;
            }
            if title_was_derived {
                change.title.clear();
            }
            if clear_tags {
                change.tags.clear();
            }
            let task = svc.update_task(change)?;
            eprintln!("Updated task '{}'", task.title);
        }

        Command::Done { id } => {
            let task = svc.flip_task(&id)?;
            if task.is_completed() {
                eprintln!("Completed '{}'", task.title);
            } else {
                eprintln!("Reopened '{}'", task.title);
            }
        }

        Command::Clone { id } => {
            let task = svc.clone_task(&id)?;
            println!("{}", task.id);
            eprintln!("Created '{}'", task.title);
        }

        Command::Rm { id } => {
            svc.delete_task(&id)?;
            eprintln!("Removed task '{id}'");
        }

        Command::Purge { yes } => {
            if !yes {
                bail!("refusing to delete every task without --yes");
            }
            svc.delete_all_tasks()?;
            eprintln!("Removed all tasks");
        }

        Command::Show { id, json } => {
            let task = svc.find_task(&id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                print!("{}", output::format_task_detail(&task));
            }
        }

        Command::List { json } => {
            let tasks = svc.visible_tasks()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                print!("{}", output::format_task_list(&tasks));
            }
        }

        Command::Tag { command } => match command {
            TagCommand::Add { id, tag } => {
                let mut tags = svc.find_task(&id)?.tags;
                tags.push(TaskTag::from(tag.as_str()));
                svc.update_task_tags(&id, &tags)?;
                eprintln!("Tagged '{id}' with '{tag}'");
            }
            TagCommand::Rm { id, tag } => {
                svc.store()
                    .remove_tag_from_task(&id, &TaskTag::from(tag.as_str()))?;
                eprintln!("Removed tag '{tag}' from '{id}'");
            }
            TagCommand::List => {
                for tag in svc.tags()? {
                    println!("{tag}");
                }
            }
            TagCommand::Delete { tag } => {
                svc.delete_tag(&TaskTag::from(tag.as_str()))?;
                eprintln!("Deleted tag '{tag}'");
            }
        },

        Command::Filter {
            hide_completed,
            hide_open,
            from,
            to,
            wip,
            non_wip,
            planned,
            non_planned,
            tags,
            clear_tags,
            search,
            limit,
        } => {
            let mut settings = svc.user_settings()?;
            let q = &mut settings.tasks_query;
            if let Some(v) = hide_completed {
                q.filter_completed = v;
            }
            if let Some(v) = hide_open {
                q.filter_incompleted = v;
            }
            if let Some(s) = from {
                q.completed_from = parse_date(&s)?;
            }
            if let Some(s) = to {
                q.completed_to = parse_date(&s)?;
            }
            if let Some(v) = wip {
                q.filter_wip = v;
            }
            if let Some(v) = non_wip {
                q.filter_non_wip = v;
            }
            if let Some(v) = planned {
                q.planned = v;
            }
            if let Some(v) = non_planned {
                q.non_planned = v;
            }
            if clear_tags {
                q.tags.clear();
            }
            for tag in to_tags(tags) {
                if !q.has_tag(&tag) {
                    q.tags.push(tag);
                }
            }
            if let Some(s) = search {
                q.search_text = s;
            }
            if let Some(n) = limit {
                q.enable_limit = n > 0;
                if n > 0 {
                    q.limit_count = n;
                }
            }
            svc.update_user_settings(&settings)?;
            print!("{}", output::format_settings(&settings));
        }

        Command::Sort { column } => {
            let column: SortColumn = column.parse()?;
            let settings = svc.toggle_sorting(column)?;
            print!("{}", output::format_settings(&settings));
        }

        Command::Preset { name } => {
            let prepared: PreparedQuery = name.parse()?;
            let settings = svc.apply_prepared_query(prepared)?;
            print!("{}", output::format_settings(&settings));
        }

        Command::Demote => {
            let changed = svc.reduce_priority_for_visible_tasks()?;
            eprintln!("Lowered priority of {changed} task(s)");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_by_default() {
        assert_eq!(default_log_filter(false), "priotasks=warn");
        assert_eq!(default_log_filter(true), "priotasks=debug");
    }

    #[test]
    fn empty_date_clears() {
        assert_eq!(parse_date("").unwrap(), None);
        assert_eq!(
            parse_date("2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert!(parse_date("March").is_err());
    }
}
