use rusqlite::types::Value;
use tracing::debug;

use crate::model::{self, NOT_COMPLETED};
use crate::query::{Predicate, QueryPlan, SortColumn};

pub const TASK_COLUMNS: &str =
    "id, title, content, created, updated, completed, priority, wip, planned, impact, cost, value, fun";

/// SQL text with positional `?` placeholders and the values bound to them,
/// in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

fn column(sort: SortColumn) -> &'static str {
    match sort {
        SortColumn::Undefined | SortColumn::Created => "created",
        SortColumn::Completed => "completed",
        SortColumn::Priority => "priority",
        SortColumn::Impact => "impact",
        SortColumn::Wip => "wip",
        SortColumn::Planned => "planned",
        SortColumn::Cost => "cost",
        SortColumn::Value => "value",
        SortColumn::Fun => "fun",
    }
}

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn text(s: impl Into<String>) -> Value {
    Value::Text(s.into())
}

fn clause(predicate: &Predicate, params: &mut Vec<Value>) -> String {
    match predicate {
        Predicate::NotCompleted => {
            params.push(text(NOT_COMPLETED));
            "completed = ?".into()
        }
        Predicate::IsCompleted => {
            params.push(text(NOT_COMPLETED));
            "completed != ?".into()
        }
        Predicate::CompletedSince(from) => {
            params.push(text(model::format_time(from)));
            params.push(text(NOT_COMPLETED));
            "(completed >= ? OR completed = ?)".into()
        }
        Predicate::CompletedBefore(to) => {
            params.push(text(model::format_time(to)));
            params.push(text(NOT_COMPLETED));
            "(completed < ? OR completed = ?)".into()
        }
        Predicate::Wip(wip) => {
            params.push(Value::Integer(i64::from(*wip)));
            "wip = ?".into()
        }
        Predicate::Planned(planned) => {
            params.push(Value::Integer(i64::from(*planned)));
            "planned = ?".into()
        }
        Predicate::AnyTag(tags) => {
            params.extend(tags.iter().map(|t| text(t.as_str())));
            let placeholders = vec!["?"; tags.len()].join(", ");
            format!("id IN (SELECT task_id FROM TasksTags WHERE tag_id IN ({placeholders}))")
        }
        Predicate::TextContains(needle) => {
            let pattern = escape_like(needle);
            params.push(text(pattern.clone()));
            params.push(text(pattern));
            "(title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\')".into()
        }
    }
}

/// Render a plan as a `SELECT` over the tasks table.
pub fn render(plan: &QueryPlan) -> SqlQuery {
    let mut params = Vec::new();
    let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks");

    let clauses: Vec<String> = plan
        .predicates
        .iter()
        .map(|p| clause(p, &mut params))
        .collect();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    let direction = if plan.order.descending { "DESC" } else { "ASC" };
    sql.push_str(&format!(
        " ORDER BY {} {direction}, id ASC",
        column(plan.order.column)
    ));

    if let Some(limit) = plan.limit {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(i64::from(limit)));
    }

    debug!(sql = %sql, params = params.len(), "compiled task query");
    SqlQuery { sql, params }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskTag;
    use crate::query::{SortDirection, TasksQuery};
    use chrono::NaiveDate;

    fn render_query(q: &TasksQuery) -> SqlQuery {
        render(&QueryPlan::compile(q))
    }

    #[test]
    fn empty_query_orders_by_created() {
        let q = render_query(&TasksQuery::default());
        assert_eq!(
            q.sql,
            format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created ASC, id ASC")
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn hide_completed_binds_sentinel() {
        let q = render_query(&TasksQuery {
            filter_completed: true,
            sort_column: SortColumn::Priority,
            sort_direction: SortDirection::Desc,
            ..TasksQuery::default()
        });
        assert!(q.sql.contains(" WHERE completed = ? ORDER BY priority DESC, id ASC"));
        assert_eq!(q.params, vec![Value::Text(NOT_COMPLETED.into())]);
    }

    #[test]
    fn range_tags_and_limit() {
        let q = render_query(&TasksQuery {
            completed_from: NaiveDate::from_ymd_opt(2024, 5, 1),
            tags: vec![TaskTag::from("a"), TaskTag::from("b")],
            enable_limit: true,
            limit_count: 7,
            ..TasksQuery::default()
        });
        assert!(q.sql.contains(
            "WHERE (completed >= ? OR completed = ?) AND id IN (SELECT task_id FROM TasksTags WHERE tag_id IN (?, ?))"
        ));
        assert!(q.sql.ends_with(" LIMIT ?"));
        assert_eq!(
            q.params,
            vec![
                Value::Text("2024-05-01 00:00:00".into()),
                Value::Text(NOT_COMPLETED.into()),
                Value::Text("a".into()),
                Value::Text("b".into()),
                Value::Integer(7),
            ]
        );
    }

    #[test]
    fn placeholders_match_params() {
        let q = render_query(&TasksQuery {
            filter_incompleted: true,
            completed_from: NaiveDate::from_ymd_opt(2024, 5, 1),
            completed_to: NaiveDate::from_ymd_opt(2024, 6, 1),
            filter_wip: true,
            non_planned: true,
            tags: vec![TaskTag::from("x")],
            search_text: "abc".into(),
            enable_limit: true,
            limit_count: 3,
            ..TasksQuery::default()
        });
        assert_eq!(q.sql.matches('?').count(), q.params.len());
    }

    #[test]
    fn search_text_is_bound_not_inlined() {
        let q = render_query(&TasksQuery {
            search_text: "50%_off' OR 1=1 --".into(),
            ..TasksQuery::default()
        });
        assert!(!q.sql.contains("OR 1=1"));
        assert_eq!(
            q.params[0],
            Value::Text("%50\\%\\_off' OR 1=1 --%".into())
        );
    }
}
