use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::model::{self, Task, TaskTag};

/// Days back from today that the default view shows completed tasks for.
pub const DEFAULT_COMPLETED_WINDOW_DAYS: u64 = 14;
pub const DEFAULT_LIMIT_COUNT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortColumn {
    #[default]
    Undefined,
    Completed,
    Created,
    Priority,
    Impact,
    Wip,
    Planned,
    Cost,
    Value,
    Fun,
}

impl SortColumn {
    pub const ALL: [SortColumn; 10] = [
        Self::Undefined,
        Self::Completed,
        Self::Created,
        Self::Priority,
        Self::Impact,
        Self::Wip,
        Self::Planned,
        Self::Cost,
        Self::Value,
        Self::Fun,
    ];

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(n: i64) -> Option<Self> {
        Self::ALL.get(usize::try_from(n).ok()?).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Completed => "completed",
            Self::Created => "created",
            Self::Priority => "priority",
            Self::Impact => "impact",
            Self::Wip => "wip",
            Self::Planned => "planned",
            Self::Cost => "cost",
            Self::Value => "value",
            Self::Fun => "fun",
        }
    }

    /// The column rows are actually ordered by. Undefined falls back to Created.
    pub fn resolve(self) -> SortColumn {
        match self {
            Self::Undefined => Self::Created,
            other => other,
        }
    }
}

impl FromStr for SortColumn {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                ParseError::new(
                    "sort column",
                    s,
                    "completed, created, priority, impact, wip, planned, cost, value, fun",
                )
            })
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Undefined,
    Desc,
    Asc,
}

impl SortDirection {
    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(n: i64) -> Option<Self> {
        match n {
            0 => Some(Self::Undefined),
            1 => Some(Self::Desc),
            2 => Some(Self::Asc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Desc => "desc",
            Self::Asc => "asc",
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Self::Desc => Self::Asc,
            Self::Asc | Self::Undefined => Self::Desc,
        }
    }

    pub fn is_desc(self) -> bool {
        self == Self::Desc
    }
}

impl FromStr for SortDirection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desc" => Ok(Self::Desc),
            "asc" => Ok(Self::Asc),
            _ => Err(ParseError::new("sort direction", s, "asc, desc")),
        }
    }
}

/// The active filter and sort selection.
///
/// `filter_completed` hides completed tasks and `filter_incompleted` hides
/// open ones. Both may be set at once, which matches nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TasksQuery {
    pub filter_completed: bool,
    pub filter_incompleted: bool,
    /// `None` leaves that side of the range unbounded.
    pub completed_from: Option<NaiveDate>,
    pub completed_to: Option<NaiveDate>,
    pub filter_wip: bool,
    pub filter_non_wip: bool,
    pub planned: bool,
    pub non_planned: bool,
    /// A task matches when it carries any of these.
    pub tags: Vec<TaskTag>,
    pub search_text: String,
    pub sort_column: SortColumn,
    pub sort_direction: SortDirection,
    pub enable_limit: bool,
    pub limit_count: u32,
}

impl TasksQuery {
    pub fn reset(&mut self) {
        self.reset_at(model::today());
    }

    /// Restore the default view relative to `today`.
    pub fn reset_at(&mut self, today: NaiveDate) {
        *self = TasksQuery {
            filter_completed: true,
            completed_from: today.checked_sub_days(Days::new(DEFAULT_COMPLETED_WINDOW_DAYS)),
            sort_column: SortColumn::Priority,
            sort_direction: SortDirection::Desc,
            limit_count: self.limit_count,
            ..TasksQuery::default()
        };
    }

    pub fn has_tag(&self, tag: &TaskTag) -> bool {
        self.tags.contains(tag)
    }

    /// Drop `tag` from the filter; returns whether it was present.
    pub fn remove_tag(&mut self, tag: &TaskTag) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }
}

/// Named canned filters, applied on top of a reset query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparedQuery {
    Reset,
    CompletedToday,
    CompletedYesterday,
    CompletedThisWeek,
    CompletedLastWeek,
    CompletedLastTwoWeeks,
}

impl PreparedQuery {
    pub const ALL: [PreparedQuery; 6] = [
        Self::Reset,
        Self::CompletedToday,
        Self::CompletedYesterday,
        Self::CompletedThisWeek,
        Self::CompletedLastWeek,
        Self::CompletedLastTwoWeeks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Reset => "prepared-query-clear",
            Self::CompletedToday => "prepared-query-completed-today",
            Self::CompletedYesterday => "prepared-query-completed-yesterday",
            Self::CompletedThisWeek => "prepared-query-completed-this-week",
            Self::CompletedLastWeek => "prepared-query-completed-last-week",
            Self::CompletedLastTwoWeeks => "prepared-query-completed-last-two-weeks",
        }
    }

    /// Accepts the full name or the part after `prepared-query-`.
    pub fn from_name(name: &str) -> Option<Self> {
        let short = name.strip_prefix("prepared-query-").unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|p| p.name().trim_start_matches("prepared-query-") == short)
    }

    pub fn apply(self, query: &mut TasksQuery, today: NaiveDate) {
        query.reset_at(today);
        let (from, to) = match self {
            Self::Reset => return,
            Self::CompletedToday => (Some(today), today.succ_opt()),
            Self::CompletedYesterday => (today.pred_opt(), Some(today)),
            Self::CompletedThisWeek => {
                let monday = week_start(today);
                (Some(monday), monday.checked_add_days(Days::new(7)))
            }
            Self::CompletedLastWeek => {
                let monday = week_start(today);
                (monday.checked_sub_days(Days::new(7)), Some(monday))
            }
            Self::CompletedLastTwoWeeks => (
                today.checked_sub_days(Days::new(DEFAULT_COMPLETED_WINDOW_DAYS)),
                None,
            ),
        };
        query.completed_from = from;
        query.completed_to = to;
        query.filter_completed = false;
        query.filter_incompleted = true;
        query.sort_column = SortColumn::Completed;
        query.sort_direction = SortDirection::Desc;
    }
}

impl FromStr for PreparedQuery {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            ParseError::new(
                "prepared query",
                s,
                "clear, completed-today, completed-yesterday, completed-this-week, completed-last-week, completed-last-two-weeks",
            )
        })
    }
}

fn week_start(day: NaiveDate) -> NaiveDate {
    let back = u64::from(day.weekday().num_days_from_monday());
    day.checked_sub_days(Days::new(back)).unwrap_or(day)
}

fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// One conjunct of a compiled query.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    NotCompleted,
    IsCompleted,
    /// Completed at or after the instant, or not completed at all.
    CompletedSince(NaiveDateTime),
    /// Completed strictly before the instant, or not completed at all.
    CompletedBefore(NaiveDateTime),
    Wip(bool),
    Planned(bool),
    AnyTag(Vec<TaskTag>),
    /// ASCII case-insensitive substring of the title or the content.
    TextContains(String),
}

impl Predicate {
    pub fn matches(&self, task: &Task, tags: &[TaskTag]) -> bool {
        match self {
            Self::NotCompleted => task.completed.is_none(),
            Self::IsCompleted => task.completed.is_some(),
            Self::CompletedSince(from) => task.completed.map_or(true, |c| c >= *from),
            Self::CompletedBefore(to) => task.completed.map_or(true, |c| c < *to),
            Self::Wip(wip) => task.wip == *wip,
            Self::Planned(planned) => task.planned == *planned,
            Self::AnyTag(wanted) => tags.iter().any(|t| wanted.contains(t)),
            Self::TextContains(needle) => {
                contains_ignore_ascii_case(&task.title, needle)
                    || contains_ignore_ascii_case(&task.content, needle)
            }
        }
    }
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: SortColumn,
    pub descending: bool,
}

impl Order {
    /// Requested column order with ties broken by id ascending.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let primary = match self.column {
            SortColumn::Undefined | SortColumn::Created => a.created.cmp(&b.created),
            SortColumn::Completed => a.completed.cmp(&b.completed),
            SortColumn::Priority => a.priority.cmp(&b.priority),
            SortColumn::Impact => a.impact.cmp(&b.impact),
            SortColumn::Wip => a.wip.cmp(&b.wip),
            SortColumn::Planned => a.planned.cmp(&b.planned),
            SortColumn::Cost => a.cost.cmp(&b.cost),
            SortColumn::Value => a.value.total_cmp(&b.value),
            SortColumn::Fun => a.fun.cmp(&b.fun),
        };
        let primary = if self.descending {
            primary.reverse()
        } else {
            primary
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// A `TasksQuery` lowered to a conjunction of predicates, an order and a limit.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub predicates: Vec<Predicate>,
    pub order: Order,
    pub limit: Option<u32>,
}

impl QueryPlan {
    pub fn compile(query: &TasksQuery) -> QueryPlan {
        let mut predicates = Vec::new();

        if query.filter_completed {
            predicates.push(Predicate::NotCompleted);
        } else {
            if let Some(from) = query.completed_from {
                predicates.push(Predicate::CompletedSince(midnight(from)));
            }
            if let Some(to) = query.completed_to {
                predicates.push(Predicate::CompletedBefore(midnight(to)));
            }
        }
        if query.filter_incompleted {
            predicates.push(Predicate::IsCompleted);
        }

        if query.filter_wip {
            predicates.push(Predicate::Wip(true));
        }
        if query.filter_non_wip {
            predicates.push(Predicate::Wip(false));
        }
        if query.planned {
            predicates.push(Predicate::Planned(true));
        }
        if query.non_planned {
            predicates.push(Predicate::Planned(false));
        }

        if !query.tags.is_empty() {
            predicates.push(Predicate::AnyTag(query.tags.clone()));
        }

        let search = query.search_text.trim();
        if !search.is_empty() {
            predicates.push(Predicate::TextContains(search.to_string()));
        }

        QueryPlan {
            predicates,
            order: Order {
                column: query.sort_column.resolve(),
                descending: query.sort_direction.is_desc(),
            },
            limit: query.enable_limit.then_some(query.limit_count),
        }
    }

    pub fn matches(&self, task: &Task, tags: &[TaskTag]) -> bool {
        self.predicates.iter().all(|p| p.matches(task, tags))
    }

    /// Filter, sort and cap `tasks` in memory. `tags` maps task ids to their
    /// associated tags; a missing entry means no tags.
    pub fn select(&self, tasks: Vec<Task>, tags: &HashMap<String, Vec<TaskTag>>) -> Vec<Task> {
        let mut selected: Vec<Task> = tasks
            .into_iter()
            .filter(|t| {
                let task_tags = tags.get(&t.id).map(Vec::as_slice).unwrap_or_default();
                self.matches(t, task_tags)
            })
            .collect();
        selected.sort_by(|a, b| self.order.compare(a, b));
        if let Some(limit) = self.limit {
            selected.truncate(limit as usize);
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cost, Priority};
    use crate::score::calculate_value;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        day(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn task(id: &str) -> Task {
        Task {
            id: id.into(),
            title: id.into(),
            ..Task::default()
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn reset_restores_default_view() {
        let mut q = TasksQuery {
            filter_completed: false,
            filter_incompleted: true,
            completed_to: Some(day(2024, 1, 1)),
            filter_wip: true,
            planned: true,
            tags: vec![TaskTag::from("x")],
            search_text: "foo".into(),
            sort_column: SortColumn::Fun,
            sort_direction: SortDirection::Asc,
            enable_limit: true,
            limit_count: 25,
            ..TasksQuery::default()
        };
        q.reset_at(day(2024, 6, 20));
        assert!(q.filter_completed);
        assert!(!q.filter_incompleted);
        assert!(!q.filter_wip && !q.filter_non_wip && !q.planned && !q.non_planned);
        assert!(!q.enable_limit);
        assert_eq!(q.limit_count, 25);
        assert_eq!(q.completed_from, Some(day(2024, 6, 6)));
        assert_eq!(q.completed_to, None);
        assert_eq!(q.sort_column, SortColumn::Priority);
        assert_eq!(q.sort_direction, SortDirection::Desc);
        assert!(q.tags.is_empty());
        assert!(q.search_text.is_empty());
    }

    #[test]
    fn reset_uses_current_date() {
        let mut q = TasksQuery::default();
        q.reset();
        let expected = model::today() - Days::new(14);
        let from = q.completed_from.unwrap();
        assert!((from - expected).num_days().abs() <= 1);
    }

    #[test]
    fn prepared_today() {
        let mut q = TasksQuery::default();
        PreparedQuery::CompletedToday.apply(&mut q, day(2024, 6, 20));
        assert_eq!(q.completed_from, Some(day(2024, 6, 20)));
        assert_eq!(q.completed_to, Some(day(2024, 6, 21)));
        assert!(!q.filter_completed);
        assert!(q.filter_incompleted);
        assert_eq!(q.sort_column, SortColumn::Completed);
    }

    #[test]
    fn prepared_weeks_start_on_monday() {
        // 2024-06-20 is a Thursday
        let mut q = TasksQuery::default();
        PreparedQuery::CompletedThisWeek.apply(&mut q, day(2024, 6, 20));
        assert_eq!(q.completed_from, Some(day(2024, 6, 17)));
        assert_eq!(q.completed_to, Some(day(2024, 6, 24)));

        PreparedQuery::CompletedLastWeek.apply(&mut q, day(2024, 6, 20));
        assert_eq!(q.completed_from, Some(day(2024, 6, 10)));
        assert_eq!(q.completed_to, Some(day(2024, 6, 17)));

        // Sunday belongs to the week that started six days earlier
        PreparedQuery::CompletedThisWeek.apply(&mut q, day(2024, 6, 23));
        assert_eq!(q.completed_from, Some(day(2024, 6, 17)));
    }

    #[test]
    fn prepared_yesterday_and_two_weeks() {
        let mut q = TasksQuery::default();
        PreparedQuery::CompletedYesterday.apply(&mut q, day(2024, 3, 1));
        assert_eq!(q.completed_from, Some(day(2024, 2, 29)));
        assert_eq!(q.completed_to, Some(day(2024, 3, 1)));

        PreparedQuery::CompletedLastTwoWeeks.apply(&mut q, day(2024, 3, 1));
        assert_eq!(q.completed_from, Some(day(2024, 2, 16)));
        assert_eq!(q.completed_to, None);
    }

    #[test]
    fn prepared_reset_is_plain_reset() {
        let mut q = TasksQuery {
            filter_incompleted: true,
            ..TasksQuery::default()
        };
        PreparedQuery::Reset.apply(&mut q, day(2024, 3, 1));
        let mut expected = TasksQuery::default();
        expected.reset_at(day(2024, 3, 1));
        assert_eq!(q, expected);
    }

    #[test]
    fn prepared_names() {
        assert_eq!(
            PreparedQuery::from_name("prepared-query-completed-today"),
            Some(PreparedQuery::CompletedToday)
        );
        assert_eq!(
            PreparedQuery::from_name("completed-last-week"),
            Some(PreparedQuery::CompletedLastWeek)
        );
        assert_eq!(PreparedQuery::from_name("clear"), Some(PreparedQuery::Reset));
        assert!("tomorrow".parse::<PreparedQuery>().is_err());
    }

    #[test]
    fn compile_hide_completed_ignores_range() {
        let q = TasksQuery {
            filter_completed: true,
            completed_from: Some(day(2024, 1, 1)),
            completed_to: Some(day(2024, 2, 1)),
            ..TasksQuery::default()
        };
        let plan = QueryPlan::compile(&q);
        assert_eq!(plan.predicates, vec![Predicate::NotCompleted]);
    }

    #[test]
    fn compile_range_and_toggles() {
        let q = TasksQuery {
            completed_from: Some(day(2024, 1, 1)),
            completed_to: Some(day(2024, 2, 1)),
            filter_incompleted: true,
            filter_non_wip: true,
            planned: true,
            tags: vec![TaskTag::from("a"), TaskTag::from("b")],
            search_text: "  milk ".into(),
            sort_column: SortColumn::Value,
            sort_direction: SortDirection::Desc,
            enable_limit: true,
            limit_count: 5,
            ..TasksQuery::default()
        };
        let plan = QueryPlan::compile(&q);
        assert_eq!(
            plan.predicates,
            vec![
                Predicate::CompletedSince(at(2024, 1, 1, 0)),
                Predicate::CompletedBefore(at(2024, 2, 1, 0)),
                Predicate::IsCompleted,
                Predicate::Wip(false),
                Predicate::Planned(true),
                Predicate::AnyTag(vec![TaskTag::from("a"), TaskTag::from("b")]),
                Predicate::TextContains("milk".into()),
            ]
        );
        assert_eq!(
            plan.order,
            Order {
                column: SortColumn::Value,
                descending: true
            }
        );
        assert_eq!(plan.limit, Some(5));
    }

    #[test]
    fn undefined_sort_is_created_ascending() {
        let plan = QueryPlan::compile(&TasksQuery::default());
        assert!(plan.predicates.is_empty());
        assert_eq!(plan.order.column, SortColumn::Created);
        assert!(!plan.order.descending);
        assert_eq!(plan.limit, None);
    }

    #[test]
    fn range_never_excludes_open_tasks() {
        let open = task("open");
        let old = Task {
            completed: Some(at(2023, 12, 1, 10)),
            ..task("old")
        };
        let inside = Task {
            completed: Some(at(2024, 1, 15, 10)),
            ..task("inside")
        };
        let q = TasksQuery {
            completed_from: Some(day(2024, 1, 1)),
            completed_to: Some(day(2024, 2, 1)),
            ..TasksQuery::default()
        };
        let got = QueryPlan::compile(&q).select(vec![open, old, inside], &HashMap::new());
        assert_eq!(ids(&got), vec!["inside", "open"]);
    }

    #[test]
    fn adjacent_day_presets_do_not_overlap() {
        let today = day(2024, 3, 1);
        let at_midnight = Task {
            completed: Some(at(2024, 3, 1, 0)),
            ..task("midnight")
        };
        let late = Task {
            completed: Some(day(2024, 2, 29).and_hms_opt(23, 59, 59).unwrap()),
            ..task("late")
        };
        let run = |preset: PreparedQuery| {
            let mut q = TasksQuery::default();
            preset.apply(&mut q, today);
            let got = QueryPlan::compile(&q)
                .select(vec![at_midnight.clone(), late.clone()], &HashMap::new());
            ids(&got).into_iter().map(String::from).collect::<Vec<_>>()
        };
        assert_eq!(run(PreparedQuery::CompletedToday), vec!["midnight"]);
        assert_eq!(run(PreparedQuery::CompletedYesterday), vec!["late"]);
    }

    #[test]
    fn both_completion_toggles_match_nothing() {
        let done = Task {
            completed: Some(at(2024, 1, 1, 1)),
            ..task("done")
        };
        let q = TasksQuery {
            filter_completed: true,
            filter_incompleted: true,
            ..TasksQuery::default()
        };
        let got = QueryPlan::compile(&q).select(vec![task("open"), done], &HashMap::new());
        assert!(got.is_empty());
    }

    #[test]
    fn tag_filter_is_any_of() {
        let mut tags = HashMap::new();
        tags.insert("a".to_string(), vec![TaskTag::from("home")]);
        tags.insert(
            "b".to_string(),
            vec![TaskTag::from("work"), TaskTag::from("urgent")],
        );
        tags.insert("c".to_string(), vec![TaskTag::from("other")]);
        let q = TasksQuery {
            tags: vec![TaskTag::from("home"), TaskTag::from("work")],
            ..TasksQuery::default()
        };
        let got = QueryPlan::compile(&q).select(
            vec![task("a"), task("b"), task("c"), task("d")],
            &tags,
        );
        assert_eq!(ids(&got), vec!["a", "b"]);
    }

    #[test]
    fn text_search_is_case_insensitive() {
        let a = Task {
            content: "Buy MILK and eggs".into(),
            ..task("a")
        };
        let q = TasksQuery {
            search_text: "milk".into(),
            ..TasksQuery::default()
        };
        let got = QueryPlan::compile(&q).select(vec![a, task("b")], &HashMap::new());
        assert_eq!(ids(&got), vec!["a"]);
    }

    #[test]
    fn value_desc_puts_cheap_first() {
        let mut cheap = Task {
            cost: Cost::XS,
            ..task("cheap")
        };
        cheap.value = calculate_value(&cheap);
        let mut pricey = Task {
            cost: Cost::XXL,
            ..task("pricey")
        };
        pricey.value = calculate_value(&pricey);
        let q = TasksQuery {
            sort_column: SortColumn::Value,
            sort_direction: SortDirection::Desc,
            ..TasksQuery::default()
        };
        let got = QueryPlan::compile(&q).select(vec![pricey, cheap], &HashMap::new());
        assert_eq!(ids(&got), vec!["cheap", "pricey"]);
    }

    #[test]
    fn ties_break_by_id_and_limit_applies_after_sort() {
        let tasks = vec![
            Task {
                priority: Priority::Low,
                ..task("z")
            },
            Task {
                priority: Priority::High,
                ..task("c")
            },
            Task {
                priority: Priority::High,
                ..task("a")
            },
            Task {
                priority: Priority::Urgent,
                ..task("m")
            },
        ];
        let q = TasksQuery {
            sort_column: SortColumn::Priority,
            sort_direction: SortDirection::Desc,
            enable_limit: true,
            limit_count: 3,
            ..TasksQuery::default()
        };
        let got = QueryPlan::compile(&q).select(tasks, &HashMap::new());
        assert_eq!(ids(&got), vec!["m", "a", "c"]);
    }

    #[test]
    fn sort_direction_flip() {
        assert_eq!(SortDirection::Desc.flip(), SortDirection::Asc);
        assert_eq!(SortDirection::Asc.flip(), SortDirection::Desc);
        assert_eq!(SortDirection::Undefined.flip(), SortDirection::Desc);
    }

    #[test]
    fn remove_tag_from_query() {
        let mut q = TasksQuery {
            tags: vec![TaskTag::from("a"), TaskTag::from("b")],
            ..TasksQuery::default()
        };
        assert!(q.remove_tag(&TaskTag::from("a")));
        assert!(!q.remove_tag(&TaskTag::from("a")));
        assert_eq!(q.tags, vec![TaskTag::from("b")]);
    }
}
