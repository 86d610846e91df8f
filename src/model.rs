use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Persisted timestamp pattern. Lexicographic order equals chronological order.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Persisted date pattern used by saved filters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Stored in the `completed` column of tasks that are not completed.
pub const NOT_COMPLETED: &str = "0001-01-01 00:00:00";
/// Stored in settings date columns that have no bound.
pub const UNBOUNDED_DATE: &str = "0001-01-01";

pub const TITLE_MAX_LEN: usize = 64;
pub const CLONE_TITLE_PREFIX: &str = "Copy of ";

/// Current local time truncated to the precision the store persists.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn format_time(t: &NaiveDateTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

pub fn format_date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(n: i64) -> Option<Self> {
        Self::ALL.get(usize::try_from(n).ok()?).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Self::Urgent => 1.7,
            Self::High => 1.2,
            Self::Medium => 1.0,
            Self::Low => 0.8,
        }
    }

    /// One level lower; Low stays Low.
    pub fn reduce(self) -> Self {
        match self {
            Self::Urgent => Self::High,
            Self::High => Self::Medium,
            Self::Medium | Self::Low => Self::Low,
        }
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" | "0" => Ok(Self::Low),
            "medium" | "1" => Ok(Self::Medium),
            "high" | "2" => Ok(Self::High),
            "urgent" | "3" => Ok(Self::Urgent),
            _ => Err(ParseError::new("priority", s, "low, medium, high, urgent")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Impact {
    Slight,
    Low,
    #[default]
    Moderate,
    Considerable,
    High,
}

impl Impact {
    pub const ALL: [Impact; 5] = [
        Self::Slight,
        Self::Low,
        Self::Moderate,
        Self::Considerable,
        Self::High,
    ];

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(n: i64) -> Option<Self> {
        Self::ALL.get(usize::try_from(n).ok()?).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slight => "slight",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::Considerable => "considerable",
            Self::High => "high",
        }
    }
}

impl FromStr for Impact {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slight" | "0" => Ok(Self::Slight),
            "low" | "1" => Ok(Self::Low),
            "moderate" | "2" => Ok(Self::Moderate),
            "considerable" | "3" => Ok(Self::Considerable),
            "high" | "4" => Ok(Self::High),
            _ => Err(ParseError::new(
                "impact",
                s,
                "slight, low, moderate, considerable, high",
            )),
        }
    }
}

/// Effort estimate, from about ten minutes (XS) to a full day (XXL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Cost {
    XS,
    S,
    #[default]
    M,
    L,
    XL,
    XXL,
}

impl Cost {
    pub const ALL: [Cost; 6] = [Self::XS, Self::S, Self::M, Self::L, Self::XL, Self::XXL];

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(n: i64) -> Option<Self> {
        Self::ALL.get(usize::try_from(n).ok()?).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::XS => "xs",
            Self::S => "s",
            Self::M => "m",
            Self::L => "l",
            Self::XL => "xl",
            Self::XXL => "xxl",
        }
    }

    pub fn estimate(self) -> Duration {
        let minutes = match self {
            Self::XS => 10,
            Self::S => 30,
            Self::M => 60,
            Self::L => 120,
            Self::XL => 240,
            Self::XXL => 480,
        };
        Duration::from_secs(minutes * 60)
    }

    pub fn estimate_label(self) -> &'static str {
        match self {
            Self::XS => "~10m",
            Self::S => "~30m",
            Self::M => "~1h",
            Self::L => "~2h",
            Self::XL => "~4h",
            Self::XXL => "~8h",
        }
    }
}

impl FromStr for Cost {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xs" | "0" => Ok(Self::XS),
            "s" | "1" => Ok(Self::S),
            "m" | "2" => Ok(Self::M),
            "l" | "3" => Ok(Self::L),
            "xl" | "4" => Ok(Self::XL),
            "xxl" | "5" => Ok(Self::XXL),
            _ => Err(ParseError::new("cost", s, "xs, s, m, l, xl, xxl")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Fun {
    S,
    #[default]
    M,
    L,
    XL,
}

impl Fun {
    pub const ALL: [Fun; 4] = [Self::S, Self::M, Self::L, Self::XL];

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(n: i64) -> Option<Self> {
        Self::ALL.get(usize::try_from(n).ok()?).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::S => "s",
            Self::M => "m",
            Self::L => "l",
            Self::XL => "xl",
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Self::S => 0.75,
            Self::M => 1.0,
            Self::L => 1.25,
            Self::XL => 1.5,
        }
    }
}

impl FromStr for Fun {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "0" => Ok(Self::S),
            "m" | "1" => Ok(Self::M),
            "l" | "2" => Ok(Self::L),
            "xl" | "3" => Ok(Self::XL),
            _ => Err(ParseError::new("fun", s, "s, m, l, xl")),
        }
    }
}

/// A tag is identified by its own text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTag(String);

impl TaskTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TaskTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskTag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TaskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
    /// `None` until the task is completed.
    pub completed: Option<NaiveDateTime>,
    pub priority: Priority,
    pub impact: Impact,
    pub cost: Cost,
    pub fun: Fun,
    pub wip: bool,
    pub planned: bool,
    /// Derived from priority, impact, cost and fun on every save.
    pub value: f64,
    /// Loaded from the association table, never stored on the task row.
    #[serde(default)]
    pub tags: Vec<TaskTag>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            content: String::new(),
            created: NaiveDateTime::default(),
            updated: NaiveDateTime::default(),
            completed: None,
            priority: Priority::default(),
            impact: Impact::default(),
            cost: Cost::default(),
            fun: Fun::default(),
            wip: false,
            planned: false,
            value: 0.0,
            tags: Vec::new(),
        }
    }
}

/// First line of `content`, cut to `TITLE_MAX_LEN` characters.
pub fn title_from_content(content: &str) -> String {
    let first_line = content.split(['\n', '\r']).next().unwrap_or_default();
    first_line.chars().take(TITLE_MAX_LEN).collect()
}

impl Task {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    /// Assign identity and creation time; derive the title when blank.
    pub fn as_new_task(mut self) -> Self {
        if self.title.is_empty() {
            self.title = title_from_content(&self.content);
        }
        self.id = uuid::Uuid::new_v4().to_string();
        self.created = now();
        self.updated = self.created;
        self
    }

    /// Merge an edit into this task.
    ///
    /// Identity and creation time are kept. An edit to a task that is already
    /// completed keeps the original completion instant unless the edit
    /// uncompletes it.
    pub fn update(&self, mut change: Task) -> Task {
        if change.title.is_empty() {
            change.title = title_from_content(&change.content);
        }

        let completed = if !self.is_completed() || !change.is_completed() {
            change.completed
        } else {
            self.completed
        };

        Task {
            id: self.id.clone(),
            title: change.title,
            content: change.content,
            created: self.created,
            updated: now(),
            completed,
            priority: change.priority,
            impact: change.impact,
            cost: change.cost,
            fun: change.fun,
            wip: change.wip,
            planned: change.planned,
            value: change.value,
            tags: change.tags,
        }
    }

    pub fn complete(mut self) -> Self {
        self.completed = Some(now());
        self.updated = now();
        self
    }

    pub fn uncomplete(mut self) -> Self {
        self.completed = None;
        self.updated = now();
        self
    }

    /// A fresh, not completed copy carrying the same attributes and tags.
    pub fn clone_as_new(&self) -> Task {
        let copy = Task {
            title: format!("{CLONE_TITLE_PREFIX}{}", self.title),
            completed: None,
            ..self.clone()
        };
        copy.as_new_task()
    }
}
