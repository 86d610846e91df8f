use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "priotasks", about = "Personal task tracker ranked by value")]
pub struct Cli {
    /// Path to the SQLite database [default: ~/priotasks/db.sqlite]
    #[arg(long, env = "PRIOTASKS_DB", global = true)]
    pub db: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Task attributes shared by `add` and `edit`.
#[derive(clap::Args, Default)]
pub struct TaskFields {
    /// Title (derived from the first content line when empty)
    #[arg(short, long)]
    pub title: Option<String>,
    /// Priority (low, medium, high, urgent)
    #[arg(short, long)]
    pub priority: Option<String>,
    /// Impact (slight, low, moderate, considerable, high)
    #[arg(short, long)]
    pub impact: Option<String>,
    /// Cost (xs, s, m, l, xl, xxl)
    #[arg(short, long)]
    pub cost: Option<String>,
    /// Fun (s, m, l, xl)
    #[arg(short, long)]
    pub fun: Option<String>,
    /// Work in progress
    #[arg(long)]
    pub wip: Option<bool>,
    /// Planned
    #[arg(long)]
    pub planned: Option<bool>,
    /// Tag (repeatable). On edit, replaces the task's tags
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a task
    Add {
        /// Task content; the first line becomes the title
        content: String,
        #[command(flatten)]
        fields: TaskFields,
    },

    /// Edit a task
    Edit {
        /// Task id
        id: String,
        /// New content
        #[arg(long)]
        content: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
        /// Remove all tags
        #[arg(long)]
        clear_tags: bool,
    },

    /// Toggle a task between open and completed
    Done {
        /// Task id
        id: String,
    },

    /// Copy a task under a new id
    Clone {
        /// Task id
        id: String,
    },

    /// Remove a task
    Rm {
        /// Task id
        id: String,
    },

    /// Remove every task
    Purge {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show task details
    Show {
        /// Task id
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tasks matching the saved filter
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommand,
    },

    /// Show or change the saved filter
    Filter {
        /// Hide completed tasks
        #[arg(long)]
        hide_completed: Option<bool>,
        /// Hide open tasks
        #[arg(long)]
        hide_open: Option<bool>,
        /// Completed on or after (YYYY-MM-DD, empty to clear)
        #[arg(long)]
        from: Option<String>,
        /// Completed before (YYYY-MM-DD, exclusive, empty to clear)
        #[arg(long)]
        to: Option<String>,
        /// Only work in progress
        #[arg(long)]
        wip: Option<bool>,
        /// Only not in progress
        #[arg(long)]
        non_wip: Option<bool>,
        /// Only planned
        #[arg(long)]
        planned: Option<bool>,
        /// Only not planned
        #[arg(long)]
        non_planned: Option<bool>,
        /// Match tasks with any of these tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Clear the tag filter
        #[arg(long)]
        clear_tags: bool,
        /// Substring of title or content (empty to clear)
        #[arg(long)]
        search: Option<String>,
        /// Cap the number of listed tasks (0 disables)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Sort by a column; repeating the active column flips direction
    Sort {
        /// Column (completed, created, priority, impact, wip, planned, cost, value, fun)
        column: String,
    },

    /// Apply a canned filter (clear, completed-today, completed-yesterday,
    /// completed-this-week, completed-last-week, completed-last-two-weeks)
    Preset {
        /// Preset name
        name: String,
    },

    /// Lower the priority of every listed task by one level
    Demote,
}

#[derive(Subcommand)]
pub enum TagCommand {
    /// Attach a tag to a task
    Add {
        /// Task id
        id: String,
        /// Tag
        tag: String,
    },
    /// Detach a tag from a task
    Rm {
        /// Task id
        id: String,
        /// Tag
        tag: String,
    },
    /// List all tags, newest first
    List,
    /// Delete a tag everywhere
    Delete {
        /// Tag
        tag: String,
    },
}
