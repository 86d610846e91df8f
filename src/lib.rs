//! Personal task store: tasks rated by priority, impact, cost and fun, tagged,
//! and listed through a persisted filter.

pub mod error;
pub mod model;
pub mod query;
pub mod score;
pub mod service;
pub mod settings;
pub mod store;

pub use error::{Result, StoreError};
pub use model::{Cost, Fun, Impact, Priority, Task, TaskTag};
pub use query::{PreparedQuery, SortColumn, SortDirection, TasksQuery};
pub use service::TaskService;
pub use settings::Settings;
pub use store::{Backend, TaskStore};
