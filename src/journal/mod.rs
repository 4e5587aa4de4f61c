pub mod model;
pub mod repository;
pub mod timeline;
pub mod workflow;

pub use model::{Author, CalendarDay, FontSize, ImageChange, NewImage, Post, PostsByDate};
pub use repository::{DynPostRepository, PostRepository, RepositoryError, SqlitePostRepository};
pub use workflow::{EntryState, EntryWorkflow, WorkflowError};
