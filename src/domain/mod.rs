pub mod hierarchy;
pub mod records;
pub mod task;

pub use hierarchy::build;
pub use records::{ChecklistRow, HeadingRow, ProjectRow, Stamped, TaskRow};
pub use task::ResolvedTask;
