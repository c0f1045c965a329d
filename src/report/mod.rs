pub mod daily;
pub mod outline;

pub use daily::{group_by_day, start_of_day};
pub use outline::{render, Indentation, OutlineOptions};
