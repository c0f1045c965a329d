/// `TMTask.type` discriminator values
pub const TYPE_TASK: i64 = 0;
pub const TYPE_PROJECT: i64 = 1;
pub const TYPE_HEADING: i64 = 2;

/// `TMTask.status` value for a cancelled task
pub const STATUS_CANCELLED: i64 = 2;

/// Something a watermark can advance over
pub trait Stamped {
    fn stop_date(&self) -> Option<f64>;
}

/// One row of the task query: a task joined with at most one of its tags.
///
/// A task with N tags arrives as N rows sharing the same `uuid`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskRow {
    /// Empty when the store returned NULL
    pub uuid: String,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub area: Option<String>,
    /// Project uuid, resolved through `ProjectRow`
    pub project: Option<String>,
    /// Heading uuid, resolved through `HeadingRow`
    pub heading: Option<String>,
    pub start_date: Option<f64>,
    pub stop_date: Option<f64>,
    pub status: i64,
    pub tag: Option<String>,
}

impl Stamped for TaskRow {
    fn stop_date(&self) -> Option<f64> {
        self.stop_date
    }
}

/// One row of the checklist query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChecklistRow {
    pub uuid: String,
    /// Owning task uuid; empty when the store returned NULL
    pub task_id: String,
    pub title: String,
    pub start_date: Option<f64>,
    pub stop_date: Option<f64>,
}

impl Stamped for ChecklistRow {
    fn stop_date(&self) -> Option<f64> {
        self.stop_date
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectRow {
    pub uuid: String,
    pub title: Option<String>,
    /// Area title (already joined)
    pub area: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadingRow {
    pub uuid: String,
    pub title: Option<String>,
    /// Area title (already joined)
    pub area: Option<String>,
    /// Owning project uuid
    pub project: Option<String>,
}
