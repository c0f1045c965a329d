/// A checklist item attached to a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    pub title: String,
    pub completed: bool,
}

/// A completed task with its area, project and heading resolved to titles
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTask {
    pub uuid: String,
    /// Title with trailing whitespace stripped
    pub title: String,
    pub notes: String,
    pub area: Option<String>,
    pub project: Option<String>,
    pub heading: Option<String>,
    /// One slot per contributing row, in row order. `None` marks a row
    /// that carried no tag.
    pub tags: Vec<Option<String>>,
    pub start_date: Option<f64>,
    pub stop_date: Option<f64>,
    pub cancelled: bool,
    pub subtasks: Vec<Subtask>,
}

impl ResolvedTask {
    /// Present, non-empty tags with repeats collapsed, in first-seen order
    pub fn distinct_tags(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for tag in self.tags.iter().flatten() {
            if !tag.is_empty() && !seen.contains(&tag.as_str()) {
                seen.push(tag);
            }
        }
        seen
    }

    pub fn area(&self) -> Option<&str> {
        non_empty(&self.area)
    }

    pub fn project(&self) -> Option<&str> {
        non_empty(&self.project)
    }

    pub fn heading(&self) -> Option<&str> {
        non_empty(&self.heading)
    }

    /// Things deep link that opens this task
    pub fn deep_link(&self) -> String {
        format!("things:///show?id={}", self.uuid)
    }
}

/// Empty strings classify the same as absent values
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
