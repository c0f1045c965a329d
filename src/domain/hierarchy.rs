use super::records::{ChecklistRow, HeadingRow, ProjectRow, TaskRow, STATUS_CANCELLED};
use super::task::{ResolvedTask, Subtask};
use crate::error::ResolveError;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::warn;

/// Project and heading rows indexed by uuid (first row wins on duplicates)
struct Lookup<'a> {
    projects: HashMap<&'a str, &'a ProjectRow>,
    headings: HashMap<&'a str, &'a HeadingRow>,
}

impl<'a> Lookup<'a> {
    fn new(projects: &'a [ProjectRow], headings: &'a [HeadingRow]) -> Self {
        let mut lookup = Self {
            projects: HashMap::with_capacity(projects.len()),
            headings: HashMap::with_capacity(headings.len()),
        };
        for project in projects {
            lookup.projects.entry(project.uuid.as_str()).or_insert(project);
        }
        for heading in headings {
            lookup.headings.entry(heading.uuid.as_str()).or_insert(heading);
        }
        lookup
    }

    /// Walk heading -> project -> area, letting each ancestor overwrite the
    /// area the row itself carried.
    ///
    /// Identifiers that point at no known record are kept as-is.
    fn resolve(&self, row: &TaskRow) -> (Option<String>, Option<String>, Option<String>) {
        let mut area = row.area.clone();
        let mut project_id = row.project.clone();
        let mut heading = row.heading.clone();

        if let Some(record) = row.heading.as_deref().and_then(|id| self.headings.get(id)) {
            heading = record.title.clone();
            if record.area.is_some() {
                area = record.area.clone();
            }
            if let Some(owner) = record
                .project
                .as_deref()
                .filter(|id| self.projects.contains_key(*id))
            {
                project_id = Some(owner.to_string());
            }
        }

        let mut project = project_id.clone();
        if let Some(record) = project_id.as_deref().and_then(|id| self.projects.get(id)) {
            project = record.title.clone();
            if record.area.is_some() {
                area = record.area.clone();
            }
        }

        (area, project, heading)
    }
}

/// Tasks keyed by uuid, kept in first-seen order
#[derive(Default)]
struct Merged {
    tasks: IndexMap<String, ResolvedTask>,
}

impl Merged {
    fn merge_row(mut self, (row_number, row): (usize, &TaskRow), lookup: &Lookup) -> Result<Self, ResolveError> {
        if row.uuid.trim().is_empty() {
            return Err(ResolveError::MissingTaskId { row: row_number });
        }

        if let Some(task) = self.tasks.get_mut(&row.uuid) {
            task.tags.push(row.tag.clone());
            return Ok(self);
        }

        let (area, project, heading) = lookup.resolve(row);
        self.tasks.insert(
            row.uuid.clone(),
            ResolvedTask {
                uuid: row.uuid.clone(),
                title: row.title.as_deref().unwrap_or_default().trim_end().to_string(),
                notes: row.notes.clone().unwrap_or_default(),
                area,
                project,
                heading,
                tags: vec![row.tag.clone()],
                start_date: row.start_date,
                stop_date: row.stop_date,
                cancelled: row.status == STATUS_CANCELLED,
                subtasks: Vec::new(),
            },
        );
        Ok(self)
    }

    fn attach(mut self, item: &ChecklistRow) -> Result<Self, ResolveError> {
        if item.task_id.trim().is_empty() {
            return Err(ResolveError::MissingChecklistTaskId {
                checklist_item: item.uuid.clone(),
            });
        }

        // The item may have been completed in an earlier batch than its task
        match self.tasks.get_mut(&item.task_id) {
            Some(task) => task.subtasks.push(Subtask {
                title: item.title.trim_end().to_string(),
                completed: item.stop_date.is_some(),
            }),
            None => warn!(task = %item.task_id, "dropping checklist item for unknown task"),
        }
        Ok(self)
    }
}

/// Merge the flat query rows into one `ResolvedTask` per task uuid.
///
/// Repeated rows for a task only contribute their tag. Checklist rows are
/// attached afterwards; rows whose task is not in `task_rows` are dropped.
pub fn build(
    task_rows: &[TaskRow],
    checklist_rows: &[ChecklistRow],
    project_rows: &[ProjectRow],
    heading_rows: &[HeadingRow],
) -> Result<Vec<ResolvedTask>, ResolveError> {
    let lookup = Lookup::new(project_rows, heading_rows);

    let merged = task_rows
        .iter()
        .enumerate()
        .try_fold(Merged::default(), |acc, row| acc.merge_row(row, &lookup))?;
    let merged = checklist_rows
        .iter()
        .try_fold(merged, |acc, item| acc.attach(item))?;

    Ok(merged.tasks.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_row(uuid: &str, title: &str, tag: Option<&str>) -> TaskRow {
        TaskRow {
            uuid: uuid.to_string(),
            title: Some(title.to_string()),
            stop_date: Some(1_700_000_000.0),
            tag: tag.map(str::to_string),
            ..Default::default()
        }
    }

    fn checklist_row(uuid: &str, task_id: &str, title: &str, done: bool) -> ChecklistRow {
        ChecklistRow {
            uuid: uuid.to_string(),
            task_id: task_id.to_string(),
            title: title.to_string(),
            start_date: None,
            stop_date: done.then_some(1_700_000_100.0),
        }
    }

    fn project(uuid: &str, title: &str, area: Option<&str>) -> ProjectRow {
        ProjectRow {
            uuid: uuid.to_string(),
            title: Some(title.to_string()),
            area: area.map(str::to_string),
        }
    }

    fn heading(uuid: &str, title: &str, project: Option<&str>) -> HeadingRow {
        HeadingRow {
            uuid: uuid.to_string(),
            title: Some(title.to_string()),
            area: None,
            project: project.map(str::to_string),
        }
    }

    #[test]
    fn test_rows_for_same_task_merge_tags() {
        let rows = vec![
            task_row("t1", "Write doc", Some("urgent")),
            task_row("t1", "Write doc", Some("q1")),
            task_row("t2", "Other", None),
            task_row("t1", "Write doc", Some("urgent")),
        ];

        let tasks = build(&rows, &[], &[], &[]).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].uuid, "t1");
        assert_eq!(tasks[1].uuid, "t2");
        // No dedupe at merge time: one slot per contributing row
        assert_eq!(
            tasks[0].tags,
            vec![
                Some("urgent".to_string()),
                Some("q1".to_string()),
                Some("urgent".to_string()),
            ]
        );
        assert_eq!(tasks[1].tags, vec![None]);
    }

    #[test]
    fn test_base_fields_come_from_first_row() {
        let mut second = task_row("t1", "Renamed", Some("b"));
        second.status = STATUS_CANCELLED;
        let rows = vec![task_row("t1", "Original  \t", Some("a")), second];

        let tasks = build(&rows, &[], &[], &[]).unwrap();

        assert_eq!(tasks[0].title, "Original");
        assert!(!tasks[0].cancelled);
    }

    #[test]
    fn test_cancelled_only_for_cancelled_status() {
        let mut cancelled = task_row("t1", "Dropped", None);
        cancelled.status = STATUS_CANCELLED;
        let mut completed = task_row("t2", "Done", None);
        completed.status = 3;

        let tasks = build(&[cancelled, completed], &[], &[], &[]).unwrap();

        assert!(tasks[0].cancelled);
        assert!(!tasks[1].cancelled);
    }

    #[test]
    fn test_heading_chain_overrides_own_area() {
        let mut row = task_row("t1", "Write doc", None);
        row.area = Some("Personal".to_string());
        row.heading = Some("h1".to_string());
        let headings = vec![heading("h1", "Prep", Some("p1"))];
        let projects = vec![project("p1", "Launch", Some("Work"))];

        let tasks = build(&[row], &[], &projects, &headings).unwrap();

        assert_eq!(tasks[0].heading.as_deref(), Some("Prep"));
        assert_eq!(tasks[0].project.as_deref(), Some("Launch"));
        assert_eq!(tasks[0].area.as_deref(), Some("Work"));
    }

    #[test]
    fn test_heading_project_overrides_row_project() {
        let mut row = task_row("t1", "Write doc", None);
        row.project = Some("p-other".to_string());
        row.heading = Some("h1".to_string());
        let headings = vec![heading("h1", "Prep", Some("p1"))];
        let projects = vec![
            project("p1", "Launch", None),
            project("p-other", "Elsewhere", Some("Home")),
        ];

        let tasks = build(&[row], &[], &projects, &headings).unwrap();

        assert_eq!(tasks[0].project.as_deref(), Some("Launch"));
        assert_eq!(tasks[0].area, None);
    }

    #[test]
    fn test_project_without_heading_resolves_area() {
        let mut row = task_row("t1", "Ship", None);
        row.project = Some("p1".to_string());
        let projects = vec![project("p1", "Launch", Some("Work"))];

        let tasks = build(&[row], &[], &projects, &[]).unwrap();

        assert_eq!(tasks[0].project.as_deref(), Some("Launch"));
        assert_eq!(tasks[0].area.as_deref(), Some("Work"));
        assert_eq!(tasks[0].heading, None);
    }

    #[test]
    fn test_project_without_area_keeps_row_area() {
        let mut row = task_row("t1", "Ship", None);
        row.area = Some("Home".to_string());
        row.project = Some("p1".to_string());
        let projects = vec![project("p1", "Launch", None)];

        let tasks = build(&[row], &[], &projects, &[]).unwrap();

        assert_eq!(tasks[0].area.as_deref(), Some("Home"));
    }

    #[test]
    fn test_heading_area_applies_when_project_has_none() {
        let mut row = task_row("t1", "Ship", None);
        row.heading = Some("h1".to_string());
        let mut h = heading("h1", "Prep", Some("p1"));
        h.area = Some("Side".to_string());
        let projects = vec![project("p1", "Launch", None)];

        let tasks = build(&[row], &[], &projects, &[h]).unwrap();

        assert_eq!(tasks[0].area.as_deref(), Some("Side"));
    }

    #[test]
    fn test_checklist_items_attach_in_order() {
        let rows = vec![task_row("t1", "Write doc", None)];
        let items = vec![
            checklist_row("c1", "t1", "Outline ", true),
            checklist_row("c2", "t1", "Draft", false),
        ];

        let tasks = build(&rows, &items, &[], &[]).unwrap();

        assert_eq!(
            tasks[0].subtasks,
            vec![
                Subtask { title: "Outline".to_string(), completed: true },
                Subtask { title: "Draft".to_string(), completed: false },
            ]
        );
    }

    #[test]
    fn test_checklist_for_unknown_task_is_dropped() {
        let rows = vec![task_row("t1", "Write doc", Some("a"))];
        let items = vec![checklist_row("c1", "missing", "Orphan", true)];

        let with_orphan = build(&rows, &items, &[], &[]).unwrap();
        let without = build(&rows, &[], &[], &[]).unwrap();

        assert_eq!(with_orphan, without);
    }

    #[test]
    fn test_missing_task_id_fails() {
        let rows = vec![task_row("t1", "Fine", None), task_row("", "Broken", None)];

        let err = build(&rows, &[], &[], &[]).unwrap_err();

        assert_eq!(err, ResolveError::MissingTaskId { row: 1 });
    }

    #[test]
    fn test_missing_checklist_owner_fails() {
        let rows = vec![task_row("t1", "Fine", None)];
        let items = vec![checklist_row("c9", "", "No owner", true)];

        let err = build(&rows, &items, &[], &[]).unwrap_err();

        assert_eq!(
            err,
            ResolveError::MissingChecklistTaskId { checklist_item: "c9".to_string() }
        );
    }
}
