use crate::domain::records::{TYPE_HEADING, TYPE_PROJECT, TYPE_TASK};
use crate::domain::{ChecklistRow, HeadingRow, ProjectRow, TaskRow};
use rusqlite::{params, Connection, OpenFlags, Row, ToSql};
use std::path::{Path, PathBuf};

/// Page-at-a-time access to the four record kinds.
///
/// Watermarked kinds take the exclusive lower bound on `stopDate`; the
/// lookup kinds are paged by offset.
pub trait RecordSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn task_page(&self, after: f64, limit: usize) -> Result<Vec<TaskRow>, Self::Error>;
    fn checklist_page(&self, after: f64, limit: usize) -> Result<Vec<ChecklistRow>, Self::Error>;
    /// Titled checklist items of `task_ids` stopped at or before `until`
    fn checklist_for_tasks(&self, task_ids: &[&str], until: f64) -> Result<Vec<ChecklistRow>, Self::Error>;
    fn project_page(&self, offset: usize, limit: usize) -> Result<Vec<ProjectRow>, Self::Error>;
    fn heading_page(&self, offset: usize, limit: usize) -> Result<Vec<HeadingRow>, Self::Error>;
}

const TASKS_SQL: &str = r#"
    SELECT
        TMTask.uuid,
        TMTask.title,
        TMTask.notes,
        TMTask.startDate,
        TMTask.stopDate,
        TMTask.status,
        TMTag.title,
        TMArea.title,
        TMProject.uuid,
        TMHeading.uuid
    FROM TMTask
    LEFT JOIN TMTaskTag ON TMTaskTag.tasks = TMTask.uuid
    LEFT JOIN TMTag ON TMTag.uuid = TMTaskTag.tags
    LEFT JOIN TMArea ON TMTask.area = TMArea.uuid
    LEFT JOIN TMTask TMProject ON TMProject.uuid = TMTask.project
    LEFT JOIN TMTask TMHeading ON TMHeading.uuid = TMTask.heading
    WHERE TMTask.type = ?1
        AND TMTask.trashed = 0
        AND TMTask.stopDate IS NOT NULL
        AND TMTask.stopDate > ?2
    ORDER BY TMTask.stopDate
    LIMIT ?3
"#;

const CHECKLIST_SQL: &str = r#"
    SELECT uuid, task, title, creationDate, stopDate
    FROM TMChecklistItem
    WHERE title IS NOT NULL
        AND title != ''
        AND stopDate > ?1
    ORDER BY stopDate
    LIMIT ?2
"#;

/// Followed by one `?` per task id
const CHECKLIST_FOR_TASKS_SQL: &str = r#"
    SELECT uuid, task, title, creationDate, stopDate
    FROM TMChecklistItem
    WHERE title IS NOT NULL
        AND title != ''
        AND stopDate IS NOT NULL
        AND stopDate <= ?
        AND task IN
"#;

const PROJECTS_SQL: &str = r#"
    SELECT TMTask.uuid, TMTask.title, TMArea.title
    FROM TMTask
    LEFT JOIN TMArea ON TMTask.area = TMArea.uuid
    WHERE TMTask.type = ?1
    ORDER BY TMTask.uuid
    LIMIT ?2 OFFSET ?3
"#;

const HEADINGS_SQL: &str = r#"
    SELECT TMTask.uuid, TMTask.title, TMArea.title, TMProject.uuid
    FROM TMTask
    LEFT JOIN TMArea ON TMTask.area = TMArea.uuid
    LEFT JOIN TMTask TMProject ON TMProject.uuid = TMTask.project
    WHERE TMTask.type = ?1
    ORDER BY TMTask.uuid
    LIMIT ?2 OFFSET ?3
"#;

/// Read-only handle on the Things SQLite database
#[derive(Debug)]
pub struct ThingsDb {
    path: PathBuf,
    conn: Connection,
}

impl ThingsDb {
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { path, conn })
    }

    #[cfg(test)]
    pub(crate) fn from_connection(conn: Connection) -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            conn,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Absent identifiers become empty strings; the hierarchy builder rejects them
fn id_column(row: &Row, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn checklist_row(row: &Row) -> rusqlite::Result<ChecklistRow> {
    Ok(ChecklistRow {
        uuid: id_column(row, 0)?,
        task_id: id_column(row, 1)?,
        title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        start_date: row.get(3)?,
        stop_date: row.get(4)?,
    })
}

impl RecordSource for ThingsDb {
    type Error = rusqlite::Error;

    fn task_page(&self, after: f64, limit: usize) -> rusqlite::Result<Vec<TaskRow>> {
        let mut stmt = self.conn.prepare_cached(TASKS_SQL)?;
        let rows = stmt.query_map(params![TYPE_TASK, after, limit as i64], |row| {
            Ok(TaskRow {
                uuid: id_column(row, 0)?,
                title: row.get(1)?,
                notes: row.get(2)?,
                start_date: row.get(3)?,
                stop_date: row.get(4)?,
                status: row.get::<_, Option<i64>>(5)?.unwrap_or_default(),
                tag: row.get(6)?,
                area: row.get(7)?,
                project: row.get(8)?,
                heading: row.get(9)?,
            })
        })?;
        rows.collect()
    }

    fn checklist_page(&self, after: f64, limit: usize) -> rusqlite::Result<Vec<ChecklistRow>> {
        let mut stmt = self.conn.prepare_cached(CHECKLIST_SQL)?;
        let rows = stmt.query_map(params![after, limit as i64], checklist_row)?;
        rows.collect()
    }

    fn checklist_for_tasks(&self, task_ids: &[&str], until: f64) -> rusqlite::Result<Vec<ChecklistRow>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; task_ids.len()].join(", ");
        let sql = format!("{CHECKLIST_FOR_TASKS_SQL} ({placeholders}) ORDER BY stopDate");

        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(task_ids.len() + 1);
        values.push(&until);
        values.extend(task_ids.iter().map(|id| id as &dyn ToSql));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(values.as_slice(), checklist_row)?;
        rows.collect()
    }

    fn project_page(&self, offset: usize, limit: usize) -> rusqlite::Result<Vec<ProjectRow>> {
        let mut stmt = self.conn.prepare_cached(PROJECTS_SQL)?;
        let rows = stmt.query_map(params![TYPE_PROJECT, limit as i64, offset as i64], |row| {
            Ok(ProjectRow {
                uuid: id_column(row, 0)?,
                title: row.get(1)?,
                area: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    fn heading_page(&self, offset: usize, limit: usize) -> rusqlite::Result<Vec<HeadingRow>> {
        let mut stmt = self.conn.prepare_cached(HEADINGS_SQL)?;
        let rows = stmt.query_map(params![TYPE_HEADING, limit as i64, offset as i64], |row| {
            Ok(HeadingRow {
                uuid: id_column(row, 0)?,
                title: row.get(1)?,
                area: row.get(2)?,
                project: row.get(3)?,
            })
        })?;
        rows.collect()
    }
}
