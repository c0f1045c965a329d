use super::db::RecordSource;
use crate::domain::{ChecklistRow, HeadingRow, ProjectRow, Stamped, TaskRow};
use crate::error::{FetchStage, SyncError};
use tracing::{debug, error, warn};

/// Rows requested per query
pub const PAGE_SIZE: usize = 1000;

/// Task ids bound per checklist query, below SQLite's variable limit
const IDS_PER_QUERY: usize = 500;

/// Highest stop timestamp in `page`, or `current` when the page carries none.
///
/// Never moves backwards and never becomes unset.
pub fn next_watermark<R: Stamped>(current: f64, page: &[R]) -> f64 {
    page.iter()
        .filter_map(Stamped::stop_date)
        .filter(|stop| stop.is_finite())
        .fold(current, f64::max)
}

/// Number of trailing rows sharing the page's last stop date, or 0 when
/// every row does and nothing earlier is left to resume from
fn held_back<R: Stamped>(page: &[R]) -> usize {
    let Some(last) = page.last().and_then(Stamped::stop_date) else {
        return 0;
    };
    let tail = page
        .iter()
        .rev()
        .take_while(|row| row.stop_date() == Some(last))
        .count();
    if tail == page.len() {
        0
    } else {
        tail
    }
}

/// Pulls each record kind page by page until a short page comes back
pub struct Fetcher<'a, S> {
    source: &'a S,
    page_size: usize,
}

impl<'a, S: RecordSource> Fetcher<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            page_size: PAGE_SIZE,
        }
    }

    #[cfg(test)]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Completed, non-trashed tasks stopped after `watermark`, one row per tag
    pub fn tasks(&self, watermark: f64) -> Result<Vec<TaskRow>, SyncError> {
        self.by_watermark(FetchStage::Tasks, watermark, |after, limit| {
            self.source.task_page(after, limit)
        })
    }

    /// Titled checklist items stopped after `watermark`
    pub fn checklist_items(&self, watermark: f64) -> Result<Vec<ChecklistRow>, SyncError> {
        self.by_watermark(FetchStage::Subtasks, watermark, |after, limit| {
            self.source.checklist_page(after, limit)
        })
    }

    /// Titled checklist items of `task_ids` stopped at or before `until`,
    /// ordered by stop date
    pub fn earlier_checklist_items(&self, task_ids: &[&str], until: f64) -> Result<Vec<ChecklistRow>, SyncError> {
        let stage = FetchStage::Subtasks;
        let mut records = Vec::new();

        for chunk in task_ids.chunks(IDS_PER_QUERY) {
            debug!(%stage, tasks = chunk.len(), until, "fetching earlier checklist items");
            let rows = self.source.checklist_for_tasks(chunk, until).map_err(|err| {
                error!(%stage, error = %err, "failed to query the Things database");
                SyncError::fetch(stage, err)
            })?;
            records.extend(rows);
        }

        records.sort_by(|a, b| {
            let (a, b) = (a.stop_date.unwrap_or_default(), b.stop_date.unwrap_or_default());
            a.total_cmp(&b)
        });
        Ok(records)
    }

    pub fn projects(&self) -> Result<Vec<ProjectRow>, SyncError> {
        self.by_offset(FetchStage::Projects, |offset, limit| {
            self.source.project_page(offset, limit)
        })
    }

    pub fn headings(&self) -> Result<Vec<HeadingRow>, SyncError> {
        self.by_offset(FetchStage::Headings, |offset, limit| {
            self.source.heading_page(offset, limit)
        })
    }

    fn by_watermark<R, F>(&self, stage: FetchStage, watermark: f64, mut fetch_page: F) -> Result<Vec<R>, SyncError>
    where
        R: Stamped,
        F: FnMut(f64, usize) -> Result<Vec<R>, S::Error>,
    {
        let mut records = Vec::new();
        let mut cursor = watermark;

        loop {
            debug!(%stage, after = cursor, "fetching page");
            let mut page = fetch_page(cursor, self.page_size).map_err(|err| {
                error!(%stage, error = %err, "failed to query the Things database");
                SyncError::fetch(stage, err)
            })?;

            let rows = page.len();
            if rows < self.page_size {
                records.extend(page);
                debug!(%stage, rows, "fetched last page");
                break;
            }

            // Rows sharing the last stop date may continue on the next page;
            // re-read them from the stop date before theirs
            let held = held_back(&page);
            page.truncate(rows - held);
            let next = next_watermark(cursor, &page);
            records.extend(page);
            debug!(%stage, rows, held, watermark = next, "fetched page");

            if next <= cursor {
                // A full page that does not move the cursor would be served again
                warn!(%stage, watermark = cursor, "watermark did not advance, stopping");
                break;
            }
            cursor = next;
        }

        Ok(records)
    }

    fn by_offset<R, F>(&self, stage: FetchStage, mut fetch_page: F) -> Result<Vec<R>, SyncError>
    where
        F: FnMut(usize, usize) -> Result<Vec<R>, S::Error>,
    {
        let mut records = Vec::new();

        loop {
            debug!(%stage, offset = records.len(), "fetching page");
            let page = fetch_page(records.len(), self.page_size).map_err(|err| {
                error!(%stage, error = %err, "failed to query the Things database");
                SyncError::fetch(stage, err)
            })?;

            let rows = page.len();
            records.extend(page);
            debug!(%stage, rows, "fetched page");

            if rows < self.page_size {
                break;
            }
        }

        Ok(records)
    }
}
