use crate::domain::{build, ChecklistRow, HeadingRow, ProjectRow, ResolvedTask, TaskRow};
use crate::error::SyncError;
use crate::persistence::{write_section, Settings};
use crate::report::{group_by_day, render, start_of_day};
use crate::things::{next_watermark, Fetcher, RecordSource};
use anyhow::{anyhow, Result};
use chrono::{NaiveDate, TimeZone};
use indexmap::IndexSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Rows of all four kinds for one pass
#[derive(Debug, Default)]
pub struct Fetched {
    pub tasks: Vec<TaskRow>,
    pub checklist_items: Vec<ChecklistRow>,
    pub projects: Vec<ProjectRow>,
    pub headings: Vec<HeadingRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub tasks: usize,
    pub days: usize,
    pub notes_written: Vec<PathBuf>,
    /// New watermark to persist
    pub latest_sync_time: f64,
}

/// Fetch everything after `watermark`. Any failure aborts the whole pass.
///
/// Checklist items of the fetched tasks that were stopped at or before
/// `watermark` come first, so each task gets its full checklist.
pub fn fetch_all<S: RecordSource>(source: &S, watermark: f64) -> Result<Fetched, SyncError> {
    let fetcher = Fetcher::new(source);
    let tasks = fetcher.tasks(watermark)?;

    let mut checklist_items = {
        let task_ids: IndexSet<&str> = tasks.iter().map(|row| row.uuid.as_str()).collect();
        let task_ids: Vec<&str> = task_ids.into_iter().collect();
        fetcher.earlier_checklist_items(&task_ids, watermark)?
    };
    checklist_items.extend(fetcher.checklist_items(watermark)?);

    Ok(Fetched {
        tasks,
        checklist_items,
        projects: fetcher.projects()?,
        headings: fetcher.headings()?,
    })
}

/// Fetch and resolve every task stopped on or after the day of `watermark`.
///
/// The lower bound is floored to the start of that day so a day that was
/// partially synced gets re-rendered in full. Returns the tasks and the
/// highest stop date seen (never below `watermark`).
pub fn collect_tasks<S, Tz>(source: &S, watermark: f64, tz: &Tz) -> Result<(Vec<ResolvedTask>, f64), SyncError>
where
    S: RecordSource,
    Tz: TimeZone,
{
    let fetched = fetch_all(source, start_of_day(watermark, tz))?;
    let latest = next_watermark(watermark, &fetched.tasks);
    let tasks = build(
        &fetched.tasks,
        &fetched.checklist_items,
        &fetched.projects,
        &fetched.headings,
    )?;
    Ok((tasks, latest))
}

/// File name of the daily note for `date`
pub fn daily_note_path(notes_dir: &Path, format: &str, date: NaiveDate) -> Result<PathBuf> {
    let mut name = String::new();
    write!(name, "{}", date.format(format))
        .map_err(|_| anyhow!("Invalid daily note format: {}", format))?;
    Ok(notes_dir.join(format!("{}.md", name)))
}

/// Render each completion day into its daily note
pub fn run_sync<S, Tz>(
    source: &S,
    settings: &Settings,
    notes_dir: &Path,
    watermark: f64,
    tz: &Tz,
) -> Result<SyncReport>
where
    S: RecordSource,
    Tz: TimeZone,
{
    let (tasks, latest_sync_time) = collect_tasks(source, watermark, tz)?;
    let task_count = tasks.len();
    let options = settings.outline_options();

    let days = group_by_day(tasks, tz);
    let mut notes_written = Vec::with_capacity(days.len());
    for day in &days {
        let path = daily_note_path(notes_dir, &settings.daily_note_format, day.date)?;
        let rendered = render(&day.tasks, &options);
        write_section(&path, &options.section_heading, &rendered)?;
        info!(date = %day.date, tasks = day.tasks.len(), path = %path.display(), "wrote logbook section");
        notes_written.push(path);
    }

    info!(tasks = task_count, days = days.len(), latest_sync_time, "sync finished");
    Ok(SyncReport {
        tasks: task_count,
        days: days.len(),
        notes_written,
        latest_sync_time,
    })
}
