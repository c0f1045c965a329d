use crate::domain::ResolvedTask;
use indexmap::IndexMap;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Dropped from the top-level list: a recurring routine that would otherwise
/// land in every daily note
pub const MORNING_ROUTINE: &str = "Morning routine";

/// Indentation settings of the target editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indentation {
    pub use_tab: bool,
    pub tab_size: usize,
}

impl Indentation {
    /// One level of indentation
    pub fn unit(&self) -> String {
        if self.use_tab {
            "\t".to_string()
        } else {
            " ".repeat(self.tab_size)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineOptions {
    /// First line of the output, e.g. "## Logbook"
    pub section_heading: String,
    pub indentation: Indentation,
    pub tag_prefix: String,
    pub sync_note_body: bool,
    /// Placed in the checkbox of cancelled tasks
    pub canceled_mark: String,
    /// Emit `#` markers on group lines instead of plain bullets
    pub heading_markers: bool,
}

/// Depth of a markdown heading line, 0 when the line is not a heading
pub fn heading_level(line: &str) -> usize {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    match line[hashes..].chars().next() {
        None if hashes > 0 => hashes,
        Some(c) if hashes > 0 && c.is_whitespace() => hashes,
        _ => 0,
    }
}

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Replace each run of whitespace with a single hyphen
fn hyphenate(tag: &str) -> Cow<'_, str> {
    WHITESPACE.replace_all(tag, "-")
}

/// Group by a key, keeping groups and their members in first-seen order
fn group_by<'t, F>(tasks: impl IntoIterator<Item = &'t ResolvedTask>, key: F) -> IndexMap<&'t str, Vec<&'t ResolvedTask>>
where
    F: Fn(&'t ResolvedTask) -> Option<&'t str>,
{
    let mut groups: IndexMap<&str, Vec<&ResolvedTask>> = IndexMap::new();
    for task in tasks {
        if let Some(name) = key(task) {
            groups.entry(name).or_default().push(task);
        }
    }
    groups
}

struct Renderer<'a> {
    options: &'a OutlineOptions,
    tab: String,
    lines: Vec<String>,
}

impl<'a> Renderer<'a> {
    fn group_line(&mut self, title: &str, level: usize, indent: usize, link: bool) {
        let marker = if self.options.heading_markers {
            format!("{} ", "#".repeat(level))
        } else {
            String::new()
        };
        let label = if link {
            format!("[[{}]]", title)
        } else {
            title.to_string()
        };
        self.lines
            .push(format!("{}- {}{}", self.tab.repeat(indent), marker, label));
    }

    fn task(&mut self, task: &ResolvedTask, indent: usize) {
        let indent_str = self.tab.repeat(indent);
        let prefix = &self.options.tag_prefix;

        let tags = task
            .distinct_tags()
            .into_iter()
            .map(|tag| format!("#{}{}", prefix, hyphenate(tag).to_lowercase()))
            .collect::<Vec<_>>()
            .join(" ");
        let title = format!("{} [link]({}) {}", task.title, task.deep_link(), tags);
        let checkbox = if task.cancelled {
            format!("[{}] ", self.options.canceled_mark)
        } else {
            String::new()
        };

        let mut block = vec![format!("{}- {}{}", indent_str, checkbox, title.trim_end())];

        if self.options.sync_note_body {
            block.extend(
                task.notes
                    .lines()
                    .map(str::trim_end)
                    .filter(|line| !line.is_empty())
                    .map(|line| format!("{}{}{}", indent_str, self.tab, line)),
            );
        }

        block.extend(task.subtasks.iter().map(|subtask| {
            format!(
                "{}{}- [{}] {}",
                indent_str,
                self.tab,
                if subtask.completed { "x" } else { " " },
                subtask.title
            )
        }));

        self.lines.extend(block.into_iter().filter(|line| !line.trim().is_empty()));
    }
}

/// Render resolved tasks as a nested outline under `options.section_heading`.
///
/// Order: unclassified tasks, then project groups without an area, then
/// area groups. Groups appear in the order their first task appears.
pub fn render(tasks: &[ResolvedTask], options: &OutlineOptions) -> String {
    let level = heading_level(&options.section_heading);
    let mut r = Renderer {
        options,
        tab: options.indentation.unit(),
        lines: vec![options.section_heading.clone(), String::new()],
    };

    // No area, no project
    for task in tasks.iter().filter(|t| t.area().is_none() && t.project().is_none()) {
        if task.title != MORNING_ROUTINE {
            r.task(task, 0);
        }
    }

    // Project without area
    let loose = tasks.iter().filter(|t| t.area().is_none());
    for (project, members) in group_by(loose, ResolvedTask::project) {
        r.group_line(project, level + 1, 0, true);
        for task in members.iter().filter(|t| t.heading().is_none()) {
            r.task(task, 1);
        }
        for (heading, under) in group_by(members.iter().copied(), ResolvedTask::heading) {
            r.group_line(heading, level + 2, 1, true);
            for task in under {
                r.task(task, 2);
            }
        }
    }

    // Area
    for (area, members) in group_by(tasks, ResolvedTask::area) {
        r.group_line(area, level + 1, 0, false);
        for task in members.iter().filter(|t| t.project().is_none()) {
            r.task(task, 1);
        }
        for (project, in_project) in group_by(members.iter().copied(), ResolvedTask::project) {
            r.group_line(project, level + 2, 1, true);
            for task in in_project.iter().filter(|t| t.heading().is_none()) {
                if task.title != MORNING_ROUTINE {
                    r.task(task, 2);
                }
            }
            for (heading, under) in group_by(in_project.iter().copied(), ResolvedTask::heading) {
                r.group_line(heading, level + 3, 2, false);
                for task in under {
                    r.task(task, 3);
                }
            }
        }
    }

    r.lines.join("\n")
}
