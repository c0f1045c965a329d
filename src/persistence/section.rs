use super::files::{atomic_write, read_file};
use crate::report::outline::heading_level;
use anyhow::Result;
use std::path::Path;

/// Put `rendered` into `document` as the section titled `heading`.
///
/// An existing section runs from its heading line up to the next heading of
/// the same or a shallower level and is replaced wholesale. Without one the
/// section is appended.
pub fn update_section(document: &str, heading: &str, rendered: &str) -> String {
    let lines: Vec<&str> = document.lines().collect();
    let heading = heading.trim_end();
    let level = heading_level(heading);

    let Some(start) = lines.iter().position(|line| line.trim_end() == heading) else {
        let body = document.trim_end();
        if body.is_empty() {
            return format!("{}\n", rendered.trim_end());
        }
        return format!("{}\n\n{}\n", body, rendered.trim_end());
    };

    let end = lines[start + 1..]
        .iter()
        .position(|line| {
            let depth = heading_level(line);
            depth > 0 && (level == 0 || depth <= level)
        })
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());

    let mut out: Vec<&str> = lines[..start].to_vec();
    out.extend(rendered.trim_end().lines());
    if end < lines.len() {
        out.push("");
        out.extend(&lines[end..]);
    }
    format!("{}\n", out.join("\n"))
}

/// Rewrite the section inside the note at `path`, creating the note if needed
pub fn write_section(path: &Path, heading: &str, rendered: &str) -> Result<()> {
    let existing = read_file(path)?;
    let updated = update_section(&existing, heading, rendered);
    if updated != existing {
        atomic_write(path, &updated)?;
    }
    Ok(())
}
