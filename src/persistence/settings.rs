use crate::report::{Indentation, OutlineOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User settings stored in settings.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Heading line the logbook section is written under
    pub section_heading: String,
    pub tag_prefix: String,
    /// Copy task notes under each task
    pub sync_note_body: bool,
    pub canceled_mark: String,
    pub use_tab: bool,
    pub tab_size: usize,
    pub heading_markers: bool,
    /// Explicit path to the Things main.sqlite; probed when unset
    pub database_path: Option<PathBuf>,
    /// Where daily notes live; defaults to `notes/` in the config directory
    pub notes_dir: Option<PathBuf>,
    /// chrono format of daily note file names (without extension)
    pub daily_note_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            section_heading: "## Logbook".to_string(),
            tag_prefix: "logbook/".to_string(),
            sync_note_body: true,
            canceled_mark: "c".to_string(),
            use_tab: true,
            tab_size: 4,
            heading_markers: false,
            database_path: None,
            notes_dir: None,
            daily_note_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl Settings {
    pub fn outline_options(&self) -> OutlineOptions {
        OutlineOptions {
            section_heading: self.section_heading.clone(),
            indentation: Indentation {
                use_tab: self.use_tab,
                tab_size: self.tab_size,
            },
            tag_prefix: self.tag_prefix.clone(),
            sync_note_body: self.sync_note_body,
            canceled_mark: self.canceled_mark.clone(),
            heading_markers: self.heading_markers,
        }
    }

    pub fn notes_dir(&self, logbook_dir: &Path) -> PathBuf {
        self.notes_dir
            .clone()
            .unwrap_or_else(|| logbook_dir.join("notes"))
    }
}

/// Load settings from settings.json, defaults when the file is absent
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings: {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&content)
        .with_context(|| format!("Invalid settings file: {}", path.display()))?;
    Ok(settings)
}

pub fn save_settings<P: AsRef<Path>>(path: P, settings: &Settings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    crate::persistence::atomic_write(path, &json)?;
    Ok(())
}
