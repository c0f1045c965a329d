use crate::error::LocateError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Things group container, relative to the home directory
pub const GROUP_CONTAINER: &str = "Library/Group Containers/JLMPQHK86H.com.culturedcode.ThingsMac";
pub const DATA_DIR_PREFIX: &str = "ThingsData";
pub const DATABASE_FILE: &str = "Things Database.thingsdatabase/main.sqlite";

/// Resolve the database path: the configured one if given, otherwise probe
/// the Things group container.
pub fn locate_database(configured: Option<&Path>) -> Result<PathBuf, LocateError> {
    if let Some(path) = configured {
        if !path.is_file() {
            return Err(LocateError::MissingDatabase {
                path: path.to_path_buf(),
            });
        }
        return Ok(path.to_path_buf());
    }

    let base = match dirs::home_dir() {
        Some(home) => home.join(GROUP_CONTAINER),
        None => {
            return Err(LocateError::NoDataDirectory {
                base: PathBuf::from("~").join(GROUP_CONTAINER),
            })
        }
    };
    probe_data_directory(&base)
}

/// Find the `ThingsData*` directory under `base` and the database inside it.
///
/// Candidates are taken in name order so the choice is stable.
pub fn probe_data_directory(base: &Path) -> Result<PathBuf, LocateError> {
    let entries = fs::read_dir(base).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => LocateError::NoDataDirectory {
            base: base.to_path_buf(),
        },
        _ => LocateError::Io {
            path: base.to_path_buf(),
            source,
        },
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LocateError::Io {
            path: base.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(DATA_DIR_PREFIX));
        if matches && path.is_dir() {
            candidates.push(path);
        }
    }
    candidates.sort();

    let data_dir = candidates
        .into_iter()
        .next()
        .ok_or_else(|| LocateError::NoDataDirectory {
            base: base.to_path_buf(),
        })?;
    let database = data_dir.join(DATABASE_FILE);
    debug!(path = %database.display(), "probed Things database");

    if !database.is_file() {
        return Err(LocateError::MissingDatabase { path: database });
    }
    Ok(database)
}
