use std::path::PathBuf;
use thiserror::Error;

/// Which fetch loop failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Tasks,
    Subtasks,
    Projects,
    Headings,
}

impl FetchStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Subtasks => "subtasks",
            Self::Projects => "projects",
            Self::Headings => "headings",
        }
    }
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Malformed rows that cannot be merged into the hierarchy
#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("task row {row} has no identifier")]
    MissingTaskId { row: usize },
    #[error("checklist item {checklist_item:?} has no owning task identifier")]
    MissingChecklistTaskId { checklist_item: String },
}

/// Failure to find the Things database on disk
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no ThingsData directory under {}", base.display())]
    NoDataDirectory { base: PathBuf },
    #[error("Things database not found at {}", path.display())]
    MissingDatabase { path: PathBuf },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("fetch {stage} failed")]
    Fetch {
        stage: FetchStage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Locate(#[from] LocateError),
}

impl SyncError {
    pub fn fetch<E>(stage: FetchStage, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Fetch {
            stage,
            source: Box::new(source),
        }
    }
}
