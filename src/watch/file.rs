use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{DocumentSource, Mutation, MutationSource, Subscription};

/// Page snapshot read from an HTML file on disk.
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl DocumentSource for FileDocument {
    fn snapshot(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read document {:?}", self.path))
    }
}

/// Change notifications for one file.
pub struct FileMutations {
    path: PathBuf,
}

impl FileMutations {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl MutationSource for FileMutations {
    fn subscribe(&self) -> Result<Subscription> {
        let file_name: OsString = self
            .path
            .file_name()
            .context("document path has no file name")?
            .to_os_string();
        // Watch the directory: editors and capture tools replace files by rename.
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if !ours {
                    return;
                }
                if let Some(mutation) = classify(&event.kind) {
                    let _ = tx.send(mutation);
                }
            }
            Err(e) => warn!(error = %e, "file watch error"),
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {:?}", dir))?;
        debug!(path = ?self.path, "subscribed to document changes");

        let path = self.path.clone();
        Ok(Subscription::new(rx, move || {
            drop(watcher);
            debug!(path = ?path, "unsubscribed from document changes");
        }))
    }
}

fn classify(kind: &EventKind) -> Option<Mutation> {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(Mutation::Attributes),
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => Some(Mutation::Structure),
        _ => None,
    }
}
