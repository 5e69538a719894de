use std::sync::Arc;

use tracing::{error, info, warn};

use crate::action::{Reporter, Selector, Severity};
use crate::page::option_text_at;
use crate::page::types::OptionHandle;
use crate::watch::DocumentSource;

/// Sends reports to the log.
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success => info!(severity = "success", "{}", message),
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
    }
}

/// Resolves the handle against the current snapshot and logs the option it
/// lands on. A file on disk has nothing to click.
pub struct SnapshotSelector {
    document: Arc<dyn DocumentSource>,
}

impl SnapshotSelector {
    pub fn new(document: Arc<dyn DocumentSource>) -> Self {
        Self { document }
    }
}

impl Selector for SnapshotSelector {
    fn select(&self, handle: OptionHandle) {
        let html = match self.document.snapshot() {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "could not read page to select option");
                return;
            }
        };
        match option_text_at(&html, handle) {
            Some(text) => info!(
                selector = handle.selector,
                index = handle.index,
                option = %text,
                "option selected"
            ),
            None => warn!(
                selector = handle.selector,
                index = handle.index,
                "option no longer on the page"
            ),
        }
    }
}
