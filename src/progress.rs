// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;

use crate::model::Provider;

/// Events emitted during a show sync for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Show metadata is being fetched
    SyncStarting { provider: Provider, show_id: String },

    /// Crawl depth has been decided from the store
    PolicyDecided {
        show_title: String,
        known_show: bool,
        fetch_all: bool,
    },

    /// A track page is being requested
    FetchingPage { page: u32 },

    /// A track page was fetched and its episodes enriched
    PageFetched {
        page: u32,
        episode_count: usize,
        /// Known page count, if the provider reports one
        total_pages: Option<u32>,
    },

    /// A track page failed and was skipped
    PageSkipped { page: u32, error: String },

    /// A single episode was added to the show
    EpisodeFetched { episode_title: String },

    /// Fetched data is being written to the store
    Persisting { episode_count: usize },

    /// The feed document was written
    FeedWritten { path: PathBuf, item_count: usize },

    /// The feed document could not be written
    FeedFailed { error: String },

    /// Sync operation completed
    SyncCompleted {
        episode_count: usize,
        pages_fetched: u32,
        pages_skipped: u32,
    },
}

/// Trait for reporting progress events during synchronization.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
