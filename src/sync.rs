// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use tracing::{error, info};

use crate::crawl::crawl;
use crate::error::SyncError;
use crate::feed::{FeedOutput, rebuild_feed};
use crate::identifier::extract_show_id;
use crate::model::Show;
use crate::policy::decide;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::provider::CatalogClient;
use crate::store::Store;

/// What to sync and where the feed goes
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Show page URL; its last path segment is the show ID
    pub source_url: String,
    /// Ask for a full crawl even if the show is already known
    pub fetch_all: bool,
    pub output_dir: PathBuf,
}

/// Result of a sync operation
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub show_id: String,
    /// The store held the show before this run
    pub known_show: bool,
    /// Whether every page was crawled
    pub fetch_all: bool,
    /// Number of episodes fetched and persisted
    pub episodes: usize,
    pub pages_fetched: u32,
    pub pages_skipped: u32,
    /// The written feed, if rebuilding it succeeded
    pub feed: Option<FeedOutput>,
    /// Why the feed could not be written; the sync itself still counts as done
    pub feed_error: Option<String>,
}

/// Mirror one show into the store and regenerate its feed
///
/// This is the main entry point for the library. It:
/// 1. Derives the show ID from the source URL
/// 2. Fetches show metadata (failure here ends the run)
/// 3. Decides between a full and a latest-only crawl
/// 4. Crawls the track pages, enriching every episode
/// 5. Upserts the show and its episodes
/// 6. Rebuilds the feed file from the store
pub async fn sync_show<S: Store + ?Sized>(
    client: &dyn CatalogClient,
    store: &mut S,
    request: &SyncRequest,
    reporter: SharedProgressReporter,
) -> Result<SyncResult, SyncError> {
    let show_id = extract_show_id(&request.source_url)
        .ok_or_else(|| SyncError::InvalidSourceUrl(request.source_url.clone()))?;

    reporter.report(ProgressEvent::SyncStarting {
        provider: client.provider(),
        show_id: show_id.clone(),
    });

    let metadata = client
        .fetch_show_meta(&show_id, &request.source_url)
        .await
        .map_err(SyncError::Metadata)?;

    let policy = decide(&*store, &show_id, request.fetch_all)?;

    reporter.report(ProgressEvent::PolicyDecided {
        show_title: metadata.title.clone(),
        known_show: policy.is_known(),
        fetch_all: policy.fetch_all,
    });

    let mut show = Show::new(metadata, policy.fetch_all);
    let stats = crawl(client, &mut show, &reporter).await?;

    reporter.report(ProgressEvent::Persisting {
        episode_count: show.episodes.len(),
    });
    store.upsert_show(&show.metadata)?;
    store.upsert_episodes(&show.episodes)?;

    let (feed, feed_error) = match rebuild_feed(&*store, &show_id, &request.output_dir) {
        Ok(output) => {
            reporter.report(ProgressEvent::FeedWritten {
                path: output.path.clone(),
                item_count: output.item_count,
            });
            (Some(output), None)
        }
        Err(e) => {
            error!(show_id = %show_id, error = %e, "failed to rebuild feed");
            reporter.report(ProgressEvent::FeedFailed {
                error: e.to_string(),
            });
            (None, Some(e.to_string()))
        }
    };

    reporter.report(ProgressEvent::SyncCompleted {
        episode_count: show.episodes.len(),
        pages_fetched: stats.pages_fetched,
        pages_skipped: stats.pages_skipped,
    });

    info!(
        show_id = %show_id,
        provider = %client.provider(),
        episodes = show.episodes.len(),
        "sync finished"
    );

    Ok(SyncResult {
        show_id,
        known_show: policy.is_known(),
        fetch_all: policy.fetch_all,
        episodes: show.episodes.len(),
        pages_fetched: stats.pages_fetched,
        pages_skipped: stats.pages_skipped,
        feed,
        feed_error,
    })
}
