// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Page-by-page crawl of a show's remote track list.
//!
//! The crawl always fetches page 1. A latest-only show stops there; a
//! full crawl keeps going while the provider says more pages exist,
//! either through an explicit flag or a page count derived from the
//! first successful page. Each episode is enriched with its detail
//! lookup before it is appended, so the in-memory order is
//! page-then-item as the remote returned it.

use tracing::{debug, info, warn};

use crate::error::CrawlError;
use crate::model::{Episode, Show, ShowMetadata};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::provider::{CatalogClient, PageErrorPolicy, Pagination, page_count};

/// Page counters for a finished crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_fetched: u32,
    pub pages_skipped: u32,
}

/// Crawl `show` and append every fetched episode to `show.episodes`
///
/// A page failure either ends the crawl with an error or is skipped,
/// depending on the client's [`PageErrorPolicy`]. A skip needs a known page
/// count, so a failure before the first successful counted page always ends
/// the crawl.
pub async fn crawl(
    client: &dyn CatalogClient,
    show: &mut Show,
    reporter: &SharedProgressReporter,
) -> Result<CrawlStats, CrawlError> {
    let mut stats = CrawlStats::default();
    let mut total_pages: Option<u32> = None;
    let delay = client.page_delay();
    let mut page = 1;

    loop {
        if page > 1 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        reporter.report(ProgressEvent::FetchingPage { page });

        let more = match client.fetch_track_page(&show.metadata, page).await {
            Ok(track_page) => {
                let episode_count = track_page.episodes.len();

                for mut episode in track_page.episodes {
                    enrich(client, &show.metadata, &mut episode).await;
                    reporter.report(ProgressEvent::EpisodeFetched {
                        episode_title: episode.title.clone(),
                    });
                    show.episodes.push(episode);
                }
                stats.pages_fetched += 1;

                let more = match track_page.pagination {
                    Pagination::HasMore(flag) => flag,
                    Pagination::Counted { total, page_size } => {
                        let pages = *total_pages.get_or_insert_with(|| page_count(total, page_size));
                        page < pages
                    }
                };

                debug!(page, episode_count, more, "track page fetched");
                reporter.report(ProgressEvent::PageFetched {
                    page,
                    episode_count,
                    total_pages,
                });
                more
            }
            Err(e) => match (client.page_error_policy(), total_pages) {
                // Without a successful page there is no page count to go on
                (PageErrorPolicy::Abort, _) | (PageErrorPolicy::Skip, None) => {
                    return Err(CrawlError::PageFailed { page, source: e });
                }
                (PageErrorPolicy::Skip, Some(pages)) => {
                    warn!(page, error = %e, "skipping track page");
                    reporter.report(ProgressEvent::PageSkipped {
                        page,
                        error: e.to_string(),
                    });
                    stats.pages_skipped += 1;
                    page < pages
                }
            },
        };

        if !show.fetch_all || !more {
            break;
        }
        page += 1;
    }

    info!(
        show_id = %show.id(),
        episodes = show.episodes.len(),
        pages_fetched = stats.pages_fetched,
        pages_skipped = stats.pages_skipped,
        "crawl finished"
    );

    Ok(stats)
}

/// Merge the detail lookup into `episode`; a failed lookup falls back to the title
async fn enrich(client: &dyn CatalogClient, meta: &ShowMetadata, episode: &mut Episode) {
    match client.fetch_episode_detail(meta, episode).await {
        Ok(detail) => detail.apply(episode),
        Err(e) => {
            warn!(episode_id = %episode.id, error = %e, "episode detail unavailable, using title");
            episode.description = episode.title.clone();
        }
    }
}
