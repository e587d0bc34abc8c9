// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remote catalog clients, one per supported platform.
//!
//! Every platform exposes the same three calls: show metadata, a page of
//! tracks, and a per-track detail lookup used to enrich each episode. The
//! platforms differ in how they signal further pages and in how a failed
//! page affects the rest of a crawl, so both are reported as data rather
//! than baked into the crawl loop.

mod lizhi;
mod ximalaya;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::CatalogError;
use crate::http::HttpClient;
use crate::model::{Episode, Provider, ShowMetadata};

pub use lizhi::{LizhiClient, extract_description, normalize_source_url};
pub use ximalaya::{XimalayaClient, pick_description};

/// Description used when a platform offers no text for an episode
pub const NO_DESCRIPTION: &str = "no description provided";

/// How a platform tells the crawler whether more pages exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Explicit "more pages" flag
    HasMore(bool),
    /// Total item count and page size; the page count is derived
    Counted { total: u32, page_size: u32 },
}

/// What a failed page fetch means for the rest of the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageErrorPolicy {
    /// Stop the crawl and fail the run
    Abort,
    /// Log the failure and move on to the next page
    Skip,
}

/// One page of a show's track list, already mapped into episodes
#[derive(Debug, Clone)]
pub struct TrackPage {
    pub episodes: Vec<Episode>,
    pub pagination: Pagination,
}

/// Secondary per-episode data merged in by the crawler
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeDetail {
    pub description: String,
    /// Replaces the episode's publish date when the detail carries one
    pub pub_date: Option<DateTime<Utc>>,
}

impl EpisodeDetail {
    pub fn apply(self, episode: &mut Episode) {
        episode.description = self.description;
        if let Some(pub_date) = self.pub_date {
            episode.pub_date = pub_date;
        }
    }
}

/// A platform's remote catalog
#[async_trait]
pub trait CatalogClient: Send + Sync {
    fn provider(&self) -> Provider;

    fn page_error_policy(&self) -> PageErrorPolicy;

    /// Pause inserted between consecutive page fetches
    fn page_delay(&self) -> Duration {
        Duration::ZERO
    }

    /// Fetch show-level metadata; `source_url` becomes the show link
    async fn fetch_show_meta(
        &self,
        show_id: &str,
        source_url: &str,
    ) -> Result<ShowMetadata, CatalogError>;

    /// Fetch one page (1-based) of the show's tracks
    async fn fetch_track_page(
        &self,
        show: &ShowMetadata,
        page: u32,
    ) -> Result<TrackPage, CatalogError>;

    /// Fetch the description (and possibly a better publish date) for one episode
    async fn fetch_episode_detail(
        &self,
        show: &ShowMetadata,
        episode: &Episode,
    ) -> Result<EpisodeDetail, CatalogError>;
}

/// Number of pages needed to hold `total` items at `page_size` per page
///
/// Always at least one page, so an empty show still gets its first page fetched.
pub fn page_count(total: u32, page_size: u32) -> u32 {
    if page_size == 0 || total < page_size {
        1
    } else if total % page_size == 0 {
        total / page_size
    } else {
        total / page_size + 1
    }
}

/// GET `url` and hand back the body if the status is 200
pub(crate) async fn fetch_body<C: HttpClient + ?Sized>(
    http: &C,
    url: &str,
    host: &'static str,
) -> Result<bytes::Bytes, CatalogError> {
    let response = http
        .get(url, host)
        .await
        .map_err(|e| CatalogError::Network {
            url: url.to_string(),
            source: e,
        })?;

    if !response.is_success() {
        return Err(CatalogError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }

    Ok(response.body)
}

/// GET `url` and decode the JSON envelope
pub(crate) async fn fetch_json<C: HttpClient + ?Sized, T: DeserializeOwned>(
    http: &C,
    url: &str,
    host: &'static str,
) -> Result<T, CatalogError> {
    let body = fetch_body(http, url, host).await?;
    serde_json::from_slice(&body).map_err(|e| CatalogError::Decode {
        url: url.to_string(),
        source: e,
    })
}
