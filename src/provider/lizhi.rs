// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;

use super::{
    CatalogClient, EpisodeDetail, PageErrorPolicy, Pagination, TrackPage, fetch_body, fetch_json,
};
use crate::error::CatalogError;
use crate::http::HttpClient;
use crate::model::{Episode, Provider, ShowMetadata};

const HOST: &str = "www.lizhi.fm";
const DEFAULT_BASE_URL: &str = "http://www.lizhi.fm";

/// Pause between track list pages; the API throttles rapid paging
pub const PAGE_DELAY: Duration = Duration::from_millis(500);

/// Lizhi exposes no category, so every show gets this placeholder
const PLACEHOLDER_CATEGORY: &str = "none";

const DESCRIPTION_SELECTOR: &str = ".desText";

static NUMBERED_CDN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("cdn[0-9]+").expect("valid CDN pattern"));

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserInfoResponse {
    cdn_audio_cover: String,
    cdn_portrait: String,
    radio: Radio,
    user: User,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Radio {
    name: String,
    desc: String,
    create_time: i64,
    band: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct User {
    portrait: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AudioListResponse {
    total: u32,
    size: u32,
    audios: Vec<Audio>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Audio {
    id: String,
    name: String,
    url: String,
    cover: String,
    duration: u32,
    create_time: i64,
}

fn from_epoch_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(millis / 1000, 0).unwrap_or_default()
}

/// Rewrite numbered CDN hosts (`cdn5.lizhi.fm`) to the stable `cdn.lizhi.fm`
pub fn normalize_source_url(url: &str) -> String {
    NUMBERED_CDN.replace_all(url, "cdn").into_owned()
}

/// Text of the description node in an episode page, trimmed
pub fn extract_description(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(DESCRIPTION_SELECTOR) else {
        return String::new();
    };

    document
        .select(&selector)
        .flat_map(|element| element.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Catalog client for lizhi.fm user channels
pub struct LizhiClient<C> {
    http: C,
    base_url: String,
    page_delay: Duration,
}

impl<C: HttpClient> LizhiClient<C> {
    pub fn new(http: C) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_delay: PAGE_DELAY,
        }
    }

    /// Point the client at a different API root (e.g. a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    fn user_info_url(&self, show_id: &str) -> String {
        format!("{}/api/user/info/{}", self.base_url, show_id)
    }

    fn audio_list_url(&self, show_id: &str, page: u32) -> String {
        format!("{}/api/user/audios/{}/{}", self.base_url, show_id, page)
    }

    fn audio_page_url(&self, band: &str, audio_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, band, audio_id)
    }
}

#[async_trait]
impl<C: HttpClient> CatalogClient for LizhiClient<C> {
    fn provider(&self) -> Provider {
        Provider::Lizhi
    }

    fn page_error_policy(&self) -> PageErrorPolicy {
        PageErrorPolicy::Skip
    }

    fn page_delay(&self) -> Duration {
        self.page_delay
    }

    async fn fetch_show_meta(
        &self,
        show_id: &str,
        source_url: &str,
    ) -> Result<ShowMetadata, CatalogError> {
        let url = self.user_info_url(show_id);
        let info: UserInfoResponse = fetch_json(&self.http, &url, HOST).await?;
        let created = from_epoch_millis(info.radio.create_time);

        let mut meta = ShowMetadata::new(Provider::Lizhi, show_id, source_url);
        meta.title = info.radio.name;
        meta.description = info.radio.desc;
        meta.categories = vec![PLACEHOLDER_CATEGORY.to_string()];
        meta.cover_url = format!("{}{}", info.cdn_portrait, info.user.portrait)
            .replacen(".jpg", "_160x160.jpg", 1);
        meta.pub_date = created;
        meta.last_build_date = created;
        meta.cdn_base = Some(info.cdn_audio_cover);
        meta.band = Some(info.radio.band).filter(|b| !b.is_empty());

        Ok(meta)
    }

    async fn fetch_track_page(
        &self,
        show: &ShowMetadata,
        page: u32,
    ) -> Result<TrackPage, CatalogError> {
        debug!(show_id = %show.id, page, "fetching lizhi audio list");

        let url = self.audio_list_url(&show.id, page);
        let list: AudioListResponse = fetch_json(&self.http, &url, HOST).await?;
        let cdn_base = show.cdn_base.as_deref().unwrap_or_default();

        let episodes = list
            .audios
            .into_iter()
            .map(|audio| Episode {
                show_id: show.id.clone(),
                show_title: show.title.clone(),
                pub_date: from_epoch_millis(audio.create_time),
                description: String::new(),
                image_url: format!("{cdn_base}{}", audio.cover),
                duration: audio.duration,
                source_url: normalize_source_url(&audio.url),
                link: audio.url,
                title: audio.name,
                id: audio.id,
            })
            .collect();

        Ok(TrackPage {
            episodes,
            pagination: Pagination::Counted {
                total: list.total,
                page_size: list.size,
            },
        })
    }

    async fn fetch_episode_detail(
        &self,
        show: &ShowMetadata,
        episode: &Episode,
    ) -> Result<EpisodeDetail, CatalogError> {
        let band = show.band.as_deref().unwrap_or_default();
        let url = self.audio_page_url(band, &episode.id);
        let body = fetch_body(&self.http, &url, HOST).await?;
        let html = std::str::from_utf8(&body).map_err(|e| CatalogError::Html {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let mut description = extract_description(html);
        if description.is_empty() {
            debug!(audio_id = %episode.id, "empty description node, using title");
            description = episode.title.clone();
        }

        Ok(EpisodeDetail {
            description,
            pub_date: None,
        })
    }
}
