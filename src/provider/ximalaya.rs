// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    CatalogClient, EpisodeDetail, NO_DESCRIPTION, PageErrorPolicy, Pagination, TrackPage,
    fetch_json,
};
use crate::error::CatalogError;
use crate::http::HttpClient;
use crate::model::{Episode, Provider, ShowMetadata};

const HOST: &str = "www.ximalaya.com";
const DEFAULT_BASE_URL: &str = "https://www.ximalaya.com";
const SITE_URL: &str = "https://www.ximalaya.com";

const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_LAYOUT: &str = "%Y-%m-%d";

/// Envelope code for a successful call
const SUCCESS_CODE: i64 = 200;

/// The album endpoint exposes no creation date; assume two years before the last update
const ASSUMED_AGE_MONTHS: u32 = 24;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    #[serde(default)]
    ret: i64,
    #[serde(default)]
    data: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AlbumData {
    main_info: MainInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MainInfo {
    cover: String,
    album_title: String,
    crumbs: Crumbs,
    update_date: String,
    rich_intro: String,
    detail_rich_intro: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Crumbs {
    subcategory_code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TrackListData {
    tracks_audio_play: Vec<Track>,
    has_more: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Track {
    track_id: i64,
    track_name: String,
    track_url: String,
    track_cover_path: String,
    duration: u32,
    src: Option<String>,
    album_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TrackPageData {
    track_info: TrackInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TrackInfo {
    rich_intro: String,
    draft: String,
    last_update: String,
}

/// Choose an episode description: rich intro, then draft, then the sentinel
pub fn pick_description(rich_intro: &str, draft: &str) -> String {
    if !rich_intro.is_empty() {
        rich_intro.to_string()
    } else if !draft.is_empty() {
        draft.to_string()
    } else {
        NO_DESCRIPTION.to_string()
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_LAYOUT)
        .ok()
        .map(|dt| dt.and_utc())
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value, DATE_LAYOUT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Protocol-relative paths (`//imagev2...`) are served over plain HTTP
fn absolute_http(path: &str) -> String {
    format!("http:{path}")
}

fn check_code(url: &str, code: i64) -> Result<(), CatalogError> {
    if code == SUCCESS_CODE {
        Ok(())
    } else {
        Err(CatalogError::UnexpectedCode {
            url: url.to_string(),
            code,
        })
    }
}

/// Catalog client for ximalaya.com albums
pub struct XimalayaClient<C> {
    http: C,
    base_url: String,
}

impl<C: HttpClient> XimalayaClient<C> {
    pub fn new(http: C) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (e.g. a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn album_url(&self, show_id: &str) -> String {
        format!("{}/revision/album?albumId={}", self.base_url, show_id)
    }

    fn track_list_url(&self, show_id: &str, page: u32) -> String {
        format!(
            "{}/revision/play/album?albumId={}&pageNum={}",
            self.base_url, show_id, page
        )
    }

    fn track_info_url(&self, track_id: &str) -> String {
        format!(
            "{}/revision/track/trackPageInfo?trackId={}",
            self.base_url, track_id
        )
    }
}

#[async_trait]
impl<C: HttpClient> CatalogClient for XimalayaClient<C> {
    fn provider(&self) -> Provider {
        Provider::Ximalaya
    }

    fn page_error_policy(&self) -> PageErrorPolicy {
        PageErrorPolicy::Abort
    }

    async fn fetch_show_meta(
        &self,
        show_id: &str,
        source_url: &str,
    ) -> Result<ShowMetadata, CatalogError> {
        let url = self.album_url(show_id);
        let envelope: Envelope<AlbumData> = fetch_json(&self.http, &url, HOST).await?;
        check_code(&url, envelope.ret)?;
        let info = envelope.data.main_info;

        let last_build_date = parse_date(&info.update_date).unwrap_or_else(|| {
            warn!(show_id, update_date = %info.update_date, "unparseable album update date");
            Utc::now()
        });

        let mut meta = ShowMetadata::new(Provider::Ximalaya, show_id, source_url);
        meta.title = info.album_title;
        meta.description = info.rich_intro;
        if !info.crumbs.subcategory_code.is_empty() {
            meta.categories.push(info.crumbs.subcategory_code);
        }
        meta.cover_url = absolute_http(&info.cover);
        meta.last_build_date = last_build_date;
        meta.pub_date = last_build_date
            .checked_sub_months(Months::new(ASSUMED_AGE_MONTHS))
            .unwrap_or(last_build_date);
        meta.summary = Some(info.detail_rich_intro).filter(|s| !s.is_empty());

        Ok(meta)
    }

    async fn fetch_track_page(
        &self,
        show: &ShowMetadata,
        page: u32,
    ) -> Result<TrackPage, CatalogError> {
        debug!(show_id = %show.id, page, "fetching ximalaya track list");

        let url = self.track_list_url(&show.id, page);
        let envelope: Envelope<TrackListData> = fetch_json(&self.http, &url, HOST).await?;
        check_code(&url, envelope.ret)?;

        let fetched_at = Utc::now();
        let episodes = envelope
            .data
            .tracks_audio_play
            .into_iter()
            .map(|track| Episode {
                id: track.track_id.to_string(),
                show_id: show.id.clone(),
                show_title: if track.album_name.is_empty() {
                    show.title.clone()
                } else {
                    track.album_name
                },
                title: track.track_name,
                pub_date: fetched_at,
                description: String::new(),
                link: format!("{SITE_URL}{}", track.track_url),
                image_url: absolute_http(&track.track_cover_path),
                duration: track.duration,
                source_url: track.src.unwrap_or_default(),
            })
            .collect();

        Ok(TrackPage {
            episodes,
            pagination: Pagination::HasMore(envelope.data.has_more),
        })
    }

    async fn fetch_episode_detail(
        &self,
        _show: &ShowMetadata,
        episode: &Episode,
    ) -> Result<EpisodeDetail, CatalogError> {
        let url = self.track_info_url(&episode.id);
        let envelope: Envelope<TrackPageData> = fetch_json(&self.http, &url, HOST).await?;
        check_code(&url, envelope.ret)?;
        let info = envelope.data.track_info;

        let pub_date = parse_timestamp(&info.last_update);
        if pub_date.is_none() {
            warn!(track_id = %episode.id, last_update = %info.last_update, "unparseable track update time");
        }

        Ok(EpisodeDetail {
            description: pick_description(&info.rich_intro, &info.draft),
            pub_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHttpClient;
    use chrono::TimeZone;

    const BASE: &str = "https://xm.test";

    const ALBUM_JSON: &str = r#"{
        "ret": 200,
        "data": {
            "albumId": 213124,
            "mainInfo": {
                "cover": "//imagev2.xmcdn.com/group/cover.jpg",
                "albumTitle": "Film Talk",
                "crumbs": { "categoryPinyin": "yingshi", "subcategoryCode": "dianying" },
                "updateDate": "2024-03-10",
                "richIntro": "<p>About films</p>",
                "detailRichIntro": "<p>Long form</p>"
            }
        }
    }"#;

    const TRACKS_JSON: &str = r#"{
        "ret": 200,
        "data": {
            "tracksAudioPlay": [
                {
                    "trackId": 1001,
                    "trackName": "Pilot",
                    "trackUrl": "/yingshi/213124/1001",
                    "trackCoverPath": "//imagev2.xmcdn.com/1001.jpg",
                    "duration": 1800,
                    "src": "https://audio.xmcdn.com/1001.m4a",
                    "albumName": "Film Talk",
                    "albumId": 213124
                }
            ],
            "hasMore": true
        }
    }"#;

    fn client(http: MockHttpClient) -> XimalayaClient<MockHttpClient> {
        XimalayaClient::new(http).with_base_url(BASE)
    }

    fn meta() -> ShowMetadata {
        let mut meta = ShowMetadata::new(
            Provider::Ximalaya,
            "213124",
            "https://www.ximalaya.com/yingshi/213124/",
        );
        meta.title = "Film Talk".to_string();
        meta
    }

    #[test]
    fn rich_intro_wins_over_draft() {
        assert_eq!(pick_description("Y", "X"), "Y");
        assert_eq!(pick_description("Y", ""), "Y");
    }

    #[test]
    fn draft_used_when_rich_intro_empty() {
        assert_eq!(pick_description("", "X"), "X");
    }

    #[test]
    fn sentinel_when_both_empty() {
        assert_eq!(pick_description("", ""), NO_DESCRIPTION);
    }

    #[test]
    fn parses_both_date_layouts() {
        assert_eq!(
            parse_timestamp("2024-03-10 08:30:00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap())
        );
        assert_eq!(
            parse_date("2024-03-10"),
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("2024-03-10"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[tokio::test]
    async fn maps_album_metadata() {
        let http = MockHttpClient::new().with_body(
            "https://xm.test/revision/album?albumId=213124",
            ALBUM_JSON,
        );

        let meta = client(http)
            .fetch_show_meta("213124", "https://www.ximalaya.com/yingshi/213124/")
            .await
            .unwrap();

        assert_eq!(meta.provider, Provider::Ximalaya);
        assert_eq!(meta.id, "213124");
        assert_eq!(meta.title, "Film Talk");
        assert_eq!(meta.link, "https://www.ximalaya.com/yingshi/213124/");
        assert_eq!(meta.description, "<p>About films</p>");
        assert_eq!(meta.summary.as_deref(), Some("<p>Long form</p>"));
        assert_eq!(meta.categories, vec!["dianying".to_string()]);
        assert_eq!(meta.cover_url, "http://imagev2.xmcdn.com/group/cover.jpg");
        assert_eq!(
            meta.last_build_date,
            Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(
            meta.pub_date,
            Utc.with_ymd_and_hms(2022, 3, 10, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn rejects_non_success_envelope() {
        let http = MockHttpClient::new().with_body(
            "https://xm.test/revision/album?albumId=213124",
            r#"{"ret": 404, "data": {}}"#,
        );

        let result = client(http).fetch_show_meta("213124", "u").await;

        assert!(matches!(
            result,
            Err(CatalogError::UnexpectedCode { code: 404, .. })
        ));
    }

    #[tokio::test]
    async fn maps_track_page() {
        let http = MockHttpClient::new().with_body(
            "https://xm.test/revision/play/album?albumId=213124&pageNum=1",
            TRACKS_JSON,
        );

        let page = client(http).fetch_track_page(&meta(), 1).await.unwrap();

        assert_eq!(page.pagination, Pagination::HasMore(true));
        assert_eq!(page.episodes.len(), 1);

        let ep = &page.episodes[0];
        assert_eq!(ep.id, "1001");
        assert_eq!(ep.show_id, "213124");
        assert_eq!(ep.show_title, "Film Talk");
        assert_eq!(ep.title, "Pilot");
        assert_eq!(ep.link, "https://www.ximalaya.com/yingshi/213124/1001");
        assert_eq!(ep.image_url, "http://imagev2.xmcdn.com/1001.jpg");
        assert_eq!(ep.duration, 1800);
        assert_eq!(ep.source_url, "https://audio.xmcdn.com/1001.m4a");
    }

    #[tokio::test]
    async fn detail_uses_draft_and_last_update() {
        let http = MockHttpClient::new().with_body(
            "https://xm.test/revision/track/trackPageInfo?trackId=1001",
            r#"{"ret": 200, "data": {"trackInfo": {"richIntro": "", "draft": "Show notes", "lastUpdate": "2024-03-09 21:15:00"}}}"#,
        );
        let episode = crate::testing::make_episode("1001", "213124", "Pilot");

        let detail = client(http)
            .fetch_episode_detail(&meta(), &episode)
            .await
            .unwrap();

        assert_eq!(detail.description, "Show notes");
        assert_eq!(
            detail.pub_date,
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 21, 15, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn detail_without_text_gets_sentinel() {
        let http = MockHttpClient::new().with_body(
            "https://xm.test/revision/track/trackPageInfo?trackId=1001",
            r#"{"ret": 200, "data": {"trackInfo": {"richIntro": "", "draft": "", "lastUpdate": "bad"}}}"#,
        );
        let episode = crate::testing::make_episode("1001", "213124", "Pilot");

        let detail = client(http)
            .fetch_episode_detail(&meta(), &episode)
            .await
            .unwrap();

        assert_eq!(detail.description, NO_DESCRIPTION);
        assert_eq!(detail.pub_date, None);
    }

    #[test]
    fn aborts_crawl_on_page_errors() {
        let client = client(MockHttpClient::new());
        assert_eq!(client.page_error_policy(), PageErrorPolicy::Abort);
        assert!(client.page_delay().is_zero());
    }
}
