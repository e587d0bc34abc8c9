// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};

use crate::http::{HttpClient, HttpResponse};
use crate::model::Episode;

/// Canned responses keyed by exact URL; anything else is a 404
#[derive(Default)]
pub struct MockHttpClient {
    responses: HashMap<String, (u16, Bytes)>,
    requests: Mutex<Vec<String>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), (200, Bytes::from(body.to_string())));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), (status, Bytes::new()));
        self
    }

    /// Serve arbitrary bytes, e.g. a body that is not valid UTF-8
    pub fn insert_raw(&mut self, url: &str, status: u16, body: Vec<u8>) {
        self.responses
            .insert(url.to_string(), (status, Bytes::from(body)));
    }

    /// URLs requested so far, in order
    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.requests.lock().unwrap().iter().any(|u| u == url)
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, _host: &'static str) -> Result<HttpResponse, reqwest::Error> {
        self.requests.lock().unwrap().push(url.to_string());

        let (status, body) = self
            .responses
            .get(url)
            .cloned()
            .unwrap_or((404, Bytes::new()));

        Ok(HttpResponse { status, body })
    }
}

pub fn make_episode(id: &str, show_id: &str, title: &str) -> Episode {
    Episode {
        id: id.to_string(),
        show_id: show_id.to_string(),
        show_title: "Test Show".to_string(),
        title: title.to_string(),
        pub_date: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        description: format!("About {title}"),
        link: format!("https://example.com/{id}"),
        image_url: format!("https://example.com/{id}.jpg"),
        duration: 1800,
        source_url: format!("https://cdn.example.com/{id}.m4a"),
    }
}

pub const XIMALAYA_BASE: &str = "https://xm.test";

fn ximalaya_track(id: u32, name: &str) -> String {
    format!(
        r#"{{
            "trackId": {id},
            "trackName": "{name}",
            "trackUrl": "/yingshi/213124/{id}",
            "trackCoverPath": "//imagev2.xmcdn.com/{id}.jpg",
            "duration": 1200,
            "src": "https://audio.xmcdn.com/{id}.m4a",
            "albumName": "Film Talk"
        }}"#
    )
}

fn ximalaya_page(tracks: &[String], has_more: bool) -> String {
    format!(
        r#"{{"ret": 200, "data": {{"tracksAudioPlay": [{}], "hasMore": {has_more}}}}}"#,
        tracks.join(",")
    )
}

/// Album 213124: page 1 holds tracks 1001 and 1002, page 2 holds 1003
pub fn ximalaya_scenario() -> MockHttpClient {
    let mut http = MockHttpClient::new()
        .with_body(
            "https://xm.test/revision/album?albumId=213124",
            r#"{"ret": 200, "data": {"mainInfo": {
                "cover": "//imagev2.xmcdn.com/cover.jpg",
                "albumTitle": "Film Talk",
                "crumbs": {"subcategoryCode": "dianying"},
                "updateDate": "2024-03-10",
                "richIntro": "About films",
                "detailRichIntro": ""
            }}}"#,
        )
        .with_body(
            "https://xm.test/revision/play/album?albumId=213124&pageNum=1",
            &ximalaya_page(
                &[ximalaya_track(1001, "Pilot"), ximalaya_track(1002, "Second")],
                true,
            ),
        )
        .with_body(
            "https://xm.test/revision/play/album?albumId=213124&pageNum=2",
            &ximalaya_page(&[ximalaya_track(1003, "Third")], false),
        );

    for id in [1001, 1002, 1003] {
        http = http.with_body(
            &format!("https://xm.test/revision/track/trackPageInfo?trackId={id}"),
            &format!(
                r#"{{"ret": 200, "data": {{"trackInfo": {{"richIntro": "Notes for {id}", "draft": "", "lastUpdate": "2024-03-0{} 10:00:00"}}}}}}"#,
                id - 1000
            ),
        );
    }

    http
}
