// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::warn;

/// Enclosure media types a feed can advertise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    M4a,
    Mp3,
    M4v,
    Mp4,
    Mov,
}

/// Extension lookup table; order matters, the first entry is the fallback
const MEDIA_TABLE: [(&str, MediaType); 5] = [
    ("m4a", MediaType::M4a),
    ("mp3", MediaType::Mp3),
    ("m4v", MediaType::M4v),
    ("mp4", MediaType::Mp4),
    ("mov", MediaType::Mov),
];

impl MediaType {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::M4a => "audio/x-m4a",
            Self::Mp3 => "audio/mpeg",
            Self::M4v => "video/x-m4v",
            Self::Mp4 => "video/mp4",
            Self::Mov => "video/quicktime",
        }
    }

    /// Look the URL's trailing extension up in the table
    ///
    /// Query strings and fragments are ignored; matching is case-insensitive.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();

        MEDIA_TABLE
            .iter()
            .find(|(ext, _)| path.ends_with(ext))
            .map(|(_, media_type)| *media_type)
    }
}

/// Media type for an enclosure URL, falling back to the first table entry
pub fn enclosure_media_type(url: &str) -> MediaType {
    MediaType::from_url(url).unwrap_or_else(|| {
        let fallback = MEDIA_TABLE[0].1;
        warn!(
            url,
            fallback = fallback.mime_type(),
            "URL matches no known media type, using default"
        );
        fallback
    })
}
