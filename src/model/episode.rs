// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};

/// A single playable track belonging to a show
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    /// Unique within a provider
    pub id: String,
    /// Secondary index into the show table
    pub show_id: String,
    pub show_title: String,
    pub title: String,
    pub pub_date: DateTime<Utc>,
    pub description: String,
    pub link: String,
    pub image_url: String,
    /// Length in seconds
    pub duration: u32,
    /// Raw media URL used for the enclosure
    pub source_url: String,
}

impl Episode {
    /// Duration rendered as `H:MM:SS` for the iTunes extension
    pub fn formatted_duration(&self) -> String {
        let hours = self.duration / 3600;
        let minutes = (self.duration % 3600) / 60;
        let seconds = self.duration % 60;
        format!("{hours}:{minutes:02}:{seconds:02}")
    }
}
