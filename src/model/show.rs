// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::Episode;

/// The platforms a show can be mirrored from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Ximalaya,
    Lizhi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ximalaya => "ximalaya",
            Self::Lizhi => "lizhi",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ximalaya" => Ok(Self::Ximalaya),
            "lizhi" => Ok(Self::Lizhi),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// Show-level metadata, one record per mirrored show
#[derive(Debug, Clone, PartialEq)]
pub struct ShowMetadata {
    pub provider: Provider,
    /// Derived once from the source URL; the join key for every episode
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub categories: Vec<String>,
    pub cover_url: String,
    pub pub_date: DateTime<Utc>,
    pub last_build_date: DateTime<Utc>,
    pub summary: Option<String>,
    /// CDN prefix for relative episode artwork (Lizhi)
    pub cdn_base: Option<String>,
    /// Band/channel ID used to address episode pages (Lizhi)
    pub band: Option<String>,
}

impl ShowMetadata {
    /// A record holding only what is known before the remote metadata arrives
    pub fn new(provider: Provider, id: impl Into<String>, link: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            provider,
            id: id.into(),
            title: String::new(),
            link: link.into(),
            description: String::new(),
            categories: Vec::new(),
            cover_url: String::new(),
            pub_date: now,
            last_build_date: now,
            summary: None,
            cdn_base: None,
            band: None,
        }
    }
}

/// In-memory aggregate for a single sync run
#[derive(Debug, Clone)]
pub struct Show {
    pub metadata: ShowMetadata,
    /// Episodes in page-then-item order as returned by the remote
    pub episodes: Vec<Episode>,
    pub fetch_all: bool,
}

impl Show {
    pub fn new(metadata: ShowMetadata, fetch_all: bool) -> Self {
        Self {
            metadata,
            episodes: Vec::new(),
            fetch_all,
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }
}
