// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a remote catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Remote returned code {code} for {url}")]
    UnexpectedCode { url: String, code: i64 },

    #[error("Failed to extract text from {url}: {message}")]
    Html { url: String, message: String },
}

/// Errors that can occur in the persistent store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Show not found in store: {0}")]
    ShowNotFound(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to serialize stored field: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while writing a feed document
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to read show from store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to create feed file {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write feed file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: rss::Error,
    },

    #[error("Failed to flush feed file {path}: {source}")]
    FlushFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that stop a crawl before it finishes
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Failed to fetch page {page}: {source}")]
    PageFailed {
        page: u32,
        #[source]
        source: CatalogError,
    },
}

/// Top-level errors for sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Cannot derive a show ID from {0}")]
    InvalidSourceUrl(String),

    #[error("Failed to fetch show metadata: {0}")]
    Metadata(#[source] CatalogError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
