pub mod crawl;
pub mod error;
pub mod feed;
pub mod http;
pub mod identifier;
pub mod model;
pub mod policy;
pub mod progress;
pub mod provider;
pub mod store;
pub mod sync;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use crawl::{CrawlStats, crawl};
pub use error::{CatalogError, CrawlError, FeedError, StoreError, SyncError};
pub use feed::{FeedOutput, MediaType, build_channel, enclosure_media_type, rebuild_feed};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use identifier::{extract_show_id, validate_source_url};
pub use model::{Episode, Provider, Show, ShowMetadata};
pub use policy::{ShowState, SyncPolicy, decide};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use provider::{CatalogClient, LizhiClient, PageErrorPolicy, Pagination, XimalayaClient};
pub use store::{SqliteStore, Store};
pub use sync::{SyncRequest, SyncResult, sync_show};
