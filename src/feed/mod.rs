mod build;
mod media;

pub use build::{FeedOutput, build_channel, feed_path, rebuild_feed};
pub use media::{MediaType, enclosure_media_type};
