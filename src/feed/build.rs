// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rss::extension::itunes::{ITunesChannelExtension, ITunesItemExtension};
use rss::{Category, Channel, Enclosure, Guid, Image, Item};
use tracing::info;

use super::media::enclosure_media_type;
use crate::error::FeedError;
use crate::model::{Episode, ShowMetadata};
use crate::store::Store;

/// Enclosure sizes are not known without downloading the media
const UNKNOWN_LENGTH: &str = "0";

/// Where a rebuilt feed ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOutput {
    pub path: PathBuf,
    pub item_count: usize,
}

/// `<show_id>.xml` inside `output_dir`, with the ID made safe as a file name
pub fn feed_path(output_dir: &Path, show_id: &str) -> PathBuf {
    output_dir.join(format!("{}.xml", sanitize_filename::sanitize(show_id)))
}

/// Build the RSS channel for a show and its episodes, in the given order
pub fn build_channel(meta: &ShowMetadata, episodes: &[Episode]) -> Channel {
    let mut channel = Channel::default();
    channel.set_title(meta.title.clone());
    channel.set_link(meta.link.clone());
    channel.set_description(meta.description.clone());
    channel.set_pub_date(meta.pub_date.to_rfc2822());
    channel.set_last_build_date(meta.last_build_date.to_rfc2822());

    if let Some(first) = meta.categories.first() {
        let mut category = Category::default();
        category.set_name(first.clone());
        channel.set_categories(vec![category]);
    }

    if !meta.cover_url.is_empty() {
        let mut image = Image::default();
        image.set_url(meta.cover_url.clone());
        image.set_title(meta.title.clone());
        image.set_link(meta.link.clone());
        channel.set_image(image);
    }

    let mut itunes = ITunesChannelExtension::default();
    itunes.set_image(Some(meta.cover_url.clone()).filter(|url| !url.is_empty()));
    itunes.set_summary(meta.summary.clone());
    channel.set_itunes_ext(itunes);

    channel.set_items(episodes.iter().map(build_item).collect::<Vec<_>>());
    channel
}

fn build_item(episode: &Episode) -> Item {
    let mut enclosure = Enclosure::default();
    enclosure.set_url(episode.source_url.clone());
    enclosure.set_length(UNKNOWN_LENGTH);
    enclosure.set_mime_type(enclosure_media_type(&episode.source_url).mime_type());

    let mut guid = Guid::default();
    guid.set_value(episode.id.clone());
    guid.set_permalink(false);

    let mut itunes = ITunesItemExtension::default();
    itunes.set_image(Some(episode.image_url.clone()).filter(|url| !url.is_empty()));
    itunes.set_duration(episode.formatted_duration());

    let mut item = Item::default();
    item.set_title(episode.title.clone());
    item.set_link(episode.link.clone());
    item.set_description(episode.description.clone());
    item.set_pub_date(episode.pub_date.to_rfc2822());
    item.set_guid(guid);
    item.set_enclosure(enclosure);
    item.set_itunes_ext(itunes);
    item
}

/// Regenerate the feed file for `show_id` from what the store holds
///
/// The file is recreated from scratch every time. No network access.
pub fn rebuild_feed<S: Store + ?Sized>(
    store: &S,
    show_id: &str,
    output_dir: &Path,
) -> Result<FeedOutput, FeedError> {
    let meta = store.find_show(show_id)?;
    let episodes = store.find_episodes_by_show(show_id)?;
    let channel = build_channel(&meta, &episodes);

    std::fs::create_dir_all(output_dir).map_err(|e| FeedError::CreateFailed {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let path = feed_path(output_dir, show_id);
    write_channel(&channel, &path)?;

    info!(show_id, path = %path.display(), items = episodes.len(), "feed written");

    Ok(FeedOutput {
        path,
        item_count: episodes.len(),
    })
}

fn write_channel(channel: &Channel, path: &Path) -> Result<(), FeedError> {
    let file = File::create(path).map_err(|e| FeedError::CreateFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let writer = channel
        .write_to(BufWriter::new(file))
        .map_err(|e| FeedError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    writer.into_inner().map_err(|e| FeedError::FlushFailed {
        path: path.to_path_buf(),
        source: e.into_error(),
    })?;

    Ok(())
}
