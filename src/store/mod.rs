// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Durable storage for show metadata and episodes.
//!
//! Shows are keyed by show ID and episodes by episode ID, with a secondary
//! index from episode to show for the feed rebuild. Every write is an upsert:
//! the last write for a key wins.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreResult;
use crate::model::{Episode, ShowMetadata};

/// Key-value store for mirrored shows
pub trait Store {
    /// Insert or replace the metadata for `meta.id`
    fn upsert_show(&mut self, meta: &ShowMetadata) -> StoreResult<()>;

    /// Insert or replace a single episode keyed by `episode.id`
    fn upsert_episode(&mut self, episode: &Episode) -> StoreResult<()>;

    /// Fetch show metadata, or `StoreError::ShowNotFound`
    fn find_show(&self, show_id: &str) -> StoreResult<ShowMetadata>;

    /// All episodes of a show in the order they were first stored
    fn find_episodes_by_show(&self, show_id: &str) -> StoreResult<Vec<Episode>>;

    /// Upsert episodes one by one
    ///
    /// The first failure stops the batch. Episodes written before it stay written.
    fn upsert_episodes(&mut self, episodes: &[Episode]) -> StoreResult<()> {
        for episode in episodes {
            self.upsert_episode(episode)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::testing::make_episode;
    use std::collections::HashMap;

    /// Store that fails on a chosen episode ID
    struct FlakyStore {
        episodes: HashMap<String, Episode>,
        fail_on: String,
    }

    impl Store for FlakyStore {
        fn upsert_show(&mut self, _meta: &ShowMetadata) -> StoreResult<()> {
            Ok(())
        }

        fn upsert_episode(&mut self, episode: &Episode) -> StoreResult<()> {
            if episode.id == self.fail_on {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.episodes.insert(episode.id.clone(), episode.clone());
            Ok(())
        }

        fn find_show(&self, show_id: &str) -> StoreResult<ShowMetadata> {
            Err(StoreError::ShowNotFound(show_id.to_string()))
        }

        fn find_episodes_by_show(&self, _show_id: &str) -> StoreResult<Vec<Episode>> {
            Ok(self.episodes.values().cloned().collect())
        }
    }

    #[test]
    fn batch_stops_at_first_failure_without_rollback() {
        let mut store = FlakyStore {
            episodes: HashMap::new(),
            fail_on: "2".to_string(),
        };
        let episodes = vec![
            make_episode("1", "show", "Ep 1"),
            make_episode("2", "show", "Ep 2"),
            make_episode("3", "show", "Ep 3"),
        ];

        let result = store.upsert_episodes(&episodes);

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.episodes.contains_key("1"));
        assert!(!store.episodes.contains_key("2"));
        assert!(!store.episodes.contains_key("3"));
    }
}
