// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::initialize_schema;
use crate::error::{StoreError, StoreResult};
use crate::model::{Episode, Provider, ShowMetadata};

const SHOW_COLUMNS: &str = "id, provider, title, link, description, categories, cover_url, \
     pub_date, last_build_date, summary, cdn_base, band";

const EPISODE_COLUMNS: &str =
    "id, show_id, show_title, title, pub_date, description, link, image_url, duration, source_url";

/// SQLite-backed store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database file at `path`, creating missing parent directories
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// A throwaway database that lives as long as the store
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Number of stored episodes across all shows
    pub fn count_episodes(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM episodes", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn get_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn show_from_row(row: &Row<'_>) -> rusqlite::Result<ShowMetadata> {
    let provider: String = row.get(1)?;
    let categories: String = row.get(5)?;

    Ok(ShowMetadata {
        id: row.get(0)?,
        provider: provider
            .parse::<Provider>()
            .map_err(|e| conversion_error(1, e))?,
        title: row.get(2)?,
        link: row.get(3)?,
        description: row.get(4)?,
        categories: serde_json::from_str(&categories).map_err(|e| conversion_error(5, e))?,
        cover_url: row.get(6)?,
        pub_date: get_time(row, 7)?,
        last_build_date: get_time(row, 8)?,
        summary: row.get(9)?,
        cdn_base: row.get(10)?,
        band: row.get(11)?,
    })
}

fn episode_from_row(row: &Row<'_>) -> rusqlite::Result<Episode> {
    Ok(Episode {
        id: row.get(0)?,
        show_id: row.get(1)?,
        show_title: row.get(2)?,
        title: row.get(3)?,
        pub_date: get_time(row, 4)?,
        description: row.get(5)?,
        link: row.get(6)?,
        image_url: row.get(7)?,
        duration: row.get(8)?,
        source_url: row.get(9)?,
    })
}

impl Store for SqliteStore {
    fn upsert_show(&mut self, meta: &ShowMetadata) -> StoreResult<()> {
        let categories = serde_json::to_string(&meta.categories)?;

        self.conn.execute(
            &format!(
                "INSERT INTO shows ({SHOW_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                    provider = excluded.provider,
                    title = excluded.title,
                    link = excluded.link,
                    description = excluded.description,
                    categories = excluded.categories,
                    cover_url = excluded.cover_url,
                    pub_date = excluded.pub_date,
                    last_build_date = excluded.last_build_date,
                    summary = excluded.summary,
                    cdn_base = excluded.cdn_base,
                    band = excluded.band"
            ),
            params![
                meta.id,
                meta.provider.as_str(),
                meta.title,
                meta.link,
                meta.description,
                categories,
                meta.cover_url,
                meta.pub_date.to_rfc3339(),
                meta.last_build_date.to_rfc3339(),
                meta.summary,
                meta.cdn_base,
                meta.band,
            ],
        )?;
        Ok(())
    }

    fn upsert_episode(&mut self, episode: &Episode) -> StoreResult<()> {
        // ON CONFLICT keeps the original rowid, so feed order stays stable across syncs
        self.conn.execute(
            &format!(
                "INSERT INTO episodes ({EPISODE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    show_id = excluded.show_id,
                    show_title = excluded.show_title,
                    title = excluded.title,
                    pub_date = excluded.pub_date,
                    description = excluded.description,
                    link = excluded.link,
                    image_url = excluded.image_url,
                    duration = excluded.duration,
                    source_url = excluded.source_url"
            ),
            params![
                episode.id,
                episode.show_id,
                episode.show_title,
                episode.title,
                episode.pub_date.to_rfc3339(),
                episode.description,
                episode.link,
                episode.image_url,
                episode.duration,
                episode.source_url,
            ],
        )?;
        Ok(())
    }

    fn find_show(&self, show_id: &str) -> StoreResult<ShowMetadata> {
        self.conn
            .query_row(
                &format!("SELECT {SHOW_COLUMNS} FROM shows WHERE id = ?1"),
                params![show_id],
                show_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::ShowNotFound(show_id.to_string()))
    }

    fn find_episodes_by_show(&self, show_id: &str) -> StoreResult<Vec<Episode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes WHERE show_id = ?1 ORDER BY rowid"
        ))?;

        let episodes = stmt
            .query_map(params![show_id], episode_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(episodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_episode;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn make_meta(id: &str) -> ShowMetadata {
        let mut meta = ShowMetadata::new(Provider::Lizhi, id, format!("http://www.lizhi.fm/user/{id}"));
        meta.title = "Night Radio".to_string();
        meta.description = "Stories after dark".to_string();
        meta.categories = vec!["none".to_string()];
        meta.cover_url = "http://cdn.lizhi.fm/user/p_160x160.jpg".to_string();
        meta.pub_date = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        meta.last_build_date = meta.pub_date;
        meta.cdn_base = Some("http://cdn.lizhi.fm/audio_cover/".to_string());
        meta.band = Some("1234567".to_string());
        meta
    }

    #[test]
    fn missing_show_is_not_found() {
        let store = SqliteStore::in_memory().unwrap();

        let result = store.find_show("nope");

        assert!(matches!(result, Err(StoreError::ShowNotFound(id)) if id == "nope"));
    }

    #[test]
    fn show_survives_a_write_and_read() {
        let mut store = SqliteStore::in_memory().unwrap();
        let meta = make_meta("42");

        store.upsert_show(&meta).unwrap();

        assert_eq!(store.find_show("42").unwrap(), meta);
    }

    #[test]
    fn show_upsert_overwrites() {
        let mut store = SqliteStore::in_memory().unwrap();
        let mut meta = make_meta("42");
        store.upsert_show(&meta).unwrap();

        meta.title = "Renamed".to_string();
        meta.band = None;
        store.upsert_show(&meta).unwrap();

        let stored = store.find_show("42").unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.band, None);
    }

    #[test]
    fn episode_upsert_is_last_write_wins() {
        let mut store = SqliteStore::in_memory().unwrap();
        let first = make_episode("5001", "42", "Original title");
        let mut second = first.clone();
        second.title = "Updated title".to_string();
        second.duration = 999;

        store.upsert_episode(&first).unwrap();
        store.upsert_episode(&second).unwrap();

        let episodes = store.find_episodes_by_show("42").unwrap();
        assert_eq!(store.count_episodes().unwrap(), 1);
        assert_eq!(episodes, vec![second]);
    }

    #[test]
    fn episodes_come_back_in_insertion_order() {
        let mut store = SqliteStore::in_memory().unwrap();
        let episodes = vec![
            make_episode("300", "42", "Newest"),
            make_episode("100", "42", "Oldest"),
            make_episode("200", "42", "Middle"),
        ];

        store.upsert_episodes(&episodes).unwrap();
        // Re-upserting the first one must not move it to the end
        store.upsert_episode(&episodes[0]).unwrap();

        let titles: Vec<_> = store
            .find_episodes_by_show("42")
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Newest", "Oldest", "Middle"]);
    }

    #[test]
    fn episode_lookup_is_scoped_to_show() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .upsert_episodes(&[
                make_episode("1", "42", "Mine"),
                make_episode("2", "43", "Theirs"),
            ])
            .unwrap();

        let episodes = store.find_episodes_by_show("42").unwrap();

        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].title, "Mine");
        assert!(store.find_episodes_by_show("44").unwrap().is_empty());
    }

    #[test]
    fn file_store_persists_between_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("podcasts.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.upsert_show(&make_meta("42")).unwrap();
            store
                .upsert_episode(&make_episode("1", "42", "Ep 1"))
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.find_show("42").unwrap().title, "Night Radio");
        assert_eq!(store.find_episodes_by_show("42").unwrap().len(), 1);
    }

    #[test]
    fn open_creates_missing_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("nested").join("podcasts.db");

        let store = SqliteStore::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.count_episodes().unwrap(), 0);
    }

    #[test]
    fn open_under_a_regular_file_is_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "plain file").unwrap();

        let result = SqliteStore::open(&blocker.join("podcasts.db"));

        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
