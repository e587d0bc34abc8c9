// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::Store;

/// Whether the store has seen a show before
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowState {
    Unknown,
    Known,
}

/// Crawl depth for one sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    pub state: ShowState,
    /// Crawl every page rather than only the first
    pub fetch_all: bool,
}

impl SyncPolicy {
    /// A first sync always crawls the full history; a known show honours the request
    pub fn new(state: ShowState, requested_all: bool) -> Self {
        let fetch_all = match state {
            ShowState::Unknown => true,
            ShowState::Known => requested_all,
        };
        Self { state, fetch_all }
    }

    pub fn is_known(&self) -> bool {
        self.state == ShowState::Known
    }
}

/// Decide the crawl policy for `show_id` from what the store already holds
///
/// Only a missing show counts as unknown; any other store failure is returned.
pub fn decide<S: Store + ?Sized>(
    store: &S,
    show_id: &str,
    requested_all: bool,
) -> StoreResult<SyncPolicy> {
    let state = match store.find_show(show_id) {
        Ok(_) => ShowState::Known,
        Err(StoreError::ShowNotFound(_)) => ShowState::Unknown,
        Err(e) => return Err(e),
    };

    let policy = SyncPolicy::new(state, requested_all);
    debug!(show_id, ?state, fetch_all = policy.fetch_all, "sync policy decided");
    Ok(policy)
}
