// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use url::Url;

/// Derive the show ID from a source URL: the last path segment, ignoring a trailing slash
///
/// Returns `None` when there is nothing left after the final `/`.
pub fn extract_show_id(source_url: &str) -> Option<String> {
    let trimmed = source_url.trim_end_matches('/');
    let (_, last) = trimmed.rsplit_once('/')?;

    if last.is_empty() {
        None
    } else {
        Some(last.to_string())
    }
}

/// Check that a source URL is absolute and has at least one path segment
pub fn validate_source_url(source_url: &str) -> Result<Url, String> {
    let url = Url::parse(source_url).map_err(|e| format!("invalid URL '{source_url}': {e}"))?;

    let has_segment = url
        .path_segments()
        .is_some_and(|mut segments| segments.any(|s| !s.is_empty()));

    if has_segment {
        Ok(url)
    } else {
        Err(format!("URL '{source_url}' has no path to take a show ID from"))
    }
}
