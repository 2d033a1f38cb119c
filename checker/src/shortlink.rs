use crate::types::ShortLinkId;
use url::{Url, form_urlencoded};

/// Share ids in public links carry a leading version digit the API does not expect.
const VERSION_PREFIX: char = '1';

const PATH_MARKER: &str = "/s/";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ExtractError {
    #[error("Could not extract short URL from link")]
    Unparseable,
}

/// Recovers the API-facing share id from a share link.
///
/// The `surl` query parameter wins over a `/s/<token>` path segment. Whichever
/// is found, a leading `1` is dropped as long as something remains after it.
pub fn extract_short_id(url: &str) -> Result<ShortLinkId, ExtractError> {
    let candidate = surl_param(url)
        .filter(|surl| !surl.is_empty())
        .or_else(|| path_token(url).map(String::from))
        .ok_or(ExtractError::Unparseable)?;

    Ok(ShortLinkId::new(strip_version_prefix(&candidate)))
}

fn surl_param(url: &str) -> Option<String> {
    let pairs = match Url::parse(url) {
        Ok(parsed) => parsed.query_pairs().into_owned().collect::<Vec<_>>(),
        // Not an absolute URL, decode the raw query the same way.
        Err(_) => {
            let (_, query) = url.split_once('?')?;
            let query = query.split('#').next().unwrap_or_default();
            form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect()
        }
    };

    pairs
        .into_iter()
        .find(|(key, _)| key == "surl")
        .map(|(_, value)| value)
}

fn path_token(url: &str) -> Option<&str> {
    url.match_indices(PATH_MARKER).find_map(|(idx, _)| {
        let rest = &url[idx + PATH_MARKER.len()..];
        let end = rest
            .find(['/', '?', '&', '#'])
            .unwrap_or(rest.len());
        let token = &rest[..end];
        (!token.is_empty()).then_some(token)
    })
}

fn strip_version_prefix(candidate: &str) -> &str {
    match candidate.strip_prefix(VERSION_PREFIX) {
        Some(rest) if !rest.is_empty() => rest,
        _ => candidate,
    }
}
