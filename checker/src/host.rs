// Share links are handed out under many mirror domains. The share-info API only
// answers on the canonical host, so links are rewritten before extraction.
use url::Url;

/// Mirror domains known to serve the same share namespace.
pub const ALIAS_DOMAINS: &[&str] = &[
    "terabox.com",
    "www.terabox.com",
    "terabox.app",
    "www.terabox.app",
    "teraboxapp.com",
    "www.teraboxapp.com",
    "1024terabox.com",
    "www.1024terabox.com",
    "1024tera.com",
    "www.1024tera.com",
    "4funbox.com",
    "www.4funbox.com",
    "mirrobox.com",
    "www.mirrobox.com",
    "nephobox.com",
    "www.nephobox.com",
    "momerybox.com",
    "www.momerybox.com",
    "tibibox.com",
    "www.tibibox.com",
    "freeterabox.com",
    "www.freeterabox.com",
    "teraboxlink.com",
    "www.teraboxlink.com",
    "terasharelink.com",
    "www.terasharelink.com",
];

/// Substrings that mark a link as belonging to the provider at all.
pub const KNOWN_DOMAIN_MARKERS: &[&str] = &[
    "terabox",
    "1024tera",
    "4funbox",
    "mirrobox",
    "nephobox",
    "momerybox",
    "tibibox",
    "terasharelink",
];

/// Loose check that `url` points at the provider: any known marker, or any of
/// the `extra` domains, appearing anywhere in the link is enough.
pub fn mentions_known_domain<S: AsRef<str>>(url: &str, extra: &[S]) -> bool {
    let url = url.to_ascii_lowercase();
    KNOWN_DOMAIN_MARKERS
        .iter()
        .copied()
        .chain(extra.iter().map(|d| d.as_ref()))
        .any(|marker| url.contains(&marker.to_ascii_lowercase()))
}

/// Rewrites the host of `url` to `target_host` when it is one of `aliases`.
///
/// Anything else, including input that does not parse as a URL, is returned
/// unchanged.
pub fn normalize_host<S: AsRef<str>>(url: &str, target_host: &str, aliases: &[S]) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let is_alias = parsed
        .host_str()
        .is_some_and(|host| aliases.iter().any(|alias| alias.as_ref() == host));

    if !is_alias || parsed.set_host(Some(target_host)).is_err() {
        return url.to_string();
    }

    parsed.to_string()
}
