use url::Url;

/// Hosts that are never fetched, whatever links to them
const IGNORED_HOSTS: &[&str] = &["www.facebook.com", "plus.google.com"];

/// Path extensions of non-text assets that are never fetched
const IGNORED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "pdf", "png", "svg", "eps"];

/// Returns true if the URL must never be admitted for crawling
///
/// A URL is ignored when its host is on the static ignore list or its path
/// ends in a known non-text asset extension. URLs without an extension are
/// always eligible.
pub fn is_ignored(url: &Url) -> bool {
    if let Some(host) = url.host_str() {
        if IGNORED_HOSTS.contains(&host) {
            return true;
        }
    }

    match path_extension(url) {
        Some(ext) => IGNORED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Extracts the extension of the last path segment, if any
fn path_extension(url: &Url) -> Option<&str> {
    let last_segment = url.path_segments()?.last()?;
    let (stem, ext) = last_segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}
