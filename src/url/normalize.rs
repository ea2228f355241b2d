use crate::UrlError;
use url::Url;

/// Normalizes a URL into the canonical form used as the dedup identity key
///
/// Two URLs are the same page for crawling purposes exactly when their
/// normalized string forms are equal.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Reject schemes other than `http` and `https`
/// 3. Require a host
/// 4. Remove the fragment (everything after `#`)
/// 5. Remove the trailing slash (except for the root path `/`)
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use pagegrep::url::normalize_url;
///
/// let url = normalize_url("http://example.com/page/#section").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    // Trailing slash never changes which document is served often enough to
    // matter for dedup; strip it everywhere but the root.
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    Ok(url)
}
