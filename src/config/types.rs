use serde::Deserialize;

/// Main configuration structure for pagegrep
///
/// Read-only after the scanner is constructed; every worker sees the same
/// snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scan: ScanConfig,
    pub transport: TransportConfig,
}

/// Scan behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Number of worker tasks executing downloads and parses
    #[serde(rename = "worker-count")]
    pub worker_count: u32,

    /// Term whose occurrences are counted on every page
    #[serde(rename = "search-term")]
    pub search_term: String,

    /// Absolute URL the scan starts from
    #[serde(rename = "starting-url")]
    pub starting_url: String,

    /// Maximum total number of URLs ever admitted for crawling
    #[serde(rename = "max-urls")]
    pub max_urls: usize,
}

/// Transport (HTTP) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Total request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Connection establishment timeout (milliseconds)
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    format!("pagegrep/{}", env!("CARGO_PKG_VERSION"))
}
