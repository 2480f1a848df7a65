use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "ManualLink";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_ENRICHMENT_URL: &str = "http://localhost:8750";
const DEFAULT_ENRICHMENT_TIMEOUT_SECS: u64 = 15;

/// Get the application data directory
/// ~/ManualLink/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("ManualLink")
}

/// Where downloaded manuals land
pub fn manuals_dir() -> PathBuf {
    app_data_dir().join("manuals")
}

/// Default path of the sqlite database
pub fn database_path() -> PathBuf {
    app_data_dir().join("manuallink.db")
}

/// Base URL of the enrichment service, overridable via
/// MANUALLINK_ENRICHMENT_URL.
pub fn enrichment_base_url() -> String {
    std::env::var("MANUALLINK_ENRICHMENT_URL")
        .unwrap_or_else(|_| DEFAULT_ENRICHMENT_URL.to_string())
}

/// Per-request timeout for enrichment lookups, overridable via
/// MANUALLINK_ENRICHMENT_TIMEOUT_SECS.
pub fn enrichment_timeout_secs() -> u64 {
    std::env::var("MANUALLINK_ENRICHMENT_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_ENRICHMENT_TIMEOUT_SECS)
}

/// Log filter used when RUST_LOG is not set
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}
