//! Run configuration read from the environment.

use std::path::PathBuf;

/// Desktop Chrome UA; some storefronts serve stripped pages to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

/// Settings shared by every adapter in one run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Directory receiving the spreadsheet. Created if absent.
    pub output_dir: PathBuf,
    /// Explicit Chromium binary, overriding discovery.
    pub chromium_path: Option<PathBuf>,
    /// Never launch a browser; pages are fetched over plain HTTP.
    pub http_only: bool,
    /// Default navigation budget. Adapters may raise it for slow sites.
    pub nav_timeout_ms: u64,
    /// Wait after clicks and option changes.
    pub settle_ms: u64,
    pub user_agent: String,
    /// Sent as Accept-Language. The supported sites are French storefronts.
    pub locale: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            chromium_path: None,
            http_only: false,
            nav_timeout_ms: 15_000,
            settle_ms: 1_500,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            locale: "fr-FR".to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Defaults overridden by `SIZEGUIDE_*` environment variables.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("SIZEGUIDE_OUTPUT_DIR").filter(|v| !v.is_empty()) {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("SIZEGUIDE_CHROMIUM_PATH").filter(|v| !v.is_empty()) {
            config.chromium_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup("SIZEGUIDE_HTTP_ONLY") {
            config.http_only = matches!(flag.trim(), "1" | "true" | "yes");
        }
        if let Some(ms) = parse_ms(&lookup, "SIZEGUIDE_NAV_TIMEOUT_MS") {
            config.nav_timeout_ms = ms;
        }
        if let Some(ms) = parse_ms(&lookup, "SIZEGUIDE_SETTLE_MS") {
            config.settle_ms = ms;
        }
        if let Some(ua) = lookup("SIZEGUIDE_USER_AGENT").filter(|v| !v.is_empty()) {
            config.user_agent = ua;
        }
        if let Some(locale) = lookup("SIZEGUIDE_LOCALE").filter(|v| !v.is_empty()) {
            config.locale = locale;
        }
        config
    }
}

fn parse_ms(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(ms) => Some(ms),
        Err(_) => {
            tracing::warn!("ignoring {key}={raw:?}: not a number of milliseconds");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::from_lookup(lookup(&[]));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(!config.http_only);
        assert_eq!(config.locale, "fr-FR");
        assert!(config.chromium_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ScrapeConfig::from_lookup(lookup(&[
            ("SIZEGUIDE_OUTPUT_DIR", "/tmp/out"),
            ("SIZEGUIDE_HTTP_ONLY", "1"),
            ("SIZEGUIDE_NAV_TIMEOUT_MS", "25000"),
            ("SIZEGUIDE_SETTLE_MS", "oops"),
            ("SIZEGUIDE_LOCALE", "en-GB"),
        ]));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(config.http_only);
        assert_eq!(config.nav_timeout_ms, 25_000);
        assert_eq!(config.settle_ms, 1_500);
        assert_eq!(config.locale, "en-GB");
    }
}
