//! Shared state for one scraping run.

use crate::acquisition::http_client::HttpClient;
use crate::config::ScrapeConfig;
use crate::renderer::engines::Engines;

/// What every adapter gets to work with.
pub struct ScrapeEnv {
    pub config: ScrapeConfig,
    pub http: HttpClient,
    pub engines: Engines,
}

impl ScrapeEnv {
    pub fn new(config: ScrapeConfig) -> Self {
        let http = HttpClient::new(&config);
        let engines = Engines::new(&config, http.clone());
        Self {
            config,
            http,
            engines,
        }
    }

    /// Release browsers. Must run on every exit path.
    pub async fn shutdown(&self) {
        self.engines.shutdown().await;
    }
}
