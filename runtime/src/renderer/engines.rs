//! Run-scoped registry of page engines.
//!
//! Browsers are launched lazily, one per [`EngineKind`], on first `acquire`
//! and torn down together by `shutdown` at the end of the run. When no
//! Chromium can be launched the registry hands out the static HTTP engine
//! instead and says so once.

use super::chromium::{find_chromium, ChromiumOptions, ChromiumRenderer};
use super::static_html::StaticRenderer;
use super::Renderer;
use crate::acquisition::http_client::HttpClient;
use crate::config::ScrapeConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Browser flavour an adapter asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineKind {
    #[default]
    Chromium,
    /// Chromium with HTTP/2 disabled.
    ChromiumHttp1,
}

pub struct Engines {
    config: ScrapeConfig,
    browsers: Mutex<HashMap<EngineKind, Arc<ChromiumRenderer>>>,
    static_engine: Arc<StaticRenderer>,
    browser_unavailable: AtomicBool,
}

impl Engines {
    pub fn new(config: &ScrapeConfig, http: HttpClient) -> Self {
        Self {
            config: config.clone(),
            browsers: Mutex::new(HashMap::new()),
            static_engine: Arc::new(StaticRenderer::new(http, config.nav_timeout_ms)),
            browser_unavailable: AtomicBool::new(config.http_only),
        }
    }

    /// The engine to use for `kind`, launching it if needed.
    pub async fn acquire(&self, kind: EngineKind) -> Arc<dyn Renderer> {
        if self.browser_unavailable.load(Ordering::Relaxed) {
            return self.static_engine.clone();
        }

        let mut browsers = self.browsers.lock().await;
        if let Some(browser) = browsers.get(&kind) {
            return browser.clone();
        }

        let Some(executable) = find_chromium(self.config.chromium_path.as_ref()) else {
            tracing::warn!("Chromium not found, falling back to HTTP-only pages");
            self.browser_unavailable.store(true, Ordering::Relaxed);
            return self.static_engine.clone();
        };

        let options = ChromiumOptions {
            executable,
            http1_only: kind == EngineKind::ChromiumHttp1,
            user_agent: self.config.user_agent.clone(),
            locale: self.config.locale.clone(),
        };
        match ChromiumRenderer::launch(options).await {
            Ok(browser) => {
                tracing::info!("launched {kind:?} engine");
                let browser = Arc::new(browser);
                browsers.insert(kind, browser.clone());
                browser as Arc<dyn Renderer>
            }
            Err(e) => {
                tracing::warn!("Chromium failed to start ({e:#}), falling back to HTTP-only pages");
                self.browser_unavailable.store(true, Ordering::Relaxed);
                self.static_engine.clone()
            }
        }
    }

    /// Whether pages are fetched without a browser.
    pub fn is_static(&self) -> bool {
        self.browser_unavailable.load(Ordering::Relaxed)
    }

    /// Close every launched browser.
    pub async fn shutdown(&self) {
        let mut browsers = self.browsers.lock().await;
        for (kind, browser) in browsers.drain() {
            if let Err(e) = browser.shutdown().await {
                tracing::warn!("failed to shut down {kind:?} engine: {e:#}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_only_hands_out_static_engine() {
        let config = ScrapeConfig {
            http_only: true,
            ..ScrapeConfig::default()
        };
        let engines = Engines::new(&config, HttpClient::new(&config));
        assert!(engines.is_static());

        let renderer = engines.acquire(EngineKind::ChromiumHttp1).await;
        let ctx = renderer.new_context().await.unwrap();
        assert!(ctx.execute_js("1").await.is_err());
        ctx.close().await.unwrap();
        engines.shutdown().await;
    }
}
