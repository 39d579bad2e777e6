//! HTTP-only renderer: pages are fetched, never executed.
//!
//! Used when no browser can be launched. Locators, text and attributes work
//! on the served HTML. A click on a link follows its href; other clicks are
//! accepted and change nothing, which suits storefronts that ship their size
//! guide modal in the initial markup. Dropdown selection and JavaScript are
//! unsupported and fail.

use super::{dom, ElementHandle, Locator, NavigationResult, RenderContext, Renderer, WaitPolicy};
use crate::acquisition::http_client::HttpClient;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use scraper::Html;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Renderer backed by plain HTTP requests.
pub struct StaticRenderer {
    http: HttpClient,
    nav_timeout_ms: u64,
    active_count: Arc<AtomicUsize>,
}

impl StaticRenderer {
    pub fn new(http: HttpClient, nav_timeout_ms: u64) -> Self {
        Self {
            http,
            nav_timeout_ms,
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        self.active_count.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(StaticContext {
            http: self.http.clone(),
            nav_timeout_ms: self.nav_timeout_ms,
            url: "about:blank".to_string(),
            html: String::new(),
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// One fetched page. The parsed DOM is not `Send`, so the HTML is kept as
/// text and parsed per query.
pub struct StaticContext {
    http: HttpClient,
    nav_timeout_ms: u64,
    url: String,
    html: String,
    active_count: Arc<AtomicUsize>,
}

impl StaticContext {
    fn with_element<T>(
        &self,
        element: &ElementHandle,
        f: impl FnOnce(&scraper::ElementRef<'_>) -> T,
    ) -> Result<T> {
        let document = Html::parse_document(&self.html);
        let el = dom::nth(&document, &element.locator, element.index)?;
        Ok(f(&el))
    }
}

#[async_trait]
impl RenderContext for StaticContext {
    async fn navigate(
        &mut self,
        url: &str,
        _wait: WaitPolicy,
        timeout_ms: u64,
    ) -> Result<NavigationResult> {
        let start = Instant::now();
        let resp = self.http.get(url, timeout_ms).await?;
        self.url = resp.final_url.clone();
        self.html = resp.body;

        Ok(NavigationResult {
            final_url: resp.final_url,
            status: resp.status,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn locate(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let document = Html::parse_document(&self.html);
        let count = dom::resolve(&document, locator)?.len();
        Ok((0..count)
            .map(|index| ElementHandle {
                locator: locator.clone(),
                index,
            })
            .collect())
    }

    async fn is_visible(&self, element: &ElementHandle, _timeout_ms: u64) -> Result<bool> {
        self.with_element(element, dom::is_visible)
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<()> {
        let Some(href) = self.with_element(element, dom::link_target)? else {
            tracing::debug!("static click on {:?} has no effect", element.locator);
            return Ok(());
        };
        let base = url::Url::parse(&self.url).context("current page has no base URL")?;
        let Some(target) = sizeguide_core::links::resolve_href(&base, &href) else {
            return Ok(());
        };
        self.navigate(target.as_str(), WaitPolicy::DomContentLoaded, self.nav_timeout_ms)
            .await?;
        Ok(())
    }

    async fn text_content(&self, element: &ElementHandle) -> Result<String> {
        self.with_element(element, |el| el.text().collect::<String>())
    }

    async fn get_attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        self.with_element(element, |el| el.value().attr(name).map(str::to_string))
    }

    async fn inner_html(&self, element: &ElementHandle) -> Result<String> {
        self.with_element(element, |el| el.inner_html())
    }

    async fn select_option(&mut self, _control: &ElementHandle, label: &str) -> Result<()> {
        bail!("cannot select {label:?}: dropdowns need a browser")
    }

    async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
        bail!("JavaScript is not available without a browser")
    }

    async fn get_html(&self) -> Result<String> {
        Ok(self.html.clone())
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn settle(&self, _ms: u64) {}

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn site() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/derby"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body>
                <h1 data-id="derby">Derby Noir</h1>
                <a class="guide" href="/pages/guide"><span>Guide des tailles</span></a>
                <select><option>Europe</option><option>UK</option></select>
                </body></html>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pages/guide"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<table><tr><td>EU</td><td>40</td></tr></table>"),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_static_context_reads_and_follows_links() {
        let server = site().await;
        let renderer = StaticRenderer::new(HttpClient::new(&ScrapeConfig::default()), 5_000);
        let mut ctx = renderer.new_context().await.unwrap();
        assert_eq!(renderer.active_contexts(), 1);

        let nav = ctx
            .navigate(
                &format!("{}/products/derby", server.uri()),
                WaitPolicy::NetworkIdle,
                5_000,
            )
            .await
            .unwrap();
        assert_eq!(nav.status, 200);

        let title = ctx.locate(&Locator::css("h1")).await.unwrap();
        assert_eq!(ctx.text_content(&title[0]).await.unwrap(), "Derby Noir");
        assert_eq!(
            ctx.get_attribute(&title[0], "data-id").await.unwrap().as_deref(),
            Some("derby")
        );

        let select = ctx.locate(&Locator::css("select")).await.unwrap();
        assert!(ctx.inner_html(&select[0]).await.unwrap().contains("<option>UK</option>"));
        assert!(ctx.select_option(&select[0], "UK").await.is_err());
        assert!(ctx.execute_js("1 + 1").await.is_err());

        let trigger = ctx.locate(&Locator::text("guide des tailles")).await.unwrap();
        assert!(ctx.is_visible(&trigger[0], 0).await.unwrap());
        ctx.click(&trigger[0]).await.unwrap();
        assert!(ctx.get_url().await.unwrap().ends_with("/pages/guide"));
        assert!(ctx.get_html().await.unwrap().contains("<td>40</td>"));

        ctx.close().await.unwrap();
        assert_eq!(renderer.active_contexts(), 0);
    }
}
