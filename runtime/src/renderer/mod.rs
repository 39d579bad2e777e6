//! Renderer abstraction for page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over the
//! page engine: headless Chromium via chromiumoxide, or a static engine that
//! fetches HTML over plain HTTP when no browser is available.

pub mod chromium;
pub mod dom;
pub mod engines;
pub mod static_html;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// HTTP status code of the main document.
    pub status: u16,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitPolicy {
    /// The document is parsed.
    #[default]
    DomContentLoaded,
    /// The document is loaded and resource requests have stopped arriving.
    NetworkIdle,
}

/// How to find elements on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector.
    Css { css: String },
    /// Case-insensitive regex over element text; only the innermost matching
    /// elements are returned.
    Text { pattern: String },
    /// CSS selector restricted to elements whose text contains `text`
    /// (case and accent insensitive).
    CssText { css: String, text: String },
}

impl Locator {
    pub fn css(css: impl Into<String>) -> Self {
        Locator::Css { css: css.into() }
    }

    pub fn text(pattern: impl Into<String>) -> Self {
        Locator::Text {
            pattern: pattern.into(),
        }
    }

    pub fn css_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::CssText {
            css: css.into(),
            text: text.into(),
        }
    }
}

/// The `index`-th match of `locator`, valid until the page changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    pub locator: Locator,
    pub index: usize,
}

/// A page engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new isolated context (fresh cookies and storage).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single page context.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(
        &mut self,
        url: &str,
        wait: WaitPolicy,
        timeout_ms: u64,
    ) -> Result<NavigationResult>;
    /// All current matches of `locator`, in document order.
    async fn locate(&self, locator: &Locator) -> Result<Vec<ElementHandle>>;
    /// Whether the element is rendered and visible, waiting up to `timeout_ms`.
    async fn is_visible(&self, element: &ElementHandle, timeout_ms: u64) -> Result<bool>;
    async fn click(&mut self, element: &ElementHandle) -> Result<()>;
    /// Raw text content of the element.
    async fn text_content(&self, element: &ElementHandle) -> Result<String>;
    async fn get_attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>>;
    async fn inner_html(&self, element: &ElementHandle) -> Result<String>;
    /// Select the option labelled `label` in a `<select>` control.
    async fn select_option(&mut self, control: &ElementHandle, label: &str) -> Result<()>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Give the page time to react to the last interaction.
    async fn settle(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Click the first visible element among `candidates`, tried in order.
///
/// Returns whether anything was clicked. Lookup and click failures count as
/// "not there".
pub async fn click_first_visible(
    ctx: &mut dyn RenderContext,
    candidates: &[Locator],
    visible_timeout_ms: u64,
) -> bool {
    for locator in candidates {
        let handles = match ctx.locate(locator).await {
            Ok(handles) => handles,
            Err(e) => {
                tracing::debug!("locator {locator:?} failed: {e:#}");
                continue;
            }
        };
        for (i, handle) in handles.iter().enumerate() {
            // Only the first match gets time to appear.
            let wait = if i == 0 { visible_timeout_ms } else { 0 };
            if !ctx.is_visible(handle, wait).await.unwrap_or(false) {
                continue;
            }
            match ctx.click(handle).await {
                Ok(()) => return true,
                Err(e) => tracing::debug!("click on {locator:?} failed: {e:#}"),
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_wire_format() {
        let json = serde_json::to_value(Locator::css_text("button", "Guide des tailles")).unwrap();
        assert_eq!(json["kind"], "css_text");
        assert_eq!(json["css"], "button");
        assert_eq!(json["text"], "Guide des tailles");

        let back: Locator = serde_json::from_value(serde_json::json!({
            "kind": "text",
            "pattern": "tableau des tailles"
        }))
        .unwrap();
        assert_eq!(back, Locator::text("tableau des tailles"));
    }
}
