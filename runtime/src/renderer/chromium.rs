//! Chromium-based renderer using chromiumoxide.
//!
//! Every context lives in its own browser context (incognito-like profile),
//! so cookie consents and sessions never leak between page visits. Element
//! lookups run as injected JavaScript that re-resolves the locator on each
//! call; handles are therefore only as stable as the page.

use super::{ElementHandle, Locator, NavigationResult, RenderContext, Renderer, WaitPolicy};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Poll interval for visibility and network-idle waits.
const POLL_MS: u64 = 100;
/// Quiet period after which the network counts as idle.
const IDLE_MS: u64 = 500;

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    // 1. explicit path (SIZEGUIDE_CHROMIUM_PATH)
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.clone());
        }
        tracing::warn!("configured Chromium {} does not exist", path.display());
    }

    // 2. ~/.sizeguide/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".sizeguide/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".sizeguide/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".sizeguide/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".sizeguide/chromium/chrome-linux64/chrome"),
                home.join(".sizeguide/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launch settings for one Chromium instance.
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub executable: PathBuf,
    /// Disable HTTP/2 for sites whose bot detection fingerprints it.
    pub http1_only: bool,
    pub user_agent: String,
    pub locale: String,
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Arc<Mutex<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    options: ChromiumOptions,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance.
    pub async fn launch(options: ChromiumOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(&options.executable)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--lang={}", options.locale));
        if options.http1_only {
            builder = builder.arg("--disable-http2");
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler: Mutex::new(Some(handler)),
            options,
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let (context_id, page) = {
            let mut browser = self.browser.lock().await;
            let context_id = browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await
                .context("failed to create browser context")?;
            let target = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context_id.clone())
                .build()
                .map_err(|e| anyhow!("invalid target params: {e}"))?;
            let page = browser
                .new_page(target)
                .await
                .context("failed to create new page")?;
            (context_id, page)
        };

        let ua = SetUserAgentOverrideParams::builder()
            .user_agent(self.options.user_agent.clone())
            .accept_language(self.options.locale.clone())
            .build()
            .map_err(|e| anyhow!("invalid user agent params: {e}"))?;
        page.execute(ua).await.context("failed to set user agent")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            browser: Arc::clone(&self.browser),
            context_id,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::debug!("browser close failed: {e}");
        }
        let _ = browser.wait().await;
        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page in its own browser context.
pub struct ChromiumContext {
    page: Page,
    browser: Arc<Mutex<Browser>>,
    context_id: BrowserContextId,
    active_count: Arc<AtomicUsize>,
}

/// JavaScript expression applying `action` to the elements matched by
/// `locator`. `action` sees the matches as `els`.
fn locator_script(locator: &Locator, action: &str) -> Result<String> {
    let loc = serde_json::to_string(locator)?;
    Ok(format!(
        r#"(() => {{
  const loc = {loc};
  const norm = s => (s || '').replace(/\s+/g, ' ').trim();
  const fold = s => norm(s).normalize('NFD').replace(/[\u0300-\u036f]/g, '').toLowerCase();
  let els = [];
  if (loc.kind === 'css') {{
    els = Array.from(document.querySelectorAll(loc.css));
  }} else if (loc.kind === 'css_text') {{
    const needle = fold(loc.text);
    els = Array.from(document.querySelectorAll(loc.css)).filter(e => fold(e.textContent).includes(needle));
  }} else {{
    const re = new RegExp(loc.pattern, 'i');
    const skip = ['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE'];
    const hits = Array.from(document.body ? document.body.querySelectorAll('*') : [])
      .filter(e => !skip.includes(e.tagName) && re.test(norm(e.textContent)));
    els = hits.filter(e => !hits.some(o => o !== e && e.contains(o)));
  }}
  {action}
}})()"#
    ))
}

fn element_script(element: &ElementHandle, body: &str) -> Result<String> {
    locator_script(
        &element.locator,
        &format!(
            "const el = els[{}]; if (!el) {{ return null; }} {body}",
            element.index
        ),
    )
}

impl ChromiumContext {
    async fn eval(&self, script: String) -> Result<serde_json::Value> {
        self.page
            .evaluate(script)
            .await
            .context("JS execution failed")?
            .into_value()
            .map_err(|e| anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn eval_on(&self, element: &ElementHandle, body: &str) -> Result<serde_json::Value> {
        let value = self.eval(element_script(element, body)?).await?;
        if value.is_null() {
            bail!("element {} of {:?} not found", element.index, element.locator);
        }
        Ok(value)
    }

    /// Wait until no new resource entries appear for [`IDLE_MS`].
    async fn wait_for_network_idle(&self, deadline: Instant) {
        let mut last_count = -1i64;
        let mut quiet_since = Instant::now();
        while Instant::now() < deadline {
            let count = self
                .eval("performance.getEntriesByType('resource').length".to_string())
                .await
                .ok()
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            if count != last_count {
                last_count = count;
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= Duration::from_millis(IDLE_MS) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(POLL_MS)).await;
        }
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(
        &mut self,
        url: &str,
        wait: WaitPolicy,
        timeout_ms: u64,
    ) -> Result<NavigationResult> {
        let start = Instant::now();
        let deadline = start + Duration::from_millis(timeout_ms);

        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }

        if wait == WaitPolicy::NetworkIdle {
            self.wait_for_network_idle(deadline).await;
        }

        let final_url = self.get_url().await.unwrap_or_else(|_| url.to_string());
        // Main document status; older engines lack responseStatus.
        let status = self
            .eval(
                "(() => { const n = performance.getEntriesByType('navigation')[0]; \
                 return n && n.responseStatus ? n.responseStatus : 200; })()"
                    .to_string(),
            )
            .await
            .ok()
            .and_then(|v| v.as_u64())
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(200);

        Ok(NavigationResult {
            final_url,
            status,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn locate(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let count = self
            .eval(locator_script(locator, "return els.length;")?)
            .await?
            .as_u64()
            .unwrap_or(0) as usize;
        Ok((0..count)
            .map(|index| ElementHandle {
                locator: locator.clone(),
                index,
            })
            .collect())
    }

    async fn is_visible(&self, element: &ElementHandle, timeout_ms: u64) -> Result<bool> {
        let script = element_script(
            element,
            "const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
             return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';",
        )?;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.eval(script.clone()).await?.as_bool() == Some(true) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(POLL_MS)).await;
        }
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<()> {
        self.eval_on(element, "el.scrollIntoView({block: 'center'}); el.click(); return true;")
            .await?;
        Ok(())
    }

    async fn text_content(&self, element: &ElementHandle) -> Result<String> {
        let value = self.eval_on(element, "return el.textContent || '';").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn get_attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        let name = serde_json::to_string(name)?;
        let value = self
            .eval_on(element, &format!("return {{ value: el.getAttribute({name}) }};"))
            .await?;
        Ok(value["value"].as_str().map(str::to_string))
    }

    async fn inner_html(&self, element: &ElementHandle) -> Result<String> {
        let value = self.eval_on(element, "return el.innerHTML;").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn select_option(&mut self, control: &ElementHandle, label: &str) -> Result<()> {
        let wanted = serde_json::to_string(label)?;
        let picked = self
            .eval_on(
                control,
                &format!(
                    "const opt = Array.from(el.options || []).find(o => norm(o.textContent) === norm({wanted})); \
                     if (!opt) {{ return false; }} \
                     el.value = opt.value; \
                     el.dispatchEvent(new Event('input', {{bubbles: true}})); \
                     el.dispatchEvent(new Event('change', {{bubbles: true}})); \
                     return true;"
                ),
            )
            .await?;
        if picked.as_bool() != Some(true) {
            bail!("option {label:?} not found");
        }
        Ok(())
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        self.eval(script.to_string()).await
    }

    async fn get_html(&self) -> Result<String> {
        let html = self
            .eval("document.documentElement.outerHTML".to_string())
            .await
            .context("failed to get HTML")?;
        Ok(html.as_str().unwrap_or_default().to_string())
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumContext {
            page,
            browser,
            context_id,
            active_count,
        } = *self;
        active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = page.close().await;
        let browser = browser.lock().await;
        if let Err(e) = browser.dispose_browser_context(context_id).await {
            tracing::debug!("failed to dispose browser context: {e}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_script_embeds_locator_json() {
        let script = locator_script(&Locator::css("a[href*=\"/p/\"]"), "return els.length;").unwrap();
        assert!(script.contains(r#""kind":"css""#));
        assert!(script.contains(r#"a[href*=\"/p/\"]"#));
        assert!(script.trim_end().ends_with("})()"));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_locate_click_and_select() {
        let executable = find_chromium(None).expect("Chromium not found");
        let renderer = ChromiumRenderer::launch(ChromiumOptions {
            executable,
            http1_only: false,
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
            locale: "fr-FR".to_string(),
        })
        .await
        .expect("failed to launch renderer");
        let mut ctx = renderer.new_context().await.expect("failed to create context");

        ctx.navigate(
            "data:text/html,<button onclick=\"this.textContent='ok'\">Guide des tailles</button>\
             <select><option>Europe</option><option>UK</option></select>",
            WaitPolicy::DomContentLoaded,
            10_000,
        )
        .await
        .expect("navigation failed");

        let buttons = ctx.locate(&Locator::text("guide des tailles")).await.unwrap();
        assert_eq!(buttons.len(), 1);
        assert!(ctx.is_visible(&buttons[0], 1_000).await.unwrap());
        ctx.click(&buttons[0]).await.unwrap();
        let button = ctx.locate(&Locator::css("button")).await.unwrap();
        assert_eq!(ctx.text_content(&button[0]).await.unwrap(), "ok");

        let select = ctx.locate(&Locator::css("select")).await.unwrap();
        ctx.select_option(&select[0], "UK").await.unwrap();
        assert!(ctx.select_option(&select[0], "JP").await.is_err());

        ctx.close().await.expect("close failed");
        assert_eq!(renderer.active_contexts(), 0);
        renderer.shutdown().await.expect("shutdown failed");
    }
}
