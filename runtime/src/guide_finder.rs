//! Size Guide Locator.
//!
//! Candidates are tried in order: the site's known guide pages, then a sample
//! of product pages where the guide sits behind triggers. The first page
//! that yields a region assembling into a guide wins. Every visit uses its own context and closes
//! it whatever happens.

use crate::env::ScrapeEnv;
use crate::reader::{read_shape, RegionShape};
use crate::renderer::engines::EngineKind;
use crate::renderer::{click_first_visible, Locator, RenderContext, WaitPolicy};
use sizeguide_core::{assemble_guide, LabelCanon, RawRow};

/// How long a trigger gets to become visible.
const TRIGGER_VISIBLE_MS: u64 = 2_000;

/// Per-site search parameters.
#[derive(Debug, Clone)]
pub struct GuideSearch {
    /// Paths appended to the site root, e.g. `/pages/guide-des-tailles`.
    pub guide_paths: Vec<String>,
    /// Banners to close before anything else (first visible one is clicked).
    pub dismiss: Vec<Locator>,
    /// Ordered reveal steps on product pages. Each step clicks the first
    /// visible candidate; a step with no visible candidate is skipped.
    pub reveal_steps: Vec<Vec<Locator>>,
    /// Shapes tried in order on every page.
    pub shapes: Vec<RegionShape>,
    /// Product pages to try.
    pub sample_size: usize,
    pub engine: EngineKind,
    pub wait: WaitPolicy,
    pub nav_timeout_ms: u64,
    /// Pause after load for pages that hydrate late.
    pub load_settle_ms: u64,
}

/// One guide found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundGuide {
    /// Region title when the page splits guides, e.g. "Homme".
    pub grouping: Option<String>,
    /// Page the guide was read from.
    pub url: String,
    pub rows: Vec<RawRow>,
}

/// Search the site for size guides. Empty when none is found.
pub async fn find_guides(
    env: &ScrapeEnv,
    base_url: &str,
    product_urls: &[String],
    search: &GuideSearch,
    canon: &LabelCanon,
) -> Vec<FoundGuide> {
    let base = base_url.trim_end_matches('/');

    for path in &search.guide_paths {
        let url = format!("{base}{path}");
        let found = visit(env, &url, search, false, canon).await;
        if !found.is_empty() {
            tracing::info!("size guide found at {url}");
            return found;
        }
    }

    for url in product_urls.iter().take(search.sample_size) {
        let found = visit(env, url, search, true, canon).await;
        if !found.is_empty() {
            tracing::info!("size guide found on product page {url}");
            return found;
        }
    }

    Vec::new()
}

async fn visit(
    env: &ScrapeEnv,
    url: &str,
    search: &GuideSearch,
    reveal: bool,
    canon: &LabelCanon,
) -> Vec<FoundGuide> {
    let renderer = env.engines.acquire(search.engine).await;
    let mut ctx = match renderer.new_context().await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::warn!("could not open a page for {url}: {e:#}");
            return Vec::new();
        }
    };

    let found = scan_page(ctx.as_mut(), env, url, search, reveal, canon).await;
    if let Err(e) = ctx.close().await {
        tracing::debug!("closing page for {url} failed: {e:#}");
    }
    found
}

async fn scan_page(
    ctx: &mut dyn RenderContext,
    env: &ScrapeEnv,
    url: &str,
    search: &GuideSearch,
    reveal: bool,
    canon: &LabelCanon,
) -> Vec<FoundGuide> {
    let nav = match ctx.navigate(url, search.wait, search.nav_timeout_ms).await {
        Ok(nav) => nav,
        Err(e) => {
            tracing::debug!("skipping {url}: {e:#}");
            return Vec::new();
        }
    };
    if nav.status >= 400 {
        tracing::debug!("skipping {url}: HTTP {}", nav.status);
        return Vec::new();
    }
    if search.load_settle_ms > 0 {
        ctx.settle(search.load_settle_ms).await;
    }

    if !search.dismiss.is_empty() && click_first_visible(ctx, &search.dismiss, TRIGGER_VISIBLE_MS).await {
        ctx.settle(env.config.settle_ms / 2).await;
    }

    if reveal {
        for step in &search.reveal_steps {
            if click_first_visible(ctx, step, TRIGGER_VISIBLE_MS).await {
                ctx.settle(env.config.settle_ms).await;
            } else {
                tracing::debug!("no visible trigger among {} candidates on {url}", step.len());
            }
        }
    }

    // A static click may have followed a link to the guide page.
    let page_url = match ctx.get_url().await {
        Ok(current) if current.starts_with("http") => current,
        _ => nav.final_url,
    };

    for shape in &search.shapes {
        // Regions with no usable value (a placeholder grid) do not count.
        let regions: Vec<_> = read_shape(ctx, shape, canon, env.config.settle_ms)
            .await
            .into_iter()
            .filter(|r| assemble_guide(0, "", &page_url, &r.rows, canon).is_some())
            .collect();
        if regions.is_empty() {
            continue;
        }
        return regions
            .into_iter()
            .map(|r| FoundGuide {
                grouping: r.title,
                url: page_url.clone(),
                rows: r.rows,
            })
            .collect();
    }
    Vec::new()
}
