//! Catch-all adapter for unknown storefronts.

use super::{build_guides, product_urls, report, SiteAdapter};
use crate::catalog::catalog_products;
use crate::env::ScrapeEnv;
use crate::guide_finder::{find_guides, GuideSearch};
use crate::reader::RegionShape;
use crate::renderer::engines::EngineKind;
use crate::renderer::{Locator, WaitPolicy};
use anyhow::Result;
use sizeguide_core::links::bare_host;
use sizeguide_core::{LabelCanon, ScrapingResult};
use url::Url;

const GUIDE_PATHS: &[&str] = &[
    "/pages/guide-des-tailles",
    "/pages/size-guide",
    "/size-guide",
    "/guide-des-tailles",
    "/pages/guide-taille",
    "/pages/sizing",
    "/sizing-guide",
];

const TRIGGER_TEXTS: &[&str] = &[
    "guide des tailles",
    "size guide",
    "size chart",
    "guide de taille",
    "tableau des tailles",
];

const TRIGGER_SELECTORS: &[&str] = &[
    r#"[class*="size-guide"]"#,
    r#"[class*="size_guide"]"#,
    r#"[class*="sizeguide"]"#,
    r#"[href*="size-guide"]"#,
    r#"[href*="guide-taille"]"#,
];

fn search(env: &ScrapeEnv) -> GuideSearch {
    let triggers = TRIGGER_TEXTS
        .iter()
        .map(|t| Locator::text(*t))
        .chain(TRIGGER_SELECTORS.iter().map(|s| Locator::css(*s)))
        .collect();
    GuideSearch {
        guide_paths: GUIDE_PATHS.iter().map(|p| p.to_string()).collect(),
        dismiss: super::cookie_buttons(),
        reveal_steps: vec![triggers],
        shapes: vec![RegionShape::row_major("table")],
        sample_size: 5,
        engine: EngineKind::Chromium,
        wait: WaitPolicy::DomContentLoaded,
        nav_timeout_ms: env.config.nav_timeout_ms,
        load_settle_ms: 0,
    }
}

/// Brand guessed from the host: `www.maison-x.fr` gives "Maison-x".
pub fn brand_from_url(url: &str) -> String {
    let host = Url::parse(url).map(|u| bare_host(&u)).unwrap_or_default();
    let label = host.split('.').next().unwrap_or_default();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn scrape(url: &str, env: &ScrapeEnv) -> Result<ScrapingResult> {
    let products = catalog_products(env, url).await;
    let canon = LabelCanon::new();
    let found = find_guides(env, url, &product_urls(&products), &search(env), &canon).await;
    let size_guides = build_guides(found, &brand_from_url(url), &canon, false);
    report(SiteAdapter::Generic, &products, &size_guides);
    Ok(ScrapingResult {
        products,
        size_guides,
    })
}
