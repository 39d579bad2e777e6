//! Prada: category listings for men and women, then a dropdown-driven size
//! table on product pages.
//!
//! The storefront fingerprints HTTP/2 clients, so every page goes through
//! the HTTP/1.1 Chromium engine.

use super::{build_guides, cookie_buttons, product_urls, report, SiteAdapter};
use crate::catalog::{catalog_listings, ListingVisit};
use crate::env::ScrapeEnv;
use crate::guide_finder::{find_guides, GuideSearch};
use crate::reader::RegionShape;
use crate::renderer::engines::EngineKind;
use crate::renderer::{Locator, WaitPolicy};
use anyhow::Result;
use sizeguide_core::labels::{EU, UK, US};
use sizeguide_core::{Gender, LabelCanon, ScrapingResult};

pub const HOSTS: &[&str] = &["prada.com"];

const BRAND: &str = "Prada";
const NAV_TIMEOUT_MS: u64 = 25_000;
const PRODUCT_LINK: &str = r#"a[href*="/fr/fr/p/"]"#;
const CATEGORIES: &[(&str, Gender)] = &[
    ("/fr/fr/men/shoes.html", Gender::Homme),
    ("/fr/fr/women/shoes.html", Gender::Femme),
];

fn canon() -> LabelCanon {
    LabelCanon::new().with_brand("prada", BRAND)
}

fn listing_visit(env: &ScrapeEnv) -> ListingVisit {
    ListingVisit {
        engine: EngineKind::ChromiumHttp1,
        nav_timeout_ms: NAV_TIMEOUT_MS,
        dismiss: cookie_buttons(),
        scrolls: 3,
        ..ListingVisit::new(env)
    }
}

fn search() -> GuideSearch {
    GuideSearch {
        guide_paths: Vec::new(),
        dismiss: cookie_buttons(),
        reveal_steps: vec![vec![
            Locator::css(r#"[data-element="size-guide-trigger"]"#),
            Locator::css_text("button", "Tableau des tailles"),
            Locator::css_text("button", "Size guide"),
            Locator::text("tableau des tailles"),
        ]],
        shapes: vec![RegionShape::Dropdown {
            table: "table".into(),
            control: "select".into(),
            wanted: vec![EU.into(), UK.into(), US.into()],
        }],
        sample_size: 3,
        engine: EngineKind::ChromiumHttp1,
        wait: WaitPolicy::DomContentLoaded,
        nav_timeout_ms: NAV_TIMEOUT_MS,
        load_settle_ms: 5_000,
    }
}

pub async fn scrape(url: &str, env: &ScrapeEnv) -> Result<ScrapingResult> {
    let base = url.trim_end_matches('/');
    let listings: Vec<(String, Gender)> = CATEGORIES
        .iter()
        .map(|(path, gender)| (format!("{base}{path}"), *gender))
        .collect();
    let products = catalog_listings(env, &listings, &[PRODUCT_LINK], true, &listing_visit(env)).await;

    let canon = canon();
    let found = find_guides(env, base, &product_urls(&products), &search(), &canon).await;
    let size_guides = build_guides(found, BRAND, &canon, true);
    report(SiteAdapter::Prada, &products, &size_guides);
    Ok(ScrapingResult {
        products,
        size_guides,
    })
}
