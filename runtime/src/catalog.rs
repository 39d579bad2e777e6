//! Product Cataloger: structured feed first, link crawl second.

use crate::acquisition::feed;
use crate::env::ScrapeEnv;
use crate::renderer::engines::EngineKind;
use crate::renderer::{click_first_visible, Locator, RenderContext, WaitPolicy};
use sizeguide_core::classify::{classify_type, gender_from_text, gender_from_url};
use sizeguide_core::links::{
    discover_category_links, extract_image_links, extract_product_links, ProductLink,
};
use sizeguide_core::{Gender, Product};
use std::collections::HashSet;

/// Product link patterns for unknown storefronts, most specific first.
pub const PRODUCT_SELECTORS: &[&str] = &[
    r#"a[href*="/products/"]"#,
    r#"a[href*="/product/"]"#,
    r#"a[href*="/p/"]"#,
    r#"a[href*="/produit/"]"#,
    ".product-card a",
    ".product-item a",
    "[data-product] a",
];

/// Navigation words that point at product listings.
pub const CATEGORY_KEYWORDS: &[&str] = &[
    "chaussure",
    "shoe",
    "homme",
    "femme",
    "enfant",
    "collection",
    "shop",
    "boutique",
    "botte",
    "boot",
    "sandale",
    "sneaker",
    "basket",
    "vetement",
    "clothing",
];

/// Below this many products on the home page, categories are explored.
const MIN_HOME_PRODUCTS: usize = 5;
const MAX_CATEGORIES: usize = 8;
const MAX_CRAWLED_PRODUCTS: usize = 50;
/// Lazy-loaded listings get this long to fill in.
const LISTING_SETTLE_MS: u64 = 2_000;

/// How a listing page is loaded before its links are read.
#[derive(Debug, Clone)]
pub struct ListingVisit {
    pub engine: EngineKind,
    pub wait: WaitPolicy,
    pub nav_timeout_ms: u64,
    /// Cookie banners; the first visible one is clicked.
    pub dismiss: Vec<Locator>,
    /// Scrolls to the bottom, for infinite listings.
    pub scrolls: usize,
}

impl ListingVisit {
    pub fn new(env: &ScrapeEnv) -> Self {
        Self {
            engine: EngineKind::Chromium,
            wait: WaitPolicy::DomContentLoaded,
            nav_timeout_ms: env.config.nav_timeout_ms,
            dismiss: Vec::new(),
            scrolls: 0,
        }
    }
}

/// Feed products when the site has a feed, crawled products otherwise.
pub async fn catalog_products(env: &ScrapeEnv, base_url: &str) -> Vec<Product> {
    let products = feed::fetch_products(&env.http, base_url, env.config.nav_timeout_ms).await;
    if !products.is_empty() {
        return products;
    }
    tracing::info!("no product feed, crawling {base_url}");
    crawl_products(env, base_url, &ListingVisit::new(env)).await
}

/// Load a listing page and return its final URL and HTML.
pub async fn snapshot(env: &ScrapeEnv, url: &str, visit: &ListingVisit) -> Option<(String, String)> {
    let renderer = env.engines.acquire(visit.engine).await;
    let mut ctx = match renderer.new_context().await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::warn!("could not open a page for {url}: {e:#}");
            return None;
        }
    };
    let page = load_listing(ctx.as_mut(), url, visit).await;
    if let Err(e) = ctx.close().await {
        tracing::debug!("closing page for {url} failed: {e:#}");
    }
    page
}

async fn load_listing(
    ctx: &mut dyn RenderContext,
    url: &str,
    visit: &ListingVisit,
) -> Option<(String, String)> {
    let nav = match ctx.navigate(url, visit.wait, visit.nav_timeout_ms).await {
        Ok(nav) if nav.status < 400 => nav,
        Ok(nav) => {
            tracing::debug!("listing {url} returned HTTP {}", nav.status);
            return None;
        }
        Err(e) => {
            tracing::debug!("listing {url} failed: {e:#}");
            return None;
        }
    };

    if !visit.dismiss.is_empty() && click_first_visible(ctx, &visit.dismiss, 3_000).await {
        ctx.settle(1_000).await;
    }
    for _ in 0..visit.scrolls {
        if ctx
            .execute_js("window.scrollTo(0, document.body.scrollHeight); true")
            .await
            .is_err()
        {
            break;
        }
        ctx.settle(1_500).await;
    }
    ctx.settle(LISTING_SETTLE_MS).await;

    match ctx.get_html().await {
        Ok(html) => Some((nav.final_url, html)),
        Err(e) => {
            tracing::debug!("could not read {url}: {e:#}");
            None
        }
    }
}

fn to_product(link: ProductLink, listing_gender: Gender) -> Product {
    let gender = gender_from_text(&link.name).unwrap_or(listing_gender);
    let kind = classify_type(&link.name);
    Product::new(link.name, gender, kind, link.url)
}

fn add_links(
    products: &mut Vec<Product>,
    seen: &mut HashSet<String>,
    links: Vec<ProductLink>,
    gender: Gender,
) {
    for link in links {
        if seen.insert(link.url.clone()) {
            products.push(to_product(link, gender));
        }
    }
}

/// Heuristic crawl: product links on the home page, then on category pages
/// found in the navigation when the home page has too few.
pub async fn crawl_products(env: &ScrapeEnv, base_url: &str, visit: &ListingVisit) -> Vec<Product> {
    let Some((home_url, home_html)) = snapshot(env, base_url, visit).await else {
        return Vec::new();
    };

    let mut products = Vec::new();
    let mut seen = HashSet::new();
    let links = extract_product_links(&home_html, &home_url, PRODUCT_SELECTORS, false);
    add_links(&mut products, &mut seen, links, Gender::Unisex);
    tracing::info!("{} products linked from the home page", products.len());

    if products.len() >= MIN_HOME_PRODUCTS {
        return products;
    }

    let categories = discover_category_links(&home_html, &home_url, CATEGORY_KEYWORDS);
    tracing::debug!("{} candidate category pages", categories.len());

    for category in categories.iter().take(MAX_CATEGORIES) {
        if products.len() >= MAX_CRAWLED_PRODUCTS {
            break;
        }
        let Some((page_url, html)) = snapshot(env, category, visit).await else {
            continue;
        };
        let mut links = extract_product_links(&html, &page_url, PRODUCT_SELECTORS, false);
        if links.is_empty() {
            links = extract_image_links(&html, &page_url);
        }
        let before = products.len();
        add_links(&mut products, &mut seen, links, gender_from_url(category));
        tracing::debug!("{} products from {category}", products.len() - before);
    }

    products.truncate(MAX_CRAWLED_PRODUCTS);
    tracing::info!("crawled {} products", products.len());
    products
}

/// Products from fixed listing pages with a known gender each.
pub async fn catalog_listings(
    env: &ScrapeEnv,
    listings: &[(String, Gender)],
    selectors: &[&str],
    prefer_aria: bool,
    visit: &ListingVisit,
) -> Vec<Product> {
    let mut products = Vec::new();
    let mut seen = HashSet::new();
    for (url, gender) in listings {
        let Some((page_url, html)) = snapshot(env, url, visit).await else {
            continue;
        };
        let links = extract_product_links(&html, &page_url, selectors, prefer_aria);
        tracing::info!("{} {gender} products from {url}", links.len());
        for link in links {
            if seen.insert(link.url.clone()) {
                let kind = classify_type(&link.name);
                products.push(Product::new(link.name, *gender, kind, link.url));
            }
        }
    }
    products
}
