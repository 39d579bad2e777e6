//! Structured product feed (`/products.json`) reader.
//!
//! Storefronts on the common hosted commerce platform expose their catalog as
//! paged JSON. Pages are read until one comes back short or empty; any
//! failure ends the walk with whatever was read so far.

use super::http_client::HttpClient;
use serde::Deserialize;
use sizeguide_core::classify::{classify_gender, type_from_text, DEFAULT_TYPE};
use sizeguide_core::Product;
use std::collections::HashSet;

/// Products requested per page, also the "full page" threshold.
pub const PAGE_SIZE: usize = 250;

/// Stops runaway pagination on feeds that ignore the page parameter.
pub const MAX_PAGES: usize = 200;

#[derive(Debug, Deserialize)]
struct FeedPage {
    #[serde(default)]
    products: Vec<FeedProduct>,
}

#[derive(Debug, Deserialize)]
struct FeedProduct {
    #[serde(default)]
    title: String,
    #[serde(default)]
    handle: String,
    #[serde(default)]
    product_type: String,
    #[serde(default)]
    tags: FeedTags,
}

/// Tags come either as an array or as one comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedTags {
    List(Vec<String>),
    Csv(String),
}

impl Default for FeedTags {
    fn default() -> Self {
        FeedTags::List(Vec::new())
    }
}

impl FeedTags {
    fn joined(&self) -> String {
        match self {
            FeedTags::List(tags) => tags.join(" "),
            FeedTags::Csv(tags) => tags.replace(',', " "),
        }
    }
}

fn page_url(base_url: &str, page: usize) -> String {
    format!(
        "{}/products.json?limit={PAGE_SIZE}&page={page}",
        base_url.trim_end_matches('/')
    )
}

fn to_product(base_url: &str, item: FeedProduct) -> Option<Product> {
    let handle = item.handle.trim();
    if handle.is_empty() {
        return None;
    }

    let title = item.title.trim();
    let gender = classify_gender(&format!("{title} {} {}", item.tags.joined(), item.product_type));
    let kind = type_from_text(&format!("{title} {}", item.product_type))
        .map(str::to_string)
        .or_else(|| Some(item.product_type.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| DEFAULT_TYPE.to_string());
    let url = format!("{}/products/{handle}", base_url.trim_end_matches('/'));

    Some(Product::new(title, gender, kind, url))
}

/// Read every product the feed exposes. Returns an empty list when the site
/// has no feed.
pub async fn fetch_products(http: &HttpClient, base_url: &str, timeout_ms: u64) -> Vec<Product> {
    let mut products = Vec::new();
    let mut seen = HashSet::new();

    for page in 1..=MAX_PAGES {
        let url = page_url(base_url, page);
        let resp = match http.get(&url, timeout_ms).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!("feed request failed at page {page}: {e:#}");
                break;
            }
        };
        if !resp.is_success() {
            tracing::debug!("feed page {page} returned HTTP {}", resp.status);
            break;
        }
        let parsed: FeedPage = match serde_json::from_str(&resp.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("feed page {page} is not a product feed: {e}");
                break;
            }
        };

        let count = parsed.products.len();
        for item in parsed.products {
            if let Some(product) = to_product(base_url, item) {
                if seen.insert(product.url.clone()) {
                    products.push(product);
                }
            }
        }
        tracing::debug!("feed page {page}: {count} products");

        if count < PAGE_SIZE {
            break;
        }
    }

    if !products.is_empty() {
        tracing::info!("feed returned {} products", products.len());
    }
    products
}
