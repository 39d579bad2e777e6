//! Site Adapter Registry.
//!
//! A closed, ordered list of site strategies ending with a catch-all.
//! Dispatch picks the first adapter whose host matches.

pub mod generic;
pub mod kleman;
pub mod labottegardiane;
pub mod prada;

use crate::env::ScrapeEnv;
use crate::guide_finder::FoundGuide;
use crate::renderer::Locator;
use anyhow::Result;
use sizeguide_core::classify::gender_from_text;
use sizeguide_core::guide::{assemble_guide, gendered_brand, link_products, standardize, STANDARD_CODES};
use sizeguide_core::{LabelCanon, Product, ScrapingResult, SizeGuide};
use url::Url;

/// A scraping strategy for one family of sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteAdapter {
    Kleman,
    LaBotteGardiane,
    Prada,
    /// Catch-all for unknown storefronts.
    Generic,
}

/// Adapters in dispatch order. The catch-all comes last.
pub const ADAPTERS: &[SiteAdapter] = &[
    SiteAdapter::Kleman,
    SiteAdapter::LaBotteGardiane,
    SiteAdapter::Prada,
    SiteAdapter::Generic,
];

impl SiteAdapter {
    pub fn name(&self) -> &'static str {
        match self {
            SiteAdapter::Kleman => "kleman",
            SiteAdapter::LaBotteGardiane => "labottegardiane",
            SiteAdapter::Prada => "prada",
            SiteAdapter::Generic => "generic",
        }
    }

    fn hosts(&self) -> &'static [&'static str] {
        match self {
            SiteAdapter::Kleman => kleman::HOSTS,
            SiteAdapter::LaBotteGardiane => labottegardiane::HOSTS,
            SiteAdapter::Prada => prada::HOSTS,
            SiteAdapter::Generic => &[],
        }
    }

    /// Whether this adapter handles `url`.
    pub fn matches(&self, url: &str) -> bool {
        if *self == SiteAdapter::Generic {
            return true;
        }
        let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) else {
            return false;
        };
        self.hosts()
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{h}")))
    }

    /// Catalog the site, locate its size guides and link the two.
    pub async fn scrape(&self, url: &str, env: &ScrapeEnv) -> Result<ScrapingResult> {
        let mut result = match self {
            SiteAdapter::Kleman => kleman::scrape(url, env).await?,
            SiteAdapter::LaBotteGardiane => labottegardiane::scrape(url, env).await?,
            SiteAdapter::Prada => prada::scrape(url, env).await?,
            SiteAdapter::Generic => generic::scrape(url, env).await?,
        };
        link_products(&mut result.products, &result.size_guides);
        Ok(result)
    }
}

/// The first adapter in `adapters` matching `url`.
pub fn dispatch(adapters: &[SiteAdapter], url: &str) -> Option<SiteAdapter> {
    adapters.iter().copied().find(|a| a.matches(url))
}

/// Turn found regions into numbered guides.
///
/// Regions titled with a gender get a gendered brand ("Kleman (Homme)").
/// With `standard` set, only the anchor row and the EU/UK/US/cm rows survive.
pub(crate) fn build_guides(
    found: Vec<FoundGuide>,
    brand: &str,
    canon: &LabelCanon,
    standard: bool,
) -> Vec<SizeGuide> {
    let mut guides: Vec<SizeGuide> = Vec::new();
    for region in found {
        let brand = match region.grouping.as_deref().and_then(gender_from_text) {
            Some(gender) => gendered_brand(brand, gender),
            None => brand.to_string(),
        };
        let id = guides.len() as u32 + 1;
        let Some(mut guide) = assemble_guide(id, &brand, &region.url, &region.rows, canon) else {
            continue;
        };
        if standard {
            standardize(&mut guide, STANDARD_CODES);
        }
        guides.push(guide);
    }
    guides
}

/// Sampled product URLs for the guide search.
pub(crate) fn product_urls(products: &[Product]) -> Vec<String> {
    products.iter().map(|p| p.url.clone()).collect()
}

/// Common cookie-banner buttons.
pub(crate) fn cookie_buttons() -> Vec<Locator> {
    vec![
        Locator::css_text("button", "Tout accepter"),
        Locator::css_text("button", "Accepter"),
        Locator::css_text("button", "Accept"),
        Locator::css("#onetrust-accept-btn-handler"),
    ]
}

pub(crate) fn report(adapter: SiteAdapter, products: &[Product], guides: &[SizeGuide]) {
    tracing::info!(
        "{}: {} products, {} size guides",
        adapter.name(),
        products.len(),
        guides.len()
    );
    if guides.is_empty() {
        tracing::info!("no size guide found");
    }
}
