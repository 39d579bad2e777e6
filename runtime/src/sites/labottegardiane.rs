//! La Botte Gardiane: feed catalog, guide on a dedicated page or behind a
//! trigger on product pages, always a plain table.

use super::{build_guides, product_urls, report, SiteAdapter};
use crate::catalog::catalog_products;
use crate::env::ScrapeEnv;
use crate::guide_finder::{find_guides, GuideSearch};
use crate::reader::RegionShape;
use crate::renderer::engines::EngineKind;
use crate::renderer::{Locator, WaitPolicy};
use anyhow::Result;
use sizeguide_core::{LabelCanon, ScrapingResult};

pub const HOSTS: &[&str] = &["labottegardiane.com"];

const BRAND: &str = "La Botte Gardiane";

const GUIDE_PATHS: &[&str] = &[
    "/pages/guide-des-tailles",
    "/pages/size-guide",
    "/pages/guide-taille",
    "/pages/guide-des-pointures",
];

fn search(env: &ScrapeEnv) -> GuideSearch {
    GuideSearch {
        guide_paths: GUIDE_PATHS.iter().map(|p| p.to_string()).collect(),
        dismiss: Vec::new(),
        reveal_steps: vec![vec![
            Locator::text("guide des tailles"),
            Locator::text("size guide"),
            Locator::text("correspondance"),
            Locator::css(r#"[class*="size-guide"]"#),
        ]],
        shapes: vec![RegionShape::row_major("table")],
        sample_size: 3,
        engine: EngineKind::Chromium,
        wait: WaitPolicy::NetworkIdle,
        nav_timeout_ms: env.config.nav_timeout_ms,
        load_settle_ms: 0,
    }
}

pub async fn scrape(url: &str, env: &ScrapeEnv) -> Result<ScrapingResult> {
    let products = catalog_products(env, url).await;
    let canon = LabelCanon::new();
    let found = find_guides(env, url, &product_urls(&products), &search(env), &canon).await;
    let size_guides = build_guides(found, BRAND, &canon, false);
    report(SiteAdapter::LaBotteGardiane, &products, &size_guides);
    Ok(ScrapingResult {
        products,
        size_guides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;
    use sizeguide_core::GuideMatch;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_guide_page_links_every_product() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "products": [
                    {"title": "Botte Camargue", "handle": "botte-camargue", "tags": ["femme"], "product_type": "Bottes"},
                    {"title": "Gardiane Homme", "handle": "gardiane", "tags": [], "product_type": ""}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pages/guide-des-tailles"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><h1>Guide des tailles</h1><table>
                  <tr><th>Europe</th><th>40</th><th>41</th><th>42</th></tr>
                  <tr><td>UK</td><td>6.5</td><td>7</td><td>8</td></tr>
                </table></body></html>"#,
            ))
            .mount(&server)
            .await;

        let env = ScrapeEnv::new(ScrapeConfig {
            http_only: true,
            ..ScrapeConfig::default()
        });
        let result = SiteAdapter::LaBotteGardiane.scrape(&server.uri(), &env).await.unwrap();
        env.shutdown().await;

        assert_eq!(result.size_guides.len(), 1);
        let guide = &result.size_guides[0];
        assert_eq!(guide.id, 1);
        assert_eq!(guide.brand, "La Botte Gardiane");
        assert!(guide.url.ends_with("/pages/guide-des-tailles"));
        let codes: Vec<&str> = guide.rows.iter().map(|r| r.short_label.as_str()).collect();
        assert_eq!(codes, vec!["EU", "UK"]);
        assert!(guide.rows.iter().all(|r| r.values.len() == 3));

        assert_eq!(result.products.len(), 2);
        for product in &result.products {
            assert_eq!(product.size_guide_id, Some(1));
            assert_eq!(product.guide_match, Some(GuideMatch::NoGenderSplit));
        }
    }
}
