//! Kleman: feed catalog, guide behind two reveal buttons on product pages,
//! rendered as one flat grid per gender.

use super::{build_guides, product_urls, report, SiteAdapter};
use crate::catalog::catalog_products;
use crate::env::ScrapeEnv;
use crate::guide_finder::{find_guides, GuideSearch};
use crate::reader::RegionShape;
use crate::renderer::engines::EngineKind;
use crate::renderer::{Locator, WaitPolicy};
use anyhow::Result;
use sizeguide_core::{LabelCanon, ScrapingResult};

pub const HOSTS: &[&str] = &["kleman-france.com", "kleman.com"];

const BRAND: &str = "Kleman";

pub(crate) fn search(env: &ScrapeEnv) -> GuideSearch {
    GuideSearch {
        guide_paths: Vec::new(),
        dismiss: super::cookie_buttons(),
        reveal_steps: vec![
            vec![
                Locator::css_text("button", "Guide des tailles"),
                Locator::text("guide des tailles"),
                Locator::text("size guide"),
                Locator::css(r#"[class*="size-guide"]"#),
            ],
            vec![
                Locator::css_text("button", "Équivalence des tailles"),
                Locator::text("équivalence des tailles"),
            ],
        ],
        shapes: vec![
            RegionShape::FlatGrid {
                container: ".size-guide-table".into(),
                title: Some(".panel-size-guide__table-title, .size-guide-table__title".into()),
                item: ".size-guide-table__toggle__button, .size-guide-table__content__item".into(),
            },
            RegionShape::row_major("table"),
        ],
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
    let size_guides = build_guides(found, BRAND, &canon, true);
    report(SiteAdapter::Kleman, &products, &size_guides);
    Ok(ScrapingResult {
        products,
        size_guides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;
    use sizeguide_core::{Gender, GuideMatch};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GRIDS: &str = r#"<html><body>
      <div class="size-guide-table">
        <p class="size-guide-table__title">Homme</p>
        <div class="size-guide-table__toggle__button">EU</div>
        <div class="size-guide-table__toggle__button">UK</div>
        <div class="size-guide-table__toggle__button">Pouces</div>
        <div class="size-guide-table__content__item">40</div>
        <div class="size-guide-table__content__item">6.5</div>
        <div class="size-guide-table__content__item">9.8</div>
        <div class="size-guide-table__content__item">41</div>
        <div class="size-guide-table__content__item">7</div>
        <div class="size-guide-table__content__item">10.1</div>
      </div>
      <div class="size-guide-table">
        <p class="size-guide-table__title">Femme</p>
        <div class="size-guide-table__toggle__button">EU</div>
        <div class="size-guide-table__toggle__button">UK</div>
        <div class="size-guide-table__content__item">36</div>
        <div class="size-guide-table__content__item">3.5</div>
        <div class="size-guide-table__content__item">37</div>
        <div class="size-guide-table__content__item">4</div>
      </div>
    </body></html>"#;

    #[tokio::test]
    async fn test_gendered_grids_link_by_gender() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "products": [
                    {"title": "Derby Dastan Homme", "handle": "dastan", "tags": [], "product_type": ""},
                    {"title": "Mocassin Frisco Femme", "handle": "frisco", "tags": [], "product_type": ""},
                    {"title": "Semelles", "handle": "semelles", "tags": [], "product_type": ""}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products/dastan"))
            .respond_with(ResponseTemplate::new(200).set_body_string(GRIDS))
            .mount(&server)
            .await;

        let env = ScrapeEnv::new(ScrapeConfig {
            http_only: true,
            ..ScrapeConfig::default()
        });
        let result = SiteAdapter::Kleman.scrape(&server.uri(), &env).await.unwrap();
        env.shutdown().await;

        assert_eq!(result.size_guides.len(), 2);
        let homme = &result.size_guides[0];
        assert_eq!(homme.brand, "Kleman (Homme)");
        let codes: Vec<&str> = homme.rows.iter().map(|r| r.short_label.as_str()).collect();
        assert_eq!(codes, vec!["EU", "UK"]);
        assert_eq!(homme.rows[0].values, vec!["40", "41"]);
        assert_eq!(result.size_guides[1].brand, "Kleman (Femme)");

        let by_name = |n: &str| result.products.iter().find(|p| p.name == n).unwrap();
        let derby = by_name("Derby Dastan Homme");
        assert_eq!(derby.gender, Gender::Homme);
        assert_eq!(derby.size_guide_id, Some(1));
        assert_eq!(derby.guide_match, Some(GuideMatch::GenderSuffix));
        assert_eq!(by_name("Mocassin Frisco Femme").size_guide_id, Some(2));
        let insoles = by_name("Semelles");
        assert_eq!(insoles.size_guide_id, Some(1));
        assert_eq!(insoles.guide_match, Some(GuideMatch::FirstGuideUnmatchedGender));
    }
}
