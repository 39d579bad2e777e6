//! Product and category link discovery on listing pages.
//!
//! Works on page snapshots with CSS selectors. Links are resolved against the
//! page URL, stripped of their fragment and deduplicated on the result, so the
//! same product reached through several hrefs (relative and absolute, with and
//! without `#reviews`) yields one entry.

use crate::classify::{clean_product_name, is_blocklisted_name};
use crate::keywords::{any_hit, fold};
use crate::table::parse_selector;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// Shortest accepted product name.
const MIN_NAME_LEN: usize = 3;

/// Path segments that never lead to a product page.
const NON_PRODUCT_SEGMENTS: &[&str] = &[
    "cart",
    "panier",
    "login",
    "connexion",
    "account",
    "compte",
    "blog",
    "search",
    "recherche",
    "pages",
    "policies",
    "contact",
    "wishlist",
    "checkout",
];

/// A product link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLink {
    pub url: String,
    pub name: String,
}

/// Resolve `href` against `base`, dropping the fragment. Only http(s) targets
/// are returned.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Host without a leading `www.`.
pub fn bare_host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

fn same_site(a: &Url, b: &Url) -> bool {
    bare_host(a) == bare_host(b)
}

/// Name for a product link: optional aria-label, then the first line of the
/// link text, then an image alt.
fn link_name(el: &ElementRef<'_>, prefer_aria: bool) -> Option<String> {
    let aria = prefer_aria
        .then(|| el.value().attr("aria-label"))
        .flatten()
        .map(clean_product_name);
    let text = Some(clean_product_name(&el.text().collect::<String>()));
    let alt = parse_selector("img[alt]").ok().and_then(|img| {
        el.select(&img)
            .next()
            .and_then(|i| i.value().attr("alt"))
            .map(clean_product_name)
    });

    [aria, text, alt]
        .into_iter()
        .flatten()
        .find(|n| n.chars().count() >= MIN_NAME_LEN)
}

/// Collect product links using the first selector, in order, that yields any.
///
/// Links are deduplicated on their resolved URL; names on the blocklist (and
/// nameless links) are dropped.
pub fn extract_product_links(
    page_html: &str,
    page_url: &str,
    selectors: &[&str],
    prefer_aria: bool,
) -> Vec<ProductLink> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let document = Html::parse_document(page_html);
    let mut seen = HashSet::new();

    for css in selectors {
        let Ok(selector) = parse_selector(css) else {
            tracing::debug!("skipping invalid product selector {css}");
            continue;
        };

        let mut links = Vec::new();
        for el in document.select(&selector) {
            let Some(url) = el.value().attr("href").and_then(|h| resolve_href(&base, h)) else {
                continue;
            };
            let url = url.to_string();
            if seen.contains(&url) {
                continue;
            }
            // An unnamed anchor must not shadow a named one with the same href.
            match link_name(&el, prefer_aria) {
                Some(name) if !is_blocklisted_name(&name) => {
                    seen.insert(url.clone());
                    links.push(ProductLink { url, name });
                }
                _ => {}
            }
        }

        if !links.is_empty() {
            return links;
        }
    }
    Vec::new()
}

/// Category pages reachable from navigation chrome (nav, menus, header) whose
/// text or href mentions one of `keywords`.
pub fn discover_category_links(page_html: &str, page_url: &str, keywords: &[&str]) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let Ok(selector) = parse_selector("nav a[href], .menu a[href], header a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(page_html);
    let mut seen = HashSet::new();
    let mut categories = Vec::new();

    for el in document.select(&selector) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Some(url) = resolve_href(&base, href) else {
            continue;
        };
        if !same_site(&url, &base) || url.path() == base.path() {
            continue;
        }
        let signal = fold(&format!("{} {}", el.text().collect::<String>(), url.path()));
        if any_hit(&signal, keywords) && seen.insert(url.to_string()) {
            categories.push(url.to_string());
        }
    }
    categories
}

/// Fallback for listing pages without recognizable product markup: links that
/// wrap an image and point at least two path segments deep, outside known
/// non-product sections.
pub fn extract_image_links(page_html: &str, page_url: &str) -> Vec<ProductLink> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let (Ok(anchor), Ok(img)) = (parse_selector("a[href]"), parse_selector("img")) else {
        return Vec::new();
    };
    let document = Html::parse_document(page_html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for el in document.select(&anchor) {
        let Some(image) = el.select(&img).next() else {
            continue;
        };
        let Some(url) = el.value().attr("href").and_then(|h| resolve_href(&base, h)) else {
            continue;
        };
        if !same_site(&url, &base) {
            continue;
        }
        let segments: Vec<String> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).map(fold).collect())
            .unwrap_or_default();
        if segments.len() < 2
            || segments
                .iter()
                .any(|s| NON_PRODUCT_SEGMENTS.contains(&s.as_str()))
        {
            continue;
        }
        if !seen.insert(url.to_string()) {
            continue;
        }

        let name = image
            .value()
            .attr("alt")
            .map(clean_product_name)
            .filter(|n| n.chars().count() >= MIN_NAME_LEN)
            .or_else(|| Some(clean_product_name(&el.text().collect::<String>())))
            .filter(|n| n.chars().count() >= MIN_NAME_LEN && !is_blocklisted_name(n));
        if let Some(name) = name {
            links.push(ProductLink {
                url: url.to_string(),
                name,
            });
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.shop.test/";

    #[test]
    fn test_product_links_dedup_by_href() {
        let html = r#"<html><body>
            <a href="/products/derby-noir">Derby Noir</a>
            <a href="/products/derby-noir"><img src="x.jpg" alt="Derby Noir"></a>
            <a href="https://www.shop.test/products/derby-noir#reviews">Avis</a>
            <a href="/products/boots-marron">Boots Marron
                189,00 €</a>
        </body></html>"#;
        let links = extract_product_links(html, BASE, &["a[href*=\"/products/\"]"], false);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://www.shop.test/products/derby-noir");
        assert_eq!(links[0].name, "Derby Noir");
        assert_eq!(links[1].name, "Boots Marron");
    }

    #[test]
    fn test_product_links_unnamed_anchor_does_not_hide_named_one() {
        let html = r#"<html><body>
            <a href="/products/derby-noir"><img src="x.jpg"></a>
            <a href="/products/derby-noir">Derby Noir</a>
        </body></html>"#;
        let links = extract_product_links(html, BASE, &["a[href*=\"/products/\"]"], false);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://www.shop.test/products/derby-noir");
        assert_eq!(links[0].name, "Derby Noir");
    }

    #[test]
    fn test_product_links_first_productive_selector_wins() {
        let html = r#"<div class="product-card"><a href="/p/1">Sandale Ines</a></div>
            <a href="/produit/2">Mule Rosa</a>"#;
        let links = extract_product_links(
            html,
            BASE,
            &["a[href*=\"/products/\"]", ".product-card a", "a[href*=\"/produit/\"]"],
            false,
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].name, "Sandale Ines");
    }

    #[test]
    fn test_product_links_name_fallbacks() {
        let html = r#"
            <a href="/fr/fr/p/derby-1" aria-label="FROM THE RUNWAY Derbies en cuir € 1.200">x</a>
            <a href="/fr/fr/p/mule-2"><img src="m.jpg" alt="Mule en satin"></a>
            <a href="/fr/fr/p/nav-3">Nouveautés</a>
            <a href="/fr/fr/p/empty-4"></a>"#;
        let links = extract_product_links(html, BASE, &["a[href*=\"/fr/fr/p/\"]"], true);
        let names: Vec<&str> = links.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Derbies en cuir", "Mule en satin"]);
    }

    #[test]
    fn test_discover_category_links() {
        let html = r#"<header>
            <a href="/">Accueil</a>
            <a href="/collections/chaussures-homme">Homme</a>
            <a href="/collections/femme">Femme</a>
            <a href="/collections/femme">Femme</a>
            <a href="/pages/contact">Contact</a>
            <a href="https://other.test/collections/shoes">Partner shoes</a>
        </header>"#;
        let cats = discover_category_links(html, BASE, &["homme", "femme", "shoe"]);
        assert_eq!(
            cats,
            vec![
                "https://www.shop.test/collections/chaussures-homme".to_string(),
                "https://www.shop.test/collections/femme".to_string(),
            ]
        );
    }

    #[test]
    fn test_image_links_heuristic() {
        let html = r#"<main>
            <a href="/collections/femme/escarpin-lou"><img src="a.jpg" alt="Escarpin Lou"></a>
            <a href="/escarpin-solo"><img src="b.jpg" alt="Solo"></a>
            <a href="/blog/nouvelle-collection"><img src="c.jpg" alt="Article"></a>
            <a href="/account/orders/1"><img src="d.jpg" alt="Orders"></a>
            <a href="/collections/femme/text-only">Pas d'image</a>
        </main>"#;
        let links = extract_image_links(html, BASE);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].name, "Escarpin Lou");
    }

    #[test]
    fn test_resolve_href_rejects_non_http() {
        let base = Url::parse(BASE).unwrap();
        assert!(resolve_href(&base, "#top").is_none());
        assert!(resolve_href(&base, "mailto:hello@shop.test").is_none());
        assert!(resolve_href(&base, "javascript:void(0)").is_none());
        assert_eq!(
            resolve_href(&base, "/p/1#x").unwrap().as_str(),
            "https://www.shop.test/p/1"
        );
    }
}
