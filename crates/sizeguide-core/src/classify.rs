//! Best-effort product classification from text and URL signals.
//!
//! All classifiers are ordered guard lists: the first guard with a keyword hit
//! wins and an explicit default applies otherwise. Order matters because
//! keywords overlap ("women" before "men", "boot" before "bottine").

use crate::keywords::{first_match, fold};
use crate::types::Gender;
use regex::Regex;
use std::sync::LazyLock;

/// Type assigned when nothing matches.
pub const DEFAULT_TYPE: &str = "Shoes";

const GENDER_GUARDS: &[(Gender, &[&str])] = &[
    (Gender::Femme, &["femme", "women", "woman", "womens", "ladies"]),
    (Gender::Homme, &["homme", "men", "man", "mens"]),
    (Gender::Enfant, &["enfant", "kid", "kids", "junior", "bebe"]),
];

const TYPE_GUARDS: &[(&str, &[&str])] = &[
    ("Boots", &["botte", "boot"]),
    ("Ankle Boots", &["bottine"]),
    ("Sandals", &["sandal", "sandale"]),
    ("Sneakers", &["basket", "sneaker"]),
    ("Loafers", &["mocassin", "loafer"]),
    ("Derby", &["derby", "richelieu"]),
    ("Pumps", &["escarpin", "pump"]),
    ("Mules", &["mule", "slide"]),
    ("Espadrilles", &["espadrille"]),
    ("Belt", &["ceinture", "belt"]),
    ("Bag", &["sac", "bag"]),
];

/// Link texts that are navigation chrome rather than product names.
const NAME_BLOCKLIST: &[&str] = &[
    "nouveautes",
    "nouveaute",
    "boutique",
    "collection",
    "collections",
    "homme",
    "femme",
    "enfant",
    "soldes",
    "accueil",
    "voir tout",
    "tout voir",
    "decouvrir",
    "shop",
    "shop all",
    "shop now",
    "new in",
    "new arrivals",
    "sale",
    "home",
    "men",
    "women",
    "kids",
    "unknown",
];

static RUNWAY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^from the runway\s*").expect("invalid runway regex"));
static BADGE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(nouveau|nouveaute|new in|best[- ]?seller|exclusivit[eé] web|sold out|[eé]puis[eé])\s*[:\-–]?\s+")
        .expect("invalid badge regex")
});
static PRICE_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(€|\$|£|eur\b)\s*[\d.,]+.*$|\s*[\d.,]+\s*(€|\$|£|eur\b).*$")
        .expect("invalid price regex")
});
static AVAILABLE_IN_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*disponible en.*$").expect("invalid availability regex"));

/// Gender from free text (title, tags, category), if any keyword hits.
pub fn gender_from_text(text: &str) -> Option<Gender> {
    first_match(text, GENDER_GUARDS)
}

/// Gender from free text, defaulting to [`Gender::Unisex`].
pub fn classify_gender(text: &str) -> Gender {
    gender_from_text(text).unwrap_or_default()
}

/// Gender from a listing or category URL path.
pub fn gender_from_url(url: &str) -> Gender {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    classify_gender(&path.replace(['-', '_'], "/"))
}

/// Product type from free text, `None` when no guard matches.
pub fn type_from_text(text: &str) -> Option<&'static str> {
    first_match(text, TYPE_GUARDS)
}

/// Product type from free text, defaulting to [`DEFAULT_TYPE`].
pub fn classify_type(text: &str) -> &'static str {
    type_from_text(text).unwrap_or(DEFAULT_TYPE)
}

/// Strip price, badge and availability noise from a scraped product name.
pub fn clean_product_name(raw: &str) -> String {
    let first_line = raw.trim().lines().next().unwrap_or("").trim();
    let name = RUNWAY_PREFIX.replace(first_line, "");
    let name = BADGE_PREFIX.replace(&name, "");
    let name = AVAILABLE_IN_TAIL.replace(&name, "");
    let name = PRICE_TAIL.replace(&name, "");
    name.trim().to_string()
}

/// Whether a candidate name is a navigation label rather than a product.
pub fn is_blocklisted_name(name: &str) -> bool {
    let folded = fold(name.trim());
    folded.is_empty() || NAME_BLOCKLIST.contains(&folded.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_order() {
        assert_eq!(classify_gender("Derby homme cuir"), Gender::Homme);
        assert_eq!(classify_gender("Women's boot"), Gender::Femme);
        assert_eq!(classify_gender("Sneakers for men"), Gender::Homme);
        assert_eq!(classify_gender("Chaussures enfant"), Gender::Enfant);
        assert_eq!(classify_gender("Derby Noir"), Gender::Unisex);
        assert_eq!(gender_from_text("Derby Noir"), None);
    }

    #[test]
    fn test_gender_from_url() {
        assert_eq!(gender_from_url("https://x.test/collections/chaussures-femme"), Gender::Femme);
        assert_eq!(gender_from_url("https://www.prada.com/fr/fr/men/shoes.html"), Gender::Homme);
        assert_eq!(gender_from_url("https://www.prada.com/fr/fr/women/shoes.html"), Gender::Femme);
        assert_eq!(gender_from_url("https://x.test/collections/all"), Gender::Unisex);
    }

    #[test]
    fn test_type_order() {
        assert_eq!(classify_type("Boots Chelsea"), "Boots");
        assert_eq!(classify_type("Bottine zippée"), "Ankle Boots");
        assert_eq!(classify_type("Sandale plate"), "Sandals");
        assert_eq!(classify_type("Basket basse"), "Sneakers");
        assert_eq!(classify_type("Mocassin"), "Loafers");
        assert_eq!(classify_type("Derby Noir"), "Derby");
        assert_eq!(classify_type("Sac cabas"), "Bag");
        assert_eq!(classify_type("Padror"), DEFAULT_TYPE);
        assert_eq!(type_from_text("Padror"), None);
    }

    #[test]
    fn test_clean_product_name() {
        assert_eq!(clean_product_name("FROM THE RUNWAY Derbies en cuir € 1.200"), "Derbies en cuir");
        assert_eq!(clean_product_name("Mocassins Disponible en 3 couleurs"), "Mocassins");
        assert_eq!(clean_product_name("Padror\n129,00 €"), "Padror");
        assert_eq!(clean_product_name("Nouveau Basket Fun 149,00 €"), "Basket Fun");
        assert_eq!(clean_product_name("  Derby Noir  "), "Derby Noir");
    }

    #[test]
    fn test_name_blocklist() {
        assert!(is_blocklisted_name("Nouveautés"));
        assert!(is_blocklisted_name(" Boutique "));
        assert!(is_blocklisted_name(""));
        assert!(!is_blocklisted_name("Derby Noir"));
    }
}
