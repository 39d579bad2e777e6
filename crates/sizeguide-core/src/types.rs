//! Core data types for scraped products and size guides.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target audience of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    Homme,
    Femme,
    Enfant,
    #[default]
    Unisex,
}

impl Gender {
    /// Display name, also used as the suffix of gender-split guide brands.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Homme => "Homme",
            Gender::Femme => "Femme",
            Gender::Enfant => "Enfant",
            Gender::Unisex => "Unisex",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a product ended up linked to a given size guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideMatch {
    /// The guide brand carries a suffix equal to the product gender.
    GenderSuffix,
    /// Guides are split by gender but none matches this product (or its
    /// gender is unknown), so the first guide was used.
    FirstGuideUnmatchedGender,
    /// The site publishes a single, gender-neutral guide.
    NoGenderSplit,
}

/// A product discovered on a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub gender: Gender,
    #[serde(rename = "type")]
    pub kind: String,
    /// Absolute product URL; products are deduplicated on it.
    pub url: String,
    pub size_guide_id: Option<u32>,
    pub guide_match: Option<GuideMatch>,
}

impl Product {
    /// Create an unlinked product.
    pub fn new(
        name: impl Into<String>,
        gender: Gender,
        kind: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            gender,
            kind: kind.into(),
            url: url.into(),
            size_guide_id: None,
            guide_match: None,
        }
    }
}

/// One measurement system of a size guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRow {
    /// Canonical display name, e.g. "Europe".
    pub label: String,
    /// Canonical code: EU, UK, US, cm, JP, a brand code, or the raw label.
    pub short_label: String,
    /// Column-aligned values; index `i` is the same physical size in every row.
    pub values: Vec<String>,
}

/// A brand's size conversion table. Row 0 is the anchor scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeGuide {
    /// 1-based, unique within one adapter run.
    pub id: u32,
    pub brand: String,
    pub url: String,
    pub rows: Vec<SizeRow>,
}

impl SizeGuide {
    /// Widest row, used for the spreadsheet column headers.
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.values.len()).max().unwrap_or(0)
    }

    /// Whether every row has the same number of values as the anchor row.
    pub fn is_aligned(&self) -> bool {
        match self.rows.first() {
            Some(anchor) => self
                .rows
                .iter()
                .all(|r| r.values.len() == anchor.values.len()),
            None => true,
        }
    }
}

/// Everything one adapter produced for a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapingResult {
    pub products: Vec<Product>,
    pub size_guides: Vec<SizeGuide>,
}
