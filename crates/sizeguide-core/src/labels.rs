//! Label canonicalizer: free-text row labels to measurement-system codes.
//!
//! Sites label their rows "Europe", "EU", "Royaume-Uni", "Longueur pied (cm)"
//! and so on. [`LabelCanon::short_label`] maps them to a fixed set of codes,
//! [`LabelCanon::long_label`] to the display name used in the spreadsheet.
//! Families are checked in order and the first hit wins, so a label that
//! mentions both "pied" and "cm" resolves by check order, not specificity.
//! Unrecognized labels pass through trimmed but otherwise untouched.

use crate::keywords::{any_hit, fold};

pub const EU: &str = "EU";
pub const UK: &str = "UK";
pub const US: &str = "US";
pub const CM: &str = "cm";
pub const JP: &str = "JP";

/// Ordered keyword families for the standard systems.
const FAMILIES: &[(&str, &[&str])] = &[
    (EU, &["europe", "eu"]),
    (UK, &["royaume", "uk"]),
    (US, &["etats", "us", "usa", "unis"]),
    (CM, &["longueur", "cm", "pied"]),
    (JP, &["japon", "jp"]),
];

/// Canonicalizer for one site: the standard families plus that site's brand
/// scale tokens.
#[derive(Debug, Clone, Default)]
pub struct LabelCanon {
    /// `(folded token, brand code)` pairs, checked after the standard families.
    brands: Vec<(String, String)>,
}

impl LabelCanon {
    /// Canonicalizer with no brand scale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a brand scale: labels containing `token` map to `code`.
    pub fn with_brand(mut self, token: &str, code: &str) -> Self {
        self.brands.push((fold(token), code.to_string()));
        self
    }

    /// Canonical code for `raw`, or `raw` trimmed when nothing matches.
    pub fn short_label(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let folded = fold(trimmed);

        if let Some((code, _)) = FAMILIES
            .iter()
            .find(|(_, keywords)| any_hit(&folded, keywords))
        {
            return (*code).to_string();
        }

        if let Some((_, code)) = self
            .brands
            .iter()
            .find(|(token, _)| folded.contains(token.as_str()))
        {
            return code.clone();
        }

        trimmed.to_string()
    }

    /// Display name for a raw label or code.
    pub fn long_label(&self, raw: &str) -> String {
        let code = self.short_label(raw);
        match code.as_str() {
            EU => "Europe".to_string(),
            UK => "Royaume-Uni".to_string(),
            US => "Etats-Unis".to_string(),
            CM => "Longueur pied".to_string(),
            JP => "Japon".to_string(),
            _ => code,
        }
    }
}
