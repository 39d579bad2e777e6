//! Size guide assembly, standardization and product linking.

use crate::labels::{LabelCanon, CM, EU, UK, US};
use crate::table::RawRow;
use crate::types::{Gender, GuideMatch, Product, SizeGuide, SizeRow};

/// Codes kept by [`standardize`] for brands that publish many systems.
pub const STANDARD_CODES: &[&str] = &[EU, UK, US, CM];

/// Build a guide from raw rows, canonicalizing every label.
///
/// Rows without a single non-empty value are dropped. Returns `None` when no
/// row survives. Ragged guides are kept but logged.
pub fn assemble_guide(
    id: u32,
    brand: &str,
    url: &str,
    raw_rows: &[RawRow],
    canon: &LabelCanon,
) -> Option<SizeGuide> {
    let rows: Vec<SizeRow> = raw_rows
        .iter()
        .filter_map(|raw| {
            let values: Vec<String> = raw
                .values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if values.is_empty() {
                return None;
            }
            Some(SizeRow {
                label: canon.long_label(&raw.label),
                short_label: canon.short_label(&raw.label),
                values,
            })
        })
        .collect();

    if rows.is_empty() {
        return None;
    }

    let guide = SizeGuide {
        id,
        brand: brand.to_string(),
        url: url.to_string(),
        rows,
    };
    if !guide.is_aligned() {
        tracing::warn!(
            "size guide {} for {} has rows of different lengths",
            guide.id,
            guide.brand
        );
    }
    Some(guide)
}

/// Keep the anchor row and the rows whose code is in `allowed`.
pub fn standardize(guide: &mut SizeGuide, allowed: &[&str]) {
    let mut index = 0;
    guide.rows.retain(|row| {
        let keep = index == 0 || allowed.contains(&row.short_label.as_str());
        index += 1;
        keep
    });
}

/// Brand name of a guide that only applies to one gender, "Kleman (Homme)".
pub fn gendered_brand(brand: &str, gender: Gender) -> String {
    format!("{brand} ({gender})")
}

/// Gender suffix of a guide brand, if it carries one.
pub fn brand_gender(brand: &str) -> Option<Gender> {
    let inner = brand.trim().strip_suffix(')')?;
    let (_, suffix) = inner.rsplit_once('(')?;
    [Gender::Homme, Gender::Femme, Gender::Enfant, Gender::Unisex]
        .into_iter()
        .find(|g| g.as_str().eq_ignore_ascii_case(suffix.trim()))
}

/// Assign every product a guide id.
///
/// Without guides every id stays empty. When guides are split by gender a
/// product links to the guide of its gender, or to the first guide when there
/// is none for it. Otherwise every product links to the first guide.
pub fn link_products(products: &mut [Product], guides: &[SizeGuide]) {
    let Some(first) = guides.first() else {
        for product in products.iter_mut() {
            product.size_guide_id = None;
            product.guide_match = None;
        }
        return;
    };

    let split: Vec<(Gender, u32)> = guides
        .iter()
        .filter_map(|g| brand_gender(&g.brand).map(|gender| (gender, g.id)))
        .collect();

    for product in products.iter_mut() {
        let (id, how) = if split.is_empty() {
            (first.id, GuideMatch::NoGenderSplit)
        } else {
            match split.iter().find(|(gender, _)| *gender == product.gender) {
                Some((_, id)) => (*id, GuideMatch::GenderSuffix),
                None => (first.id, GuideMatch::FirstGuideUnmatchedGender),
            }
        };
        product.size_guide_id = Some(id);
        product.guide_match = Some(how);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_row_major;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn guide(id: u32, brand: &str) -> SizeGuide {
        SizeGuide {
            id,
            brand: brand.to_string(),
            url: "https://shop.test/pages/guide".into(),
            rows: vec![SizeRow {
                label: "Europe".into(),
                short_label: "EU".into(),
                values: strings(&["40"]),
            }],
        }
    }

    fn product(gender: Gender) -> Product {
        Product::new("Derby Noir", gender, "Derby", "https://shop.test/products/derby-noir")
    }

    #[test]
    fn test_europe_uk_table_becomes_two_canonical_rows() {
        let html = r#"<table>
            <tr><td>Europe</td><td>40</td><td>41</td><td>42</td></tr>
            <tr><td>UK</td><td>6.5</td><td>7</td><td>7.5</td></tr>
        </table>"#;
        let raw = read_row_major(html).unwrap();
        let g = assemble_guide(1, "Shop", "https://shop.test", &raw, &LabelCanon::new()).unwrap();

        assert_eq!(g.rows.len(), 2);
        assert_eq!(g.rows[0].short_label, "EU");
        assert_eq!(g.rows[0].label, "Europe");
        assert_eq!(g.rows[1].short_label, "UK");
        assert_eq!(g.rows[1].label, "Royaume-Uni");
        assert!(g.rows.iter().all(|r| r.values.len() == 3));
        assert!(g.is_aligned());
    }

    #[test]
    fn test_assemble_drops_valueless_rows() {
        let raw = vec![
            RawRow::new("EU", strings(&["40", "41"])),
            RawRow::new("UK", strings(&["", " "])),
        ];
        let g = assemble_guide(1, "Shop", "u", &raw, &LabelCanon::new()).unwrap();
        assert_eq!(g.rows.len(), 1);

        let empty = vec![RawRow::new("UK", vec![])];
        assert!(assemble_guide(1, "Shop", "u", &empty, &LabelCanon::new()).is_none());
    }

    #[test]
    fn test_standardize_keeps_anchor_and_allowed_codes() {
        let canon = LabelCanon::new().with_brand("prada", "Prada");
        let raw = vec![
            RawRow::new("Prada", strings(&["5", "6"])),
            RawRow::new("Europe", strings(&["39", "40"])),
            RawRow::new("Japon", strings(&["24", "25"])),
            RawRow::new("Pouces", strings(&["9.6", "10"])),
            RawRow::new("Longueur pied", strings(&["25", "26"])),
        ];
        let mut g = assemble_guide(1, "Prada", "u", &raw, &canon).unwrap();
        standardize(&mut g, STANDARD_CODES);

        let codes: Vec<&str> = g.rows.iter().map(|r| r.short_label.as_str()).collect();
        assert_eq!(codes, vec!["Prada", "EU", "cm"]);
        assert!(g.rows[1..]
            .iter()
            .all(|r| STANDARD_CODES.contains(&r.short_label.as_str())));
    }

    #[test]
    fn test_brand_gender_suffix() {
        assert_eq!(brand_gender("Kleman (Homme)"), Some(Gender::Homme));
        assert_eq!(brand_gender(&gendered_brand("Kleman", Gender::Femme)), Some(Gender::Femme));
        assert_eq!(brand_gender("Kleman"), None);
        assert_eq!(brand_gender("Kleman (Edition limitée)"), None);
    }

    #[test]
    fn test_link_without_guides_leaves_ids_empty() {
        let mut products = vec![product(Gender::Homme), product(Gender::Unisex)];
        link_products(&mut products, &[]);
        assert!(products.iter().all(|p| p.size_guide_id.is_none()));
        assert!(products.iter().all(|p| p.guide_match.is_none()));
    }

    #[test]
    fn test_link_by_gender_suffix() {
        let guides = vec![guide(1, "Kleman (Homme)"), guide(2, "Kleman (Femme)")];
        let mut products = vec![
            product(Gender::Femme),
            product(Gender::Homme),
            product(Gender::Unisex),
        ];
        link_products(&mut products, &guides);

        assert_eq!(products[0].size_guide_id, Some(2));
        assert_eq!(products[0].guide_match, Some(GuideMatch::GenderSuffix));
        assert_eq!(products[1].size_guide_id, Some(1));
        assert_eq!(products[2].size_guide_id, Some(1));
        assert_eq!(
            products[2].guide_match,
            Some(GuideMatch::FirstGuideUnmatchedGender)
        );
    }

    #[test]
    fn test_link_single_neutral_guide() {
        let guides = vec![guide(1, "Labottegardiane")];
        let mut products = vec![product(Gender::Femme), product(Gender::Enfant)];
        link_products(&mut products, &guides);
        for p in &products {
            assert_eq!(p.size_guide_id, Some(1));
            assert_eq!(p.guide_match, Some(GuideMatch::NoGenderSplit));
        }
    }
}
