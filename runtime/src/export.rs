//! Spreadsheet export.
//!
//! Two sheets: "Products" lists every product with its guide id, "Size
//! guides" stacks the guides vertically, one block per guide:
//!
//! ```text
//! Size guide | 1              | URL     | https://…
//! (blank)
//!            | Measurement systems | Size 1 | Size 2 | …
//! Kleman     | Kleman         | 40      | 41     | …
//! Royaume-Uni| UK             | 6.5     | 7      | …
//! Longueur pied |             | 25      | 26     | …
//! (blank)
//! (blank)
//! ```

use anyhow::{Context, Result};
use regex::Regex;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use sizeguide_core::labels::CM;
use sizeguide_core::links::bare_host;
use sizeguide_core::{Product, ScrapingResult, SizeGuide};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

pub const PRODUCTS_SHEET: &str = "Products";
pub const GUIDES_SHEET: &str = "Size guides";

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("invalid number regex"));

/// A cell value as written to the sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Numbers for values like "40" or "6.5", text otherwise.
    pub fn from_size(value: &str) -> Self {
        let trimmed = value.trim();
        if NUMBER.is_match(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                return CellValue::Number(n);
            }
        }
        CellValue::Text(value.to_string())
    }

    fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }
}

/// One positioned cell of the guides sheet (0-based row and column).
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedCell {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
    pub bold: bool,
}

/// Sheet column of the `i`-th size value.
fn value_col(i: usize) -> Result<u16> {
    i.checked_add(2)
        .and_then(|col| u16::try_from(col).ok())
        .with_context(|| format!("size column {} does not fit in a worksheet", i + 1))
}

/// Lay out every guide block of the "Size guides" sheet.
pub fn guide_cells(guides: &[SizeGuide]) -> Result<Vec<PlacedCell>> {
    let mut cells = Vec::new();
    let mut put = |row: u32, col: u16, value: CellValue, bold: bool| {
        cells.push(PlacedCell {
            row,
            col,
            value,
            bold,
        });
    };

    let mut row = 0u32;
    for guide in guides {
        put(row, 0, CellValue::text("Size guide"), true);
        put(row, 1, CellValue::Number(f64::from(guide.id)), false);
        put(row, 2, CellValue::text("URL"), false);
        put(row, 3, CellValue::text(guide.url.clone()), false);
        row += 2;

        put(row, 1, CellValue::text("Measurement systems"), true);
        for i in 0..guide.width() {
            put(row, value_col(i)?, CellValue::text(format!("Size {}", i + 1)), true);
        }
        row += 1;

        put(row, 0, CellValue::text(guide.brand.clone()), true);
        put(row, 1, CellValue::text(guide.brand.clone()), false);
        if let Some(anchor) = guide.rows.first() {
            for (i, value) in anchor.values.iter().enumerate() {
                put(row, value_col(i)?, CellValue::from_size(value), false);
            }
        }
        row += 1;

        for size_row in guide.rows.iter().skip(1) {
            put(row, 0, CellValue::text(size_row.label.clone()), false);
            if size_row.short_label != CM {
                put(row, 1, CellValue::text(size_row.short_label.clone()), false);
            }
            for (i, value) in size_row.values.iter().enumerate() {
                put(row, value_col(i)?, CellValue::from_size(value), false);
            }
            row += 1;
        }

        row += 2;
    }
    Ok(cells)
}

/// `<output_dir>/<site>_size_guides.xlsx`, where `<site>` is the host without
/// `www.` and without its last label.
pub fn output_path(output_dir: &Path, site_url: &str) -> Result<PathBuf> {
    let url = Url::parse(site_url).with_context(|| format!("invalid URL: {site_url}"))?;
    let host = bare_host(&url);
    let site = match host.rsplit_once('.') {
        Some((name, _tld)) => name.to_string(),
        None => host,
    };
    Ok(output_dir.join(format!("{site}_size_guides.xlsx")))
}

fn write_products(sheet: &mut Worksheet, products: &[Product], bold: &Format) -> Result<()> {
    sheet.set_name(PRODUCTS_SHEET)?;
    let headers = [
        ("Name", 50.0),
        ("Gender", 12.0),
        ("Type", 15.0),
        ("URL", 70.0),
        ("Size guide", 18.0),
    ];
    for (col, (title, width)) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, bold)?;
        sheet.set_column_width(col as u16, *width)?;
    }

    for (i, product) in products.iter().enumerate() {
        let row = u32::try_from(i + 1).context("too many products for one worksheet")?;
        sheet.write_string(row, 0, &product.name)?;
        sheet.write_string(row, 1, product.gender.as_str())?;
        sheet.write_string(row, 2, &product.kind)?;
        sheet.write_string(row, 3, &product.url)?;
        if let Some(id) = product.size_guide_id {
            sheet.write_number(row, 4, f64::from(id))?;
        }
    }
    Ok(())
}

fn write_guides(sheet: &mut Worksheet, guides: &[SizeGuide], bold: &Format) -> Result<()> {
    sheet.set_name(GUIDES_SHEET)?;
    for cell in guide_cells(guides)? {
        match (&cell.value, cell.bold) {
            (CellValue::Text(s), true) => {
                sheet.write_string_with_format(cell.row, cell.col, s, bold)?;
            }
            (CellValue::Text(s), false) => {
                sheet.write_string(cell.row, cell.col, s)?;
            }
            (CellValue::Number(n), true) => {
                sheet.write_number_with_format(cell.row, cell.col, *n, bold)?;
            }
            (CellValue::Number(n), false) => {
                sheet.write_number(cell.row, cell.col, *n)?;
            }
        }
    }
    sheet.set_column_width(0, 20)?;
    sheet.set_column_width(1, 22)?;
    for col in 2..25u16 {
        sheet.set_column_width(col, 10)?;
    }
    Ok(())
}

/// Write the workbook for `result` under `output_dir`, creating the
/// directory if needed. Returns the file written.
pub fn export(result: &ScrapingResult, output_dir: &Path, site_url: &str) -> Result<PathBuf> {
    let path = output_path(output_dir, site_url)?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;

    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    write_products(workbook.add_worksheet(), &result.products, &bold)?;
    write_guides(workbook.add_worksheet(), &result.size_guides, &bold)?;
    workbook
        .save(&path)
        .with_context(|| format!("cannot write {}", path.display()))?;

    tracing::info!("spreadsheet saved: {}", path.display());
    Ok(path)
}
