//! Table Reader: turn a located size-table region into raw rows.
//!
//! Three DOM shapes are supported, all read from HTML snapshots:
//!
//! - **Row-major tables** (`<table>` with one `<tr>` per measurement system),
//!   see [`read_row_major`] and [`find_size_table`].
//! - **Flattened div grids**, where a container exposes a flat run of items
//!   whose first few are column headers (EU, UK, US, CM, Pouces), see
//!   [`read_flat_grid`] and [`find_flat_grids`].
//! - **Dropdown-driven tables**, showing an anchor row plus one alternate
//!   system chosen through a control. The page interaction lives in the
//!   runtime; [`DropdownMerge`] holds the merge rules.
//!
//! Readers report typed [`TableError`]s. Callers treat every error as "no
//! guide here" and move on to the next candidate.

use crate::keywords::fold;
use crate::labels::LabelCanon;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Header tokens recognized at the start of a flattened grid.
const GRID_HEADERS: &[&str] = &["eu", "uk", "us", "cm", "pouces"];

/// Tokens whose presence marks a region as a size table.
pub const SIZE_TOKENS: &[&str] = &["eu", "uk", "us", "cm", "pointure", "taille"];

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));
static CM_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+(?:[.,]\d+)?)\s*cm$").expect("invalid unit regex"));

/// Failure to read a located region.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("no usable rows in region")]
    NoRows,
    #[error("grid has no recognized header prefix")]
    EmptyHeader,
    #[error("grid has headers but no complete data row")]
    NoColumns,
    #[error("dropdown table needs an anchor and an alternate row, found {0}")]
    MissingBaseline(usize),
    #[error("invalid selector: {0}")]
    Selector(String),
}

/// One row as read from the page: a label cell plus its value cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub label: String,
    pub values: Vec<String>,
}

impl RawRow {
    pub fn new(label: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

/// A flattened grid read from one container, with its optional title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTable {
    pub title: Option<String>,
    pub rows: Vec<RawRow>,
}

pub(crate) fn parse_selector(css: &str) -> Result<Selector, TableError> {
    Selector::parse(css).map_err(|e| TableError::Selector(format!("{css}: {e}")))
}

/// Visible text of an element, text nodes joined by a space and whitespace
/// collapsed.
pub fn element_text(el: &ElementRef<'_>) -> String {
    clean_cell(&el.text().collect::<Vec<_>>().join(" "))
}

/// Collapse runs of whitespace and trim.
pub fn clean_cell(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Drop a trailing "cm" unit from a numeric value ("22.5 cm" → "22.5").
pub fn strip_unit(value: &str) -> String {
    match CM_SUFFIX.captures(value) {
        Some(caps) => caps[1].to_string(),
        None => value.to_string(),
    }
}

/// Whether a region's text looks like size data.
///
/// Plain substring match on the folded text, so spelled-out headers such as
/// "Europe" or "Etats-Unis" count.
pub fn looks_like_size_data(text: &str) -> bool {
    let folded = fold(text);
    SIZE_TOKENS.iter().any(|token| folded.contains(token))
}

// ── Row-major tables ────────────────────────────────────────────────────────

/// Read a row-major table from its HTML (`<table>` outer HTML or the inner
/// HTML of one).
///
/// Each `<tr>` contributes its header cells followed by its data cells. The
/// first cell is the label, the remaining non-empty cells are the values. Rows
/// with fewer than two non-empty cells are skipped.
pub fn read_row_major(table_html: &str) -> Result<Vec<RawRow>, TableError> {
    // Fragments are parsed in a body context where bare <tr> tags are dropped.
    let wrapped;
    let html = if table_html.trim_start().starts_with("<table") {
        table_html
    } else {
        wrapped = format!("<table>{table_html}</table>");
        &wrapped
    };

    let fragment = Html::parse_fragment(html);
    let tr = parse_selector("tr")?;
    let th = parse_selector("th")?;
    let td = parse_selector("td")?;

    let mut rows = Vec::new();
    for row in fragment.select(&tr) {
        let cells: Vec<String> = row
            .select(&th)
            .chain(row.select(&td))
            .map(|c| element_text(&c))
            .collect();

        if cells.iter().filter(|c| !c.is_empty()).count() < 2 {
            continue;
        }

        let label = cells[0].clone();
        let values: Vec<String> = cells[1..]
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| strip_unit(c))
            .collect();
        rows.push(RawRow { label, values });
    }

    if rows.is_empty() {
        return Err(TableError::NoRows);
    }
    Ok(rows)
}

/// Find the first element matching `table_selector` in a page snapshot whose
/// text looks like size data and read it as a row-major table.
pub fn find_size_table(page_html: &str, table_selector: &str) -> Result<Vec<RawRow>, TableError> {
    let document = Html::parse_document(page_html);
    let selector = parse_selector(table_selector)?;

    for table in document.select(&selector) {
        if !looks_like_size_data(&element_text(&table)) {
            continue;
        }
        match read_row_major(&table.html()) {
            Ok(rows) => return Ok(rows),
            Err(e) => tracing::debug!("size-like table skipped: {e}"),
        }
    }
    Err(TableError::NoRows)
}

// ── Flattened div grids ─────────────────────────────────────────────────────

/// Reshape a flat item run into one row per header.
///
/// The header prefix is every leading item found in the grid vocabulary. With
/// `H` headers the remaining items form `floor(remaining / H)` visual rows;
/// header `h` receives `data[h], data[h + H], data[h + 2H], …`.
pub fn read_flat_grid(items: &[String]) -> Result<Vec<RawRow>, TableError> {
    let header_count = items
        .iter()
        .take_while(|item| GRID_HEADERS.contains(&fold(item.trim()).as_str()))
        .count();
    if header_count == 0 {
        return Err(TableError::EmptyHeader);
    }

    let data = &items[header_count..];
    let depth = data.len() / header_count;
    if depth == 0 {
        return Err(TableError::NoColumns);
    }

    let rows = items[..header_count]
        .iter()
        .enumerate()
        .map(|(h, header)| RawRow {
            label: header.trim().to_string(),
            values: (0..depth)
                .map(|k| strip_unit(data[h + k * header_count].trim()))
                .collect(),
        })
        .collect();
    Ok(rows)
}

/// Read every grid container in a page snapshot.
///
/// `item_selector` is evaluated inside each container and must match the
/// header items and the data items in document order. Containers that do not
/// read are skipped; an error is returned only when none does.
pub fn find_flat_grids(
    page_html: &str,
    container_selector: &str,
    title_selector: Option<&str>,
    item_selector: &str,
) -> Result<Vec<GridTable>, TableError> {
    let document = Html::parse_document(page_html);
    let container = parse_selector(container_selector)?;
    let item = parse_selector(item_selector)?;
    let title = title_selector.map(parse_selector).transpose()?;

    let mut grids = Vec::new();
    for node in document.select(&container) {
        let items: Vec<String> = node.select(&item).map(|i| element_text(&i)).collect();
        match read_flat_grid(&items) {
            Ok(rows) => {
                let title = title
                    .as_ref()
                    .and_then(|sel| node.select(sel).next())
                    .map(|t| element_text(&t))
                    .filter(|t| !t.is_empty());
                grids.push(GridTable { title, rows });
            }
            Err(e) => tracing::debug!("grid container skipped: {e}"),
        }
    }

    if grids.is_empty() {
        return Err(TableError::NoRows);
    }
    Ok(grids)
}

// ── Dropdown-driven tables ──────────────────────────────────────────────────

/// Merge state for a table whose second row is switched through a control.
///
/// Built from the default render, then fed one re-read per selected option.
/// The foot-length row is captured once from the default render and appended
/// last, unless the last appended row already carries its code. That rule
/// also drops a distinct system that happens to share the foot row's code.
#[derive(Debug, Clone)]
pub struct DropdownMerge {
    rows: Vec<RawRow>,
    codes: Vec<String>,
    foot: Option<(RawRow, String)>,
    wanted: Vec<String>,
}

impl DropdownMerge {
    /// Start from the rows of the default render.
    ///
    /// The first two rows form the baseline; the first later row whose code is
    /// `foot_code` is kept as the foot-length row.
    pub fn from_default(
        default_rows: &[RawRow],
        canon: &LabelCanon,
        wanted: &[&str],
        foot_code: &str,
    ) -> Result<Self, TableError> {
        if default_rows.len() < 2 {
            return Err(TableError::MissingBaseline(default_rows.len()));
        }

        let rows: Vec<RawRow> = default_rows[..2].to_vec();
        let codes = rows.iter().map(|r| canon.short_label(&r.label)).collect();
        let foot = default_rows[2..]
            .iter()
            .map(|r| (r.clone(), canon.short_label(&r.label)))
            .find(|(_, code)| code == foot_code);

        Ok(Self {
            rows,
            codes,
            foot,
            wanted: wanted.iter().map(|w| w.to_string()).collect(),
        })
    }

    /// Whether selecting the option labelled `option_label` would add a
    /// wanted system not read yet.
    pub fn wants(&self, option_label: &str, canon: &LabelCanon) -> bool {
        let code = canon.short_label(option_label);
        self.wanted.contains(&code) && !self.codes.contains(&code)
    }

    /// Record the second row of a re-read after selecting an option.
    ///
    /// Returns `false` when the re-read row is missing or its system is
    /// already present, which is what a selection that did not take effect
    /// looks like.
    pub fn push_reread(&mut self, reread: &[RawRow], canon: &LabelCanon) -> bool {
        let Some(row) = reread.get(1) else {
            return false;
        };
        let code = canon.short_label(&row.label);
        if self.codes.contains(&code) {
            return false;
        }
        self.rows.push(row.clone());
        self.codes.push(code);
        true
    }

    /// Final row list: baseline, alternates, then the foot-length row.
    pub fn finish(mut self) -> Vec<RawRow> {
        if let Some((foot, code)) = self.foot {
            if self.codes.last() != Some(&code) {
                self.rows.push(foot);
            }
        }
        self.rows
    }
}
