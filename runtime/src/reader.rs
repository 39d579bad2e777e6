//! Table Reader on live pages.
//!
//! Row-major tables and flat grids are parsed from a snapshot of the page.
//! Dropdown tables need the page itself: the control is driven option by
//! option and the table re-read after each change.

use crate::renderer::{ElementHandle, Locator, RenderContext};
use scraper::{Html, Selector};
use sizeguide_core::labels::CM;
use sizeguide_core::table::{self, looks_like_size_data, DropdownMerge, RawRow};
use sizeguide_core::LabelCanon;

/// A DOM shape a site renders its size data in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionShape {
    /// One `<tr>` per measurement system.
    RowMajor { table: String },
    /// Containers holding a flat run of header and value items.
    FlatGrid {
        container: String,
        title: Option<String>,
        item: String,
    },
    /// A two-row table whose second row is switched through a `<select>`.
    Dropdown {
        table: String,
        control: String,
        /// Codes worth selecting, e.g. EU, UK, US.
        wanted: Vec<String>,
    },
}

impl RegionShape {
    pub fn row_major(table: &str) -> Self {
        RegionShape::RowMajor {
            table: table.to_string(),
        }
    }
}

/// Rows read from one region, with the region's title when it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub title: Option<String>,
    pub rows: Vec<RawRow>,
}

/// Read every region of `shape` on the current page. Empty when the shape
/// is not there or yields nothing.
pub async fn read_shape(
    ctx: &mut dyn RenderContext,
    shape: &RegionShape,
    canon: &LabelCanon,
    settle_ms: u64,
) -> Vec<Region> {
    match shape {
        RegionShape::RowMajor { table } => {
            let Ok(html) = ctx.get_html().await else {
                return Vec::new();
            };
            match table::find_size_table(&html, table) {
                Ok(rows) => vec![Region { title: None, rows }],
                Err(e) => {
                    tracing::debug!("no row-major table: {e}");
                    Vec::new()
                }
            }
        }
        RegionShape::FlatGrid {
            container,
            title,
            item,
        } => {
            let Ok(html) = ctx.get_html().await else {
                return Vec::new();
            };
            match table::find_flat_grids(&html, container, title.as_deref(), item) {
                Ok(grids) => grids
                    .into_iter()
                    .map(|g| Region {
                        title: g.title,
                        rows: g.rows,
                    })
                    .collect(),
                Err(e) => {
                    tracing::debug!("no flat grid: {e}");
                    Vec::new()
                }
            }
        }
        RegionShape::Dropdown {
            table,
            control,
            wanted,
        } => {
            let wanted: Vec<&str> = wanted.iter().map(String::as_str).collect();
            match read_dropdown(ctx, table, control, &wanted, canon, settle_ms).await {
                Some(rows) => vec![Region { title: None, rows }],
                None => Vec::new(),
            }
        }
    }
}

/// First element matching `table` whose text looks like size data.
async fn find_table(ctx: &dyn RenderContext, table: &str) -> Option<ElementHandle> {
    let handles = ctx.locate(&Locator::css(table)).await.ok()?;
    for handle in handles {
        if let Ok(text) = ctx.text_content(&handle).await {
            if looks_like_size_data(&text) {
                return Some(handle);
            }
        }
    }
    None
}

async fn read_table(ctx: &dyn RenderContext, handle: &ElementHandle) -> Option<Vec<RawRow>> {
    let html = ctx.inner_html(handle).await.ok()?;
    table::read_row_major(&html).ok()
}

/// Option labels of a `<select>`, from its inner HTML.
fn option_labels(select_inner_html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(&format!("<select>{select_inner_html}</select>"));
    let Ok(option) = Selector::parse("option") else {
        return Vec::new();
    };
    fragment
        .select(&option)
        .map(|o| table::element_text(&o))
        .filter(|label| !label.is_empty())
        .collect()
}

async fn read_dropdown(
    ctx: &mut dyn RenderContext,
    table: &str,
    control: &str,
    wanted: &[&str],
    canon: &LabelCanon,
    settle_ms: u64,
) -> Option<Vec<RawRow>> {
    let handle = find_table(ctx, table).await?;
    let default_rows = read_table(ctx, &handle).await?;
    let mut merge = match DropdownMerge::from_default(&default_rows, canon, wanted, CM) {
        Ok(merge) => merge,
        Err(e) => {
            tracing::debug!("dropdown table unusable: {e}");
            return None;
        }
    };

    let controls = ctx.locate(&Locator::css(control)).await.unwrap_or_default();
    let Some(select) = controls.first() else {
        tracing::debug!("no dropdown control, keeping the default rows");
        return Some(merge.finish());
    };
    let labels = match ctx.inner_html(select).await {
        Ok(html) => option_labels(&html),
        Err(_) => Vec::new(),
    };

    for label in labels {
        if !merge.wants(&label, canon) {
            continue;
        }
        if let Err(e) = ctx.select_option(select, &label).await {
            tracing::debug!("could not select {label:?}: {e:#}");
            continue;
        }
        ctx.settle(settle_ms).await;
        match read_table(ctx, &handle).await {
            Some(reread) => {
                if !merge.push_reread(&reread, canon) {
                    tracing::debug!("selecting {label:?} did not change the table");
                }
            }
            None => tracing::debug!("table unreadable after selecting {label:?}"),
        }
    }

    Some(merge.finish())
}
