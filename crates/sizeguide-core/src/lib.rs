// Copyright 2026 Sizeguide Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sizeguide core: the pure half of the size-guide scraper.
//!
//! Everything in this crate works on strings and HTML snapshots: label
//! canonicalization, the table reading strategies, product classification and
//! the guide/product linking pass. Page rendering and network access live in
//! `sizeguide-runtime`.

pub mod classify;
pub mod guide;
pub mod keywords;
pub mod labels;
pub mod links;
pub mod table;
pub mod types;

pub use guide::{assemble_guide, link_products, standardize, STANDARD_CODES};
pub use labels::LabelCanon;
pub use table::{DropdownMerge, RawRow, TableError};
pub use types::*;
