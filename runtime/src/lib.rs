// Copyright 2026 Sizeguide Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sizeguide runtime: page engines, site adapters and spreadsheet export.
//!
//! The binary is a thin wrapper over [`cli::scrape_cmd::run`].

pub mod acquisition;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod export;
pub mod guide_finder;
pub mod reader;
pub mod renderer;
pub mod sites;
