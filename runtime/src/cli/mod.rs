//! Command implementations for the `sizeguide` binary.

pub mod scrape_cmd;
