//! HTTP acquisition: the shared client and the storefront product feed.

pub mod feed;
pub mod http_client;
