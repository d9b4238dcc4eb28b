//! URL handling module for Prerender-Crawl
//!
//! This module decides crawl identity and admission for discovered URLs:
//! query/fragment stripping, same-host and same-port eligibility, and
//! configured path exclusions.

mod filter;

pub use filter::UrlFilter;
