//! Search API access: per-locale organic results.

pub(crate) mod client;
mod locale;
pub(crate) mod types;

pub use client::{SearchClient, SearchError, SerperClient};
pub use locale::Locale;
pub use types::SearchResult;
