//! Bilingual research: search both locales, scrape the top links, render the brief.

mod aggregator;
mod prompt;

pub use aggregator::{
    ContentAggregator, RESULTS_PER_LOCALE, ResearchBundle, ResearchError, TIMESTAMP_FORMAT,
};
pub use prompt::render_initial_message;
