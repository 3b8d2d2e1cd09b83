pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{crawl_options_from_matches, parse_url_line, render_outcome};

// Re-export crawl functionality from sitegraph-core
pub use sitegraph_core::crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, generate_crawl_report,
};
