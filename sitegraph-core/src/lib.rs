pub mod crawl;
pub mod map;
pub mod report;

pub use crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl, generate_crawl_report};
pub use map::LinkMap;
pub use report::{ReportFormat, gather_report_data, render_report, save_report};
