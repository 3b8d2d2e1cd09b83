pub mod crawler;
pub mod document;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod frontier;
pub mod record;
pub mod registry;
pub mod resolve;
pub mod result;

pub use crawler::{Crawler, ProgressCallback};
pub use error::ScanError;
pub use extract::{LinkExtractor, LinkFilter};
pub use fetch::{FetchResponse, Fetcher, FileFetcher, HttpFetcher};
pub use record::PageRecord;
pub use registry::LinkRegistry;
pub use resolve::UrlResolver;
pub use result::CrawlOutcome;
