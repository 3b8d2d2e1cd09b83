use indicatif::{ProgressBar, ProgressStyle};
use sitegraph_scanner::error::Result;
use sitegraph_scanner::fetch::Fetcher;
use sitegraph_scanner::{CrawlOutcome, Crawler, PageRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub url: String,
    pub max_depth: usize,
    pub max_pages: usize,
    pub workers: usize,
    pub timeout_secs: u64,
    pub retries: u32,
    /// Treat `url` as a path to an HTML file tree on disk
    pub local: bool,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_depth: 3,
            max_pages: 50,
            workers: 1,
            timeout_secs: 10,
            retries: 0,
            local: false,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Execute a crawl with the given options
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome> {
    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let pb_clone = progress_bar.clone();
    let count_clone = processed_count.clone();
    let scanner_progress: sitegraph_scanner::ProgressCallback =
        Arc::new(move |depth: usize, url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!("Crawling [depth {}] {} ({} fetched)", depth, url, count));
                pb.tick();
            }
        });

    if let Some(ref callback) = progress_callback {
        callback(format!("Crawling {}", options.url));
    }

    let outcome = if options.local {
        let crawler = configure(Crawler::local(), &options, scanner_progress);
        crawler.crawl(&options.url).await
    } else {
        let crawler = configure(
            Crawler::with_timeout(options.timeout_secs)?,
            &options,
            scanner_progress,
        );
        crawler.crawl(&options.url).await
    };

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs fetched", total));
    }

    let outcome = outcome?;

    info!(
        "Crawl of {} finished: {} visited, {} recorded, {} broken",
        outcome.base_url,
        outcome.visited_count,
        outcome.registry.len(),
        outcome.broken_links().len()
    );
    if let Some(ref error) = outcome.fatal_error {
        warn!("{}", error);
    }

    if let Some(ref callback) = progress_callback {
        if let Some(ref error) = outcome.fatal_error {
            callback(format!("[!]  {}", error));
        }
        if outcome.budget_exhausted {
            callback(format!(
                "[!]  Page budget of {} reached, crawl stopped early",
                outcome.max_pages
            ));
        }
    }

    Ok(outcome)
}

fn configure<F: Fetcher>(
    crawler: Crawler<F>,
    options: &CrawlOptions,
    progress: sitegraph_scanner::ProgressCallback,
) -> Crawler<F> {
    crawler
        .with_max_depth(options.max_depth)
        .with_max_pages(options.max_pages)
        .with_workers(options.workers)
        .with_retries(options.retries)
        .with_progress_callback(progress)
}

/// Generate a terminal crawl report from an outcome
pub fn generate_crawl_report(outcome: &CrawlOutcome, include_skipped: bool) -> String {
    let records = outcome.links(include_skipped);

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Base URL: {}\n", outcome.base_url));
    report.push_str(&format!("  Pages visited: {}\n", outcome.visited_count));
    report.push_str(&format!("  Links recorded: {}\n", outcome.registry.len()));
    report.push_str(&format!(
        "  Broken links: {}\n",
        outcome.broken_links().len()
    ));
    report.push_str(&format!(
        "  External links: {}\n",
        outcome.registry.iter().filter(|r| r.external_link).count()
    ));
    if outcome.budget_exhausted {
        report.push_str(&format!("  Stopped at page budget ({})\n", outcome.max_pages));
    }
    if let Some(ref error) = outcome.fatal_error {
        report.push_str(&format!("  \x1b[31mError: {}\x1b[0m\n", error));
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Group records by the depth they were discovered at
    let mut by_depth: BTreeMap<Option<usize>, Vec<&PageRecord>> = BTreeMap::new();
    for record in records {
        by_depth.entry(record.depth).or_default().push(record);
    }

    for (depth, depth_records) in &by_depth {
        match depth {
            Some(depth) => report.push_str(&format!("## Depth {}\n", depth)),
            None => report.push_str("## Unscheduled\n"),
        }
        report.push_str(&format!("  {} links\n\n", depth_records.len()));

        for record in depth_records {
            let status_str = match record.status_code {
                Some(status @ 100..=199) => format!("\x1b[37m{}\x1b[0m", status), // White
                Some(status @ 200..=299) => format!("\x1b[32m{}\x1b[0m", status), // Green
                Some(status @ 300..=399) => format!("\x1b[36m{}\x1b[0m", status), // Cyan
                Some(status @ 400..=499) => format!("\x1b[33m{}\x1b[0m", status), // Orange/Yellow
                Some(status @ 500..=599) => format!("\x1b[31m{}\x1b[0m", status), // Red
                Some(status) => format!("{}", status),
                None if record.dont_visit => "\x1b[90mskip\x1b[0m".to_string(),
                None => "\x1b[90m---\x1b[0m".to_string(),
            };

            let mut line = format!("  {} {}", status_str, record.canonical_key);

            if record.external_link {
                line.push_str(" \x1b[35m(external)\x1b[0m");
            }

            // Only show MIME type if it's not HTML
            if let Some(ref content_type) = record.content_type
                && !content_type.starts_with("text/html")
            {
                line.push_str(&format!(" \x1b[90m{}\x1b[0m", content_type));
            }

            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = CrawlOptions::default();
        assert_eq!(options.max_depth, 3);
        assert_eq!(options.max_pages, 50);
        assert_eq!(options.workers, 1);
        assert!(!options.local);
    }
}
