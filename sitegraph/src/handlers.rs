use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use sitegraph_core::crawl::{CrawlOptions, execute_crawl, generate_crawl_report};
use sitegraph_core::report::{ReportFormat, gather_report_data, render_report, save_report};
use sitegraph_scanner::CrawlOutcome;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, debug};
use url::Url;

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // Try to parse as-is
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok_and(|url| url.has_host()) {
        return Some(with_scheme);
    }

    None
}

/// Expand a leading `~` in a user supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Build crawl options from the `crawl` subcommand's arguments
pub fn crawl_options_from_matches(sub_matches: &ArgMatches) -> Result<CrawlOptions> {
    let domain = sub_matches
        .get_one::<String>("DOMAIN")
        .context("a domain to crawl is required")?;
    let local = sub_matches.get_flag("local");

    let url = if local {
        expand_path(domain).to_string_lossy().into_owned()
    } else {
        match parse_url_line(domain) {
            Some(url) => url,
            None => bail!("'{}' is not a valid URL", domain),
        }
    };

    Ok(CrawlOptions {
        url,
        max_depth: *sub_matches.get_one::<usize>("max-depth").unwrap_or(&3),
        max_pages: *sub_matches.get_one::<usize>("max-pages").unwrap_or(&50),
        workers: *sub_matches.get_one::<usize>("workers").unwrap_or(&1),
        timeout_secs: *sub_matches.get_one::<u64>("timeout").unwrap_or(&10),
        retries: *sub_matches.get_one::<u32>("retries").unwrap_or(&0),
        local,
        show_progress_bars: true,
    })
}

/// Render the outcome the way the user asked for. With neither a format nor
/// an output file the colored terminal summary is used.
pub fn render_outcome(
    outcome: &CrawlOutcome,
    format: Option<&str>,
    to_file: bool,
    include_skipped: bool,
    include_sitemap: bool,
) -> Result<String> {
    if format.is_none() && !to_file {
        return Ok(generate_crawl_report(outcome, include_skipped));
    }

    let format = match format {
        Some(name) => ReportFormat::from_str(name)
            .with_context(|| format!("unknown report format '{}'", name))?,
        None => ReportFormat::Text,
    };

    let data = gather_report_data(outcome, include_skipped, include_sitemap);
    render_report(&data, format).context("failed to serialize report")
}

pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    if let Err(e) = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
    {
        debug!("Tracing subscriber already installed: {}", e);
    }
}

pub fn print_banner() {
    println!(
        "{} {}",
        "sitegraph".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    init_tracing(sub_matches.get_flag("verbose"));

    let mut options = crawl_options_from_matches(sub_matches)?;
    options.show_progress_bars = !quiet;

    let format = sub_matches.get_one::<String>("format").map(String::as_str);
    let output = sub_matches
        .get_one::<String>("output")
        .map(String::as_str)
        .map(expand_path);
    let include_skipped = !sub_matches.get_flag("hide-skipped");
    let include_sitemap = sub_matches.get_flag("include-sitemap");

    // Print crawl configuration
    if !quiet {
        print_divider();
        println!("🕷️  Crawling {}", options.url.bright_white().bold());
        println!("Max depth: {}", options.max_depth);
        println!("Max pages: {}", options.max_pages);
        println!("Workers: {}", options.workers);
        if options.local {
            println!("Mode: local files");
        } else {
            println!("Timeout: {}s, retries: {}", options.timeout_secs, options.retries);
        }
        print_divider();
        println!();
    }

    let progress_callback = Arc::new(move |msg: String| {
        if !quiet {
            println!("{}", msg);
        }
    });

    let outcome = execute_crawl(options, Some(progress_callback))
        .await
        .context("crawl failed")?;

    if !quiet {
        println!("\n{} Crawl complete!\n", "✓".green().bold());
    }

    let report = render_outcome(
        &outcome,
        format,
        output.is_some(),
        include_skipped,
        include_sitemap,
    )?;

    match output {
        Some(path) => {
            save_report(&report, &path)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            if !quiet {
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
        None => print!("{}", report),
    }

    if let Some(error) = outcome.fatal_error {
        bail!(error);
    }

    Ok(())
}
