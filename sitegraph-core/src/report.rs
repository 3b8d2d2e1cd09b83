// Report generation from a finished crawl

use crate::map::{LinkMap, SitemapNode, depth_distribution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitegraph_scanner::{CrawlOutcome, PageRecord};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

const HEAVY_RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_records: usize,
    pub visited: usize,
    pub broken: usize,
    pub external: usize,
    pub skipped: usize,
    pub depth_distribution: BTreeMap<usize, usize>,
    pub dead_ends: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlInfo {
    pub session_id: String,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub max_depth: usize,
    pub max_pages: usize,
    pub budget_exhausted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub crawl: CrawlInfo,
    pub summary: ReportSummary,
    pub records: Vec<PageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<SitemapNode>,
}

/// Collect everything a report needs. The summary always covers the whole
/// registry; `include_skipped` only affects the record list.
pub fn gather_report_data(
    outcome: &CrawlOutcome,
    include_skipped: bool,
    include_sitemap: bool,
) -> ReportData {
    let map = LinkMap::build(outcome);
    let records: Vec<&PageRecord> = outcome.registry.iter().collect();

    let summary = ReportSummary {
        total_records: records.len(),
        visited: records.iter().filter(|r| r.visited).count(),
        broken: records.iter().filter(|r| r.is_broken()).count(),
        external: records.iter().filter(|r| r.external_link).count(),
        skipped: records.iter().filter(|r| r.dont_visit).count(),
        depth_distribution: depth_distribution(outcome),
        dead_ends: map.dead_ends().into_iter().map(str::to_string).collect(),
    };

    ReportData {
        crawl: CrawlInfo {
            session_id: outcome.session_id.to_string(),
            base_url: outcome.base_url.clone(),
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
            duration_seconds: outcome.duration_secs(),
            max_depth: outcome.max_depth,
            max_pages: outcome.max_pages,
            budget_exhausted: outcome.budget_exhausted,
            fatal_error: outcome.fatal_error.clone(),
        },
        summary,
        records: outcome
            .links(include_skipped)
            .into_iter()
            .cloned()
            .collect(),
        sitemap: if include_sitemap { map.sitemap() } else { None },
    }
}

/// Render `data` in `format`.
pub fn render_report(data: &ReportData, format: ReportFormat) -> Result<String, ReportError> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => Ok(generate_json_report(data)?),
        ReportFormat::Csv => generate_csv_report(data),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    // Header
    report.push_str(HEAVY_RULE);
    report.push_str("                          SITEGRAPH CRAWL REPORT\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    report.push_str(&format!("Session ID:   {}\n", data.crawl.session_id));
    report.push_str(&format!("Base URL:     {}\n", data.crawl.base_url));
    report.push_str(&format!(
        "Crawl Date:   {}\n",
        data.crawl.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("Duration:     {} seconds\n", data.crawl.duration_seconds));
    report.push_str(&format!(
        "Limits:       depth {}, {} pages\n",
        data.crawl.max_depth, data.crawl.max_pages
    ));
    if data.crawl.budget_exhausted {
        report.push_str("Stopped:      page budget reached\n");
    }
    if let Some(ref error) = data.crawl.fatal_error {
        report.push_str("Error:\n");
        report.push_str(&wrap_text(error, 80, "  "));
    }
    report.push('\n');

    report.push_str(HEAVY_RULE);
    report.push_str("SUMMARY\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    let summary = &data.summary;
    report.push_str(&format!("Links recorded:  {}\n", summary.total_records));
    report.push_str(&format!("Pages visited:   {}\n", summary.visited));
    report.push_str(&format!("Broken links:    {}\n", summary.broken));
    report.push_str(&format!("External links:  {}\n", summary.external));
    report.push_str(&format!("Skipped links:   {}\n", summary.skipped));
    report.push('\n');

    report.push_str("By depth:\n");
    for (depth, count) in &summary.depth_distribution {
        report.push_str(&format!("  [{}] {}\n", depth, count));
    }

    if !summary.dead_ends.is_empty() {
        report.push_str("\nDead ends:\n");
        for key in &summary.dead_ends {
            report.push_str(&format!("  {}\n", key));
        }
    }
    report.push('\n');

    if let Some(ref sitemap) = data.sitemap {
        report.push_str(HEAVY_RULE);
        report.push_str("SITE MAP\n");
        report.push_str(HEAVY_RULE);
        report.push('\n');
        report.push_str(&generate_sitemap_tree(sitemap));
        report.push('\n');
    }

    if !data.records.is_empty() {
        report.push_str(HEAVY_RULE);
        report.push_str("LINKS\n");
        report.push_str(HEAVY_RULE);
        report.push('\n');

        for (idx, record) in data.records.iter().enumerate() {
            report.push_str(&format!(
                "[{}] {}  {}\n",
                idx + 1,
                status_label(record),
                record.canonical_key
            ));
            report.push_str(&format!("    URL:    {}\n", record.absolute_url));
            if let Some(depth) = record.depth {
                report.push_str(&format!("    Depth:  {}\n", depth));
            }
            if let Some(ref source) = record.source_link {
                report.push_str(&format!("    Found:  {}\n", source));
            }
            if !record.anchor_texts.is_empty() {
                report.push_str(&format!("    Text:   {}\n", record.anchor_texts.join(" | ")));
            }
            if let Some(ref message) = record.error_message {
                report.push_str(&wrap_text(message, 80, "    ! "));
            }
        }
        report.push('\n');
    }

    // Footer
    report.push_str(HEAVY_RULE);
    report.push_str("                              End of Report\n");
    report.push_str(HEAVY_RULE);

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Sitegraph",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": Utc::now().to_rfc3339(),
                "format": "json"
            },
            "crawl": data.crawl,
            "summary": data.summary,
            "links": data.records,
            "sitemap": data.sitemap
        }
    });

    serde_json::to_string_pretty(&json_report)
}

/// One CSV row per record; the header comes from the field names.
#[derive(Serialize)]
struct CsvRow<'a> {
    canonical_key: &'a str,
    absolute_url: &'a str,
    depth: Option<usize>,
    status_code: Option<u16>,
    content_type: Option<&'a str>,
    visited: bool,
    external: bool,
    dont_visit: bool,
    frequency: u32,
    source_link: Option<&'a str>,
    anchor_texts: String,
    error_code: Option<&'a str>,
}

impl<'a> From<&'a PageRecord> for CsvRow<'a> {
    fn from(record: &'a PageRecord) -> Self {
        Self {
            canonical_key: &record.canonical_key,
            absolute_url: &record.absolute_url,
            depth: record.depth,
            status_code: record.status_code,
            content_type: record.content_type.as_deref(),
            visited: record.visited,
            external: record.external_link,
            dont_visit: record.dont_visit,
            frequency: record.frequency,
            source_link: record.source_link.as_deref(),
            anchor_texts: record.anchor_texts.join(" | "),
            error_code: record.error_code.as_deref(),
        }
    }
}

pub fn generate_csv_report(data: &ReportData) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(vec![]);

    for record in &data.records {
        writer.serialize(CsvRow::from(record))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::new();
    let summary = &data.summary;

    report.push_str(&format!("# Crawl report: {}\n\n", data.crawl.base_url));
    report.push_str(&format!(
        "_Session `{}`, {}, {} seconds_\n\n",
        data.crawl.session_id,
        data.crawl.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        data.crawl.duration_seconds
    ));

    if let Some(ref error) = data.crawl.fatal_error {
        report.push_str(&format!("> **Error:** {}\n\n", error));
    }

    report.push_str("## Summary\n\n");
    report.push_str("| Metric | Count |\n|---|---|\n");
    report.push_str(&format!("| Links recorded | {} |\n", summary.total_records));
    report.push_str(&format!("| Pages visited | {} |\n", summary.visited));
    report.push_str(&format!("| Broken links | {} |\n", summary.broken));
    report.push_str(&format!("| External links | {} |\n", summary.external));
    report.push_str(&format!("| Skipped links | {} |\n", summary.skipped));
    for (depth, count) in &summary.depth_distribution {
        report.push_str(&format!("| Depth {} | {} |\n", depth, count));
    }
    if data.crawl.budget_exhausted {
        report.push_str("\nThe crawl stopped at the page budget.\n");
    }
    report.push('\n');

    if let Some(ref sitemap) = data.sitemap {
        report.push_str("## Site map\n\n```\n");
        report.push_str(&generate_sitemap_tree(sitemap));
        report.push_str("```\n\n");
    }

    report.push_str("## Links\n\n");
    report.push_str("| Status | Key | Depth | Text |\n|---|---|---|---|\n");
    for record in &data.records {
        report.push_str(&format!(
            "| {} | `{}` | {} | {} |\n",
            status_label(record),
            record.canonical_key,
            record.depth.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            record.anchor_texts.join(", ").replace('|', "\\|")
        ));
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn status_label(record: &PageRecord) -> String {
    if record.dont_visit {
        return "SKIP".to_string();
    }
    match record.status_code {
        Some(status) => status.to_string(),
        None => "---".to_string(),
    }
}

fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 > width - indent.len() && !current_line.is_empty() {
            result.push_str(indent);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push_str(indent);
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}

fn generate_sitemap_tree(root: &SitemapNode) -> String {
    let mut result = format!("{}  {}\n", root.node.url, status_indicator(root));
    push_tree_children(&mut result, &root.children, "");
    result
}

fn push_tree_children(out: &mut String, children: &[SitemapNode], prefix: &str) {
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let branch = if is_last { "└── " } else { "├── " };

        out.push_str(&format!(
            "{}{}{}  {}\n",
            prefix,
            branch,
            child.node.key,
            status_indicator(child)
        ));

        let next_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        push_tree_children(out, &child.children, &next_prefix);
    }
}

fn status_indicator(node: &SitemapNode) -> String {
    match node.node.status_code {
        Some(status @ 200..=299) => format!("[✓ {}]", status),
        Some(status @ 300..=399) => format!("[→ {}]", status),
        Some(status @ 400..=499) => format!("[⚠ {}]", status),
        Some(status @ 500..=599) => format!("[✗ {}]", status),
        Some(status) => format!("[? {}]", status),
        None => "[-]".to_string(),
    }
}
