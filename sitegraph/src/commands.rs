use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitegraph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitegraph")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Breadth-first crawl of a site, recording every link found and the status \
                of every page fetched.",
                )
                .arg(
                    arg!(<DOMAIN>)
                        .help("Base URL to crawl (http:// is assumed when no scheme is given), or a path with --local"),
                )
                .arg(
                    arg!(-d --"max-depth" <DEPTH>)
                        .required(false)
                        .help("Number of link levels to traverse, the base page being level 0")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(-p --"max-pages" <PAGES>)
                        .required(false)
                        .help("Stop after this many pages have been visited")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(-w --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("Maximum number of fetches in flight at once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"retries" <COUNT>)
                        .required(false)
                        .help("Retries for timeouts and connection failures")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("0"),
                )
                .arg(
                    arg!(--"local")
                        .required(false)
                        .help("Crawl HTML files on disk instead of a web server")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"hide-skipped")
                        .required(false)
                        .help("Leave links that were not followed (mailto:, javascript:, ...) out of the report")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown", "md"]),
                )
                .arg(
                    arg!(--"include-sitemap")
                        .required(false)
                        .help("Include a sitemap tree in the report")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-v --"verbose")
                        .required(false)
                        .help("Log every fetch and scheduling decision")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
