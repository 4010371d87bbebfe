use clap::{arg, command};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/linkmesh/config.toml";

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkmesh")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkmesh")
        .about("Find internal linking opportunities from crawl and search performance exports")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes the default analysis configuration to your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the configuration file")
                        .default_value(DEFAULT_CONFIG_PATH),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Overwrite an existing configuration file without asking")
                        .required(false),
                ),
        )
        .subcommand(
            command!("check-config")
                .about("Validates a configuration file and prints the effective values")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Configuration file to check")
                        .default_value(DEFAULT_CONFIG_PATH),
                ),
        )
        .subcommand(
            command!("analyze")
                .about(
                    "Ranks the pages that most need internal links and suggests the best \
                source pages to link from",
                )
                .arg(
                    arg!(-c --"crawl" <CSV>)
                        .required(true)
                        .help("Crawl export (Address, Status Code, Indexability, Link Score, ...)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-p --"performance" <CSV>)
                        .required(false)
                        .help(
                            "Search performance export (Page, Clicks, Impressions, CTR, Position)",
                        )
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-l --"links" <CSV>)
                        .required(false)
                        .help("Internal link export (Source, Destination, Anchor)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"config" <TOML>)
                        .required(false)
                        .help(
                            "Analysis configuration \
                            (default: ~/.config/linkmesh/config.toml when present)",
                        ),
                )
                .arg(
                    arg!(-n --"top-n" <N>)
                        .required(false)
                        .help("Number of priority pages to find sources for")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-k --"top-k" <K>)
                        .required(false)
                        .help("Maximum suggested sources per priority page")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-s --"min-similarity" <SCORE>)
                        .required(false)
                        .help("Minimum URL similarity for a source page, between 0 and 1")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown", "md"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"export-dir" <DIR>)
                        .required(false)
                        .help("Also write the priority, opportunity and similarity tables as CSV")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"min-impressions" <X>)
                        .required(false)
                        .help("Only list priority pages with at least this many impressions")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"max-position" <P>)
                        .required(false)
                        .help("Only list priority pages ranking at this position or better")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"potential-only")
                        .required(false)
                        .help("Only list priority pages flagged with traffic potential")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"min-source-link-score" <L>)
                        .required(false)
                        .help("Only list opportunities whose source has at least this link score")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"include-similarity")
                        .required(false)
                        .help("Include every similar page pair in the JSON report")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
