use crate::commands::DEFAULT_CONFIG_PATH;
use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use linkmesh_core::report::{export_csv_tables, gather_report_data, render_report, save_report};
use linkmesh_core::{
    Analysis, AnalysisConfig, AnalysisOptions, AnalysisProgressCallback, OpportunityFilter,
    PriorityFilter, ReportFormat, ReportOptions, run_analysis,
};
use linkmesh_loader::{ExportLoader, LoadSummary};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber; `RUST_LOG` overrides the default level
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Status output goes to stderr so stdout carries only the report
pub fn print_banner() {
    eprintln!(
        "{} {}",
        "linkmesh".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    eprintln!("{}", "internal linking opportunities".bright_black());
    eprintln!();
}

/// Expand `~` and environment variables in a user supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

// Configuration helpers

/// Command line values layered over the configuration file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub top_n: Option<usize>,
    pub top_k: Option<usize>,
    pub min_similarity: Option<f64>,
}

impl ConfigOverrides {
    /// Apply the overrides and validate the result again
    pub fn apply(&self, mut config: AnalysisConfig) -> linkmesh_core::Result<AnalysisConfig> {
        if let Some(top_n) = self.top_n {
            config.top_n_pages_to_boost = top_n;
        }
        if let Some(top_k) = self.top_k {
            config.top_k_suggestions_per_page = top_k;
        }
        if let Some(min_similarity) = self.min_similarity {
            config.min_similarity_threshold = min_similarity;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Load the configuration to analyze with
///
/// An explicit path must exist. Without one, the default location is used
/// when present, otherwise the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Invalid configuration {}", path.display())),
        None => {
            let default_path = expand_path(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                debug!("Using configuration {}", default_path.display());
                AnalysisConfig::load(&default_path)
                    .with_context(|| format!("Invalid configuration {}", default_path.display()))
            } else {
                debug!("No configuration file found, using defaults");
                Ok(AnalysisConfig::default())
            }
        }
    }
}

/// Write the default configuration, creating parent directories
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = AnalysisConfig::default()
        .to_toml_string()
        .context("Failed to serialize the default configuration")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  LINKMESH INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let raw_path = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let force = args.get_flag("force");
    let config_path = expand_path(raw_path);

    println!(
        "{} Target: {}",
        "→".blue(),
        config_path.display().to_string().bright_white()
    );
    println!();

    if config_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("Configuration file already exists:");
        println!(
            "  {} {}",
            "•".yellow(),
            config_path.display().to_string().bright_white()
        );
        println!();

        let response = print_prompt("Do you want to overwrite it? [y/N]:")?;
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
        println!("{} Proceeding with overwrite", "→".yellow().bold());
        println!();
    }

    write_default_config(&config_path)?;

    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Configuration: {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );
    println!();
    Ok(())
}

pub fn handle_check_config(args: &ArgMatches) -> Result<()> {
    let raw_path = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let config_path = expand_path(raw_path);

    let config = AnalysisConfig::load(&config_path)
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;

    println!(
        "{} Configuration valid: {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );
    println!();
    print!("{}", config.to_toml_string()?);
    Ok(())
}

// Analyze

/// Everything the analyze command was asked to do
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub crawl: PathBuf,
    pub performance: Option<PathBuf>,
    pub links: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub report: ReportOptions,
}

impl AnalyzeArgs {
    pub fn new(crawl: impl Into<PathBuf>) -> Self {
        Self {
            crawl: crawl.into(),
            performance: None,
            links: None,
            config: None,
            overrides: ConfigOverrides::default(),
            format: ReportFormat::Text,
            output: None,
            export_dir: None,
            report: ReportOptions::default(),
        }
    }

    pub fn from_matches(args: &ArgMatches) -> Result<Self> {
        let crawl = args
            .get_one::<PathBuf>("crawl")
            .cloned()
            .ok_or_else(|| anyhow!("--crawl is required"))?;
        let format_name = args
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text");
        let format = ReportFormat::from_str(format_name)
            .ok_or_else(|| anyhow!("Unknown report format '{}'", format_name))?;

        Ok(Self {
            crawl,
            performance: args.get_one::<PathBuf>("performance").cloned(),
            links: args.get_one::<PathBuf>("links").cloned(),
            config: args.get_one::<String>("config").map(|p| expand_path(p)),
            overrides: ConfigOverrides {
                top_n: args.get_one::<usize>("top-n").copied(),
                top_k: args.get_one::<usize>("top-k").copied(),
                min_similarity: args.get_one::<f64>("min-similarity").copied(),
            },
            format,
            output: args.get_one::<PathBuf>("output").cloned(),
            export_dir: args.get_one::<PathBuf>("export-dir").cloned(),
            report: ReportOptions {
                priority_filter: PriorityFilter {
                    min_impressions: args.get_one::<f64>("min-impressions").copied(),
                    max_position: args.get_one::<f64>("max-position").copied(),
                    potential_only: args.get_flag("potential-only"),
                },
                opportunity_filter: OpportunityFilter {
                    min_similarity: None,
                    min_source_link_score: args.get_one::<f64>("min-source-link-score").copied(),
                },
                include_similarity: args.get_flag("include-similarity"),
            },
        })
    }
}

/// What an analyze run produced
#[derive(Debug)]
pub struct AnalyzeOutcome {
    pub analysis: Analysis,
    pub summary: LoadSummary,
    pub report: String,
    pub exported: Vec<PathBuf>,
}

/// Load the exports, run the analysis and render the report
///
/// Progress messages from loading and from every pipeline stage go to
/// `progress` when given.
pub fn run_analyze(
    args: &AnalyzeArgs,
    progress: Option<AnalysisProgressCallback>,
) -> Result<AnalyzeOutcome> {
    let config = load_config(args.config.as_deref())?;
    let config = args
        .overrides
        .apply(config)
        .context("Invalid command line override")?;
    debug!(?config, "Effective configuration");

    let mut loader = ExportLoader::new();
    if let Some(path) = &args.performance {
        loader = loader.with_performance(path);
    }
    if let Some(path) = &args.links {
        loader = loader.with_links(path);
    }
    if let Some(callback) = &progress {
        loader = loader.with_progress_callback(callback.clone());
    }

    let loaded = loader.load(&args.crawl).context("Failed to load exports")?;
    let summary = loaded.summary.clone();

    let options = AnalysisOptions {
        cancel: None,
        progress,
    };
    let analysis = run_analysis(loaded.into_input(), &config, &options).context("Analysis failed")?;

    let data = gather_report_data(&analysis, &args.report, Utc::now());
    let report = render_report(&data, args.format).context("Failed to render report")?;

    let exported = match &args.export_dir {
        Some(dir) => export_csv_tables(&analysis, &args.report, dir)
            .with_context(|| format!("Failed to export tables to {}", dir.display()))?,
        None => Vec::new(),
    };

    Ok(AnalyzeOutcome {
        analysis,
        summary,
        report,
        exported,
    })
}

pub fn handle_analyze(args: &ArgMatches, quiet: bool) -> Result<()> {
    let analyze_args = AnalyzeArgs::from_matches(args)?;

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let spinner_clone = spinner.clone();
    let progress: AnalysisProgressCallback = Arc::new(move |msg: String| {
        spinner_clone.set_message(msg);
    });

    let outcome = run_analyze(&analyze_args, Some(progress));
    spinner.finish_and_clear();
    let outcome = outcome?;

    if !quiet {
        print_load_summary(&outcome.summary);
        print_run_summary(&outcome.analysis);
    }

    match &analyze_args.output {
        Some(path) => {
            save_report(&outcome.report, path)
                .with_context(|| format!("Failed to save report to {}", path.display()))?;
            eprintln!(
                "{} Report saved to: {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", outcome.report),
    }

    for path in &outcome.exported {
        eprintln!(
            "{} Exported: {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
    }

    Ok(())
}

fn print_load_summary(summary: &LoadSummary) {
    eprintln!(
        "{} Loaded {} crawl row(s)",
        "✓".green().bold(),
        summary.crawl_rows.to_string().cyan()
    );
    if summary.rejected_rows > 0 {
        eprintln!(
            "  {} {} row(s) rejected for an unreadable status code",
            "⚠".yellow(),
            summary.rejected_rows
        );
    }
    for column in &summary.defaulted_columns {
        eprintln!("  {} missing column '{}', using the default", "⚠".yellow(), column);
    }
    if summary.performance_rows > 0 {
        eprintln!(
            "{} Matched {} of {} performance row(s)",
            "✓".green().bold(),
            summary.matched_performance.to_string().cyan(),
            summary.performance_rows
        );
    }
    if let Some(links) = summary.link_rows {
        eprintln!("{} Loaded {} internal link(s)", "✓".green().bold(), links.to_string().cyan());
    }
}

fn print_run_summary(analysis: &Analysis) {
    let diagnostics = &analysis.diagnostics;
    if !diagnostics.skipped_pages.is_empty() {
        eprintln!(
            "  {} {} malformed page(s) skipped",
            "⚠".yellow(),
            diagnostics.skipped_pages.len()
        );
    }
    if let Some(reason) = &diagnostics.similarity_empty {
        eprintln!("  {} {}", "ℹ".blue(), reason);
    }
    eprintln!(
        "{} {} priority page(s), {} opportunity(ies)",
        "✓".green().bold(),
        analysis.priority_target_count.to_string().cyan(),
        analysis.opportunities.len().to_string().cyan()
    );
    eprintln!();
}
