use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use facescan_core::report::{ReportFormat, generate_scan_summary, write_findings};
use facescan_core::scan::{ScanOptions, ScanProgressCallback, execute_scan};
use facescan_scanner::{FetcherConfig, Finding, FindingCallback, Host, SignatureSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Set up stderr logging. `RUST_LOG` wins over the verbosity flag.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. from tests) is harmless, so the error is dropped.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Expand a leading `~` in a user supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Load and normalize hosts from a newline-delimited file.
///
/// Blank lines are dropped and lines without an `http` scheme get
/// `http://`. An empty list is not an error; only an unreadable file is.
pub fn load_hosts_from_file(path: &Path) -> Result<Vec<Host>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hosts file {}", path.display()))?;

    Ok(content.lines().filter_map(Host::parse).collect())
}

/// Built-in signatures, or the JSON file at `path` when given
pub fn load_signatures(path: Option<&Path>) -> Result<SignatureSet> {
    match path {
        Some(path) => SignatureSet::from_json_file(path)
            .with_context(|| format!("Failed to load signature file {}", path.display())),
        None => Ok(SignatureSet::default()),
    }
}

/// Build the fetcher configuration from `scan` arguments
pub fn fetcher_config_from_args(sub_matches: &ArgMatches) -> FetcherConfig {
    let mut config = FetcherConfig::default();
    if let Some(timeout) = sub_matches.get_one::<u64>("timeout") {
        config.timeout = Duration::from_secs(*timeout);
    }
    if let Some(max_redirects) = sub_matches.get_one::<usize>("max-redirects") {
        config.max_redirects = *max_redirects;
    }
    config.accept_invalid_certs = !sub_matches.get_flag("strict-tls");
    config
}

pub fn workers_from_args(sub_matches: &ArgMatches) -> Result<usize> {
    let workers = *sub_matches.get_one::<usize>("workers").unwrap_or(&20);
    if workers == 0 {
        bail!("Worker count must be a positive integer");
    }
    Ok(workers)
}

fn print_finding(finding: &Finding) {
    println!("{}", finding);
}

pub async fn handle_scan(sub_matches: &ArgMatches, quiet: bool) {
    if let Err(e) = run_scan(sub_matches, quiet).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_scan(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let input = sub_matches
        .get_one::<String>("input")
        .context("--input is required")?;
    let output = sub_matches
        .get_one::<String>("output")
        .map(|p| expand_path(p))
        .unwrap_or_else(|| PathBuf::from("resultados.txt"));
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let signatures_path = sub_matches.get_one::<String>("signatures").map(|p| expand_path(p));

    let workers = workers_from_args(sub_matches)?;
    let hosts = load_hosts_from_file(&expand_path(input))?;
    let signatures = load_signatures(signatures_path.as_deref())?;
    let fetcher = fetcher_config_from_args(sub_matches);

    if hosts.is_empty() {
        warn!("No hosts found in {}", input);
    }

    eprintln!("{} Hosts loaded: {}", "✓".green().bold(), hosts.len());
    eprintln!("{} Patterns loaded: {}", "✓".green().bold(), signatures.patterns.len());
    eprintln!("{} Paths to test: {}", "✓".green().bold(), signatures.paths.len());
    eprintln!("{} Ports to test: {}", "✓".green().bold(), signatures.ports.len());
    if fetcher.accept_invalid_certs && !quiet {
        eprintln!(
            "{} TLS certificate verification is disabled (use --strict-tls to enable)",
            "ℹ".blue()
        );
    }
    eprintln!();

    let options = ScanOptions {
        hosts,
        workers,
        signatures,
        fetcher,
        show_progress_bars: !quiet,
    };

    let progress_callback: Option<ScanProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            eprintln!("{} {}", "→".blue(), msg);
        }))
    };
    let finding_callback: FindingCallback = Arc::new(print_finding);

    let summary = execute_scan(options, progress_callback, Some(finding_callback)).await?;

    // A failed write is reported, the run itself still succeeded.
    match write_findings(&output, &summary.findings, format) {
        Ok(true) => eprintln!(
            "\n{} Results saved to: {}",
            "✓".green().bold(),
            output.display().to_string().bright_white()
        ),
        Ok(false) => {}
        Err(e) => eprintln!(
            "\n{} Failed to save results to {}: {}",
            "✗".red().bold(),
            output.display(),
            e
        ),
    }

    eprintln!();
    eprint!("{}", generate_scan_summary(&summary));
    Ok(())
}

pub fn handle_signatures() {
    match SignatureSet::default().to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
