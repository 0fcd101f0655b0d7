use facescan_scanner::{
    FetcherConfig, Finding, FindingCallback, Host, ProgressCallback, ScanError, Scanner,
    SignatureSet,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 20;

/// Options for configuring a scan
pub struct ScanOptions {
    pub hosts: Vec<Host>,
    pub workers: usize,
    pub signatures: SignatureSet,
    pub fetcher: FetcherConfig,
    pub show_progress_bars: bool,
}

impl ScanOptions {
    pub fn new(hosts: Vec<Host>) -> Self {
        Self {
            hosts,
            workers: DEFAULT_WORKERS,
            signatures: SignatureSet::default(),
            fetcher: FetcherConfig::default(),
            show_progress_bars: false,
        }
    }
}

/// Outcome of a completed scan
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub hosts_processed: usize,
    pub probes_claimed: usize,
    pub findings: Vec<Finding>,
}

/// Callback for reporting scan progress messages
pub type ScanProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Normalize raw host lines, dropping blanks
pub fn normalize_hosts<I, S>(lines: I) -> Vec<Host>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| Host::parse(line.as_ref()))
        .collect()
}

/// Execute a scan with the given options.
///
/// `finding_callback` is the live echo: it runs once per finding as the
/// collector receives it. Configuration problems are returned before any
/// request is made.
pub async fn execute_scan(
    options: ScanOptions,
    progress_callback: Option<ScanProgressCallback>,
    finding_callback: Option<FindingCallback>,
) -> Result<ScanSummary, ScanError> {
    let ScanOptions {
        hosts,
        workers,
        signatures,
        fetcher,
        show_progress_bars,
    } = options;

    let total_hosts = hosts.len();
    let mut scanner = Scanner::new(&signatures, &fetcher, workers)?;

    if let Some(ref callback) = progress_callback {
        callback(format!(
            "Scanning {} host(s), {} probe URLs each, with {} workers",
            total_hosts,
            scanner.probes_per_host(),
            workers
        ));
    }

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting scan...");
        Some(Arc::new(pb))
    } else {
        None
    };

    if let Some(ref pb) = progress_bar {
        let started = Arc::new(AtomicUsize::new(0));
        let pb_clone = pb.clone();
        let internal_progress: ProgressCallback = Arc::new(move |_worker_id: usize, host: &Host| {
            let count = started.fetch_add(1, Ordering::Relaxed) + 1;
            pb_clone.set_message(format!("Scanning {}/{}: {}", count, total_hosts, host));
        });
        scanner = scanner.with_progress_callback(internal_progress);
    }

    if let Some(callback) = finding_callback {
        // Keep live output from tearing through the spinner line.
        let pb_clone = progress_bar.clone();
        let echo: FindingCallback = Arc::new(move |finding: &Finding| match pb_clone {
            Some(ref pb) => pb.suspend(|| callback(finding)),
            None => callback(finding),
        });
        scanner = scanner.with_finding_callback(echo);
    }

    let findings = scanner.scan(hosts).await;

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    let findings = findings?;
    Ok(ScanSummary {
        hosts_processed: scanner.get_hosts_processed(),
        probes_claimed: scanner.get_claimed_count(),
        findings,
    })
}
