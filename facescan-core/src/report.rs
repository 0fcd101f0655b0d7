// Final artifact and run summary generation

use crate::scan::ScanSummary;
use chrono::Utc;
use facescan_scanner::Finding;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    total_findings: usize,
    findings: &'a [Finding],
}

/// Render findings in arrival order.
///
/// `Text` is the plain finding lines joined by newlines, with no trailing
/// newline.
pub fn render_findings(
    findings: &[Finding],
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(findings
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("\n")),
        ReportFormat::Json => serde_json::to_string_pretty(&JsonReport {
            generated_at: Utc::now().to_rfc3339(),
            total_findings: findings.len(),
            findings,
        }),
        ReportFormat::Csv => Ok(generate_csv(findings)),
    }
}

fn generate_csv(findings: &[Finding]) -> String {
    let mut csv = String::from("url,status_code,pattern\n");
    for finding in findings {
        csv.push_str(&format!(
            "{},{},{}\n",
            csv_field(&finding.url),
            finding.status_code,
            csv_field(&finding.pattern)
        ));
    }
    csv
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Write the findings file. Returns `Ok(false)` without touching the
/// filesystem when there is nothing to write.
pub fn write_findings(
    path: &Path,
    findings: &[Finding],
    format: ReportFormat,
) -> io::Result<bool> {
    if findings.is_empty() {
        return Ok(false);
    }

    let content = render_findings(findings, format).map_err(io::Error::other)?;
    fs::write(path, content)?;
    debug!("Wrote {} findings to {}", findings.len(), path.display());
    Ok(true)
}

/// Human-readable end-of-run summary, findings grouped by host.
pub fn generate_scan_summary(summary: &ScanSummary) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Total hosts processed: {}\n", summary.hosts_processed));
    report.push_str(&format!("  Probe URLs requested: {}\n", summary.probes_claimed));
    report.push_str(&format!("  Total findings: {}\n", summary.findings.len()));

    if summary.findings.is_empty() {
        return report;
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    let mut by_host: BTreeMap<String, Vec<&Finding>> = BTreeMap::new();
    for finding in &summary.findings {
        let host = Url::parse(&finding.url)
            .ok()
            .and_then(|u| {
                u.host_str().map(|h| match u.port() {
                    Some(port) => format!("{}:{}", h, port),
                    None => h.to_string(),
                })
            })
            .unwrap_or_else(|| finding.url.clone());
        by_host.entry(host).or_default().push(finding);
    }

    for (host, host_findings) in by_host.iter() {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} findings\n\n", host_findings.len()));
        for finding in host_findings {
            report.push_str(&format!("  {}\n", finding));
        }
        report.push('\n');
    }

    report
}
