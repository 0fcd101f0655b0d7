use crate::error::{Result, ScanError};
use crate::fetcher::{Fetcher, FetcherConfig};
use crate::matcher::SignatureMatcher;
use crate::registry::DedupRegistry;
use crate::result::Finding;
use crate::signatures::SignatureSet;
use crate::target::{Host, TargetExpander};
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

/// Called with `(worker_id, host)` when a worker picks up a host.
pub type ProgressCallback = Arc<dyn Fn(usize, &Host) + Send + Sync>;

/// Called by the collector for every finding, in arrival order.
pub type FindingCallback = Arc<dyn Fn(&Finding) + Send + Sync>;

type JobQueue = Arc<Mutex<mpsc::Receiver<Host>>>;

/// State shared by all workers. Only the registry and the counter are
/// written concurrently, both internally synchronized.
struct ScanContext {
    fetcher: Fetcher,
    matcher: SignatureMatcher,
    expander: TargetExpander,
    registry: DedupRegistry,
    hosts_processed: AtomicUsize,
}

impl ScanContext {
    /// Probe every URL of `host`. Returns `false` once the results channel
    /// has been closed underneath the worker.
    async fn probe_host(&self, host: &Host, results: &mpsc::Sender<Finding>) -> bool {
        for url in self.expander.expand(host) {
            if !self.registry.claim(&url) {
                debug!("Already claimed {}", url);
                continue;
            }

            let Some(page) = self.fetcher.fetch(&url).await else {
                continue;
            };

            if let Some(pattern) = self.matcher.find_match(&page.body) {
                let finding = Finding::new(url, page.status_code, pattern.source().to_string());
                if results.send(finding).await.is_err() {
                    return false;
                }
            }
        }
        true
    }
}

pub struct Scanner {
    context: Arc<ScanContext>,
    workers: usize,
    progress_callback: Option<ProgressCallback>,
    finding_callback: Option<FindingCallback>,
}

impl Scanner {
    /// Compile the signature set and build the shared HTTP client. Fails
    /// before any worker exists if the configuration is unusable.
    pub fn new(
        signatures: &SignatureSet,
        fetcher_config: &FetcherConfig,
        workers: usize,
    ) -> Result<Self> {
        if workers == 0 {
            return Err(ScanError::InvalidConfig(
                "worker count must be a positive integer".to_string(),
            ));
        }
        signatures.validate()?;

        let context = ScanContext {
            fetcher: Fetcher::new(fetcher_config)?,
            matcher: SignatureMatcher::new(&signatures.patterns)?,
            expander: TargetExpander::new(signatures.ports.clone(), signatures.paths.clone())?,
            registry: DedupRegistry::new(),
            hosts_processed: AtomicUsize::new(0),
        };

        Ok(Self {
            context: Arc::new(context),
            workers,
            progress_callback: None,
            finding_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_finding_callback(mut self, callback: FindingCallback) -> Self {
        self.finding_callback = Some(callback);
        self
    }

    /// Run the whole host list through the worker pool and return the
    /// findings in the order the collector received them.
    ///
    /// Shutdown order: the producer closes the job queue after the last
    /// host, every worker is joined, only then does the results channel
    /// close (its last sender lives in a worker), and finally the collector
    /// is joined.
    pub async fn scan(&self, hosts: Vec<Host>) -> Result<Vec<Finding>> {
        info!(
            "Starting scan of {} hosts with {} workers ({} probes per host)",
            hosts.len(),
            self.workers,
            self.context.expander.probes_per_host()
        );

        let (job_tx, job_rx) = mpsc::channel::<Host>(self.workers);
        let job_rx: JobQueue = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<Finding>(self.workers);

        let producer = tokio::spawn(async move {
            for host in hosts {
                if job_tx.send(host).await.is_err() {
                    break;
                }
            }
        });

        let finding_callback = self.finding_callback.clone();
        let collector = tokio::spawn(async move {
            let mut findings = Vec::new();
            while let Some(finding) = result_rx.recv().await {
                info!("Found {}", finding);
                if let Some(ref callback) = finding_callback {
                    callback(&finding);
                }
                findings.push(finding);
            }
            findings
        });

        let mut worker_handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let context = self.context.clone();
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let progress_callback = self.progress_callback.clone();
            worker_handles.push(tokio::spawn(run_worker(
                worker_id,
                context,
                jobs,
                results,
                progress_callback,
            )));
        }
        drop(result_tx);
        drop(job_rx);

        for outcome in join_all(worker_handles).await {
            outcome?;
        }
        producer.await?;

        let findings = collector.await?;
        info!(
            "Scan complete. {} hosts, {} probe URLs claimed, {} findings",
            self.get_hosts_processed(),
            self.get_claimed_count(),
            findings.len()
        );
        Ok(findings)
    }

    pub fn get_claimed_count(&self) -> usize {
        self.context.registry.len()
    }

    pub fn get_hosts_processed(&self) -> usize {
        self.context.hosts_processed.load(Ordering::Relaxed)
    }

    pub fn probes_per_host(&self) -> usize {
        self.context.expander.probes_per_host()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

async fn run_worker(
    worker_id: usize,
    context: Arc<ScanContext>,
    jobs: JobQueue,
    results: mpsc::Sender<Finding>,
    progress_callback: Option<ProgressCallback>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        let next = jobs.lock().await.recv().await;
        let Some(host) = next else {
            break;
        };

        if let Some(ref callback) = progress_callback {
            callback(worker_id, &host);
        }

        let results_open = context.probe_host(&host, &results).await;
        context.hosts_processed.fetch_add(1, Ordering::Relaxed);
        if !results_open {
            break;
        }
    }

    debug!("Worker {} finished", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn signature_set(patterns: &[&str], paths: &[&str], ports: &[&str]) -> SignatureSet {
        SignatureSet {
            patterns: owned(patterns),
            paths: owned(paths),
            ports: owned(ports),
        }
    }

    fn html(status: u16, body: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_raw(body, "text/html")
    }

    fn host(raw: &str) -> Host {
        Host::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_single_match_end_to_end() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.seam"))
            .respond_with(html(200, "<html><head>RichFaces skin</head></html>"))
            .mount(&mock_server)
            .await;

        let scanner = Scanner::new(
            &signature_set(&["RichFaces"], &["/index.seam"], &[""]),
            &FetcherConfig::default(),
            4,
        )
        .unwrap();

        let findings = scanner.scan(vec![host(&mock_server.uri())]).await.unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].url, format!("{}/index.seam", mock_server.uri()));
        assert_eq!(findings[0].status_code, 200);
        assert_eq!(findings[0].pattern, "RichFaces");
        assert_eq!(scanner.get_hosts_processed(), 1);
    }

    #[tokio::test]
    async fn test_no_signature_yields_no_findings() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.seam"))
            .respond_with(html(200, "<html><body>Spring Boot</body></html>"))
            .mount(&mock_server)
            .await;

        let scanner = Scanner::new(
            &signature_set(&["RichFaces"], &["/index.seam"], &[""]),
            &FetcherConfig::default(),
            2,
        )
        .unwrap();

        let findings = scanner.scan(vec![host(&mock_server.uri())]).await.unwrap();
        assert!(findings.is_empty());

        // The page itself is usable: a signature it does contain is found.
        let control = Scanner::new(
            &signature_set(&["Spring Boot"], &["/index.seam"], &[""]),
            &FetcherConfig::default(),
            2,
        )
        .unwrap();
        let findings = control.scan(vec![host(&mock_server.uri())]).await.unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_hosts_fetch_each_url_once() {
        let mock_server = MockServer::start().await;
        for page_path in ["/", "/login.seam", "/home.jsf"] {
            Mock::given(method("GET"))
                .and(path(page_path))
                .respond_with(html(200, "javax.faces.ViewState"))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let scanner = Scanner::new(
            &signature_set(&[r"javax\.faces"], &["/", "/login.seam", "/home.jsf"], &[""]),
            &FetcherConfig::default(),
            8,
        )
        .unwrap();

        let hosts = (0..6).map(|_| host(&mock_server.uri())).collect();
        let findings = scanner.scan(hosts).await.unwrap();

        assert_eq!(findings.len(), 3);
        assert_eq!(scanner.get_claimed_count(), 3);
        assert_eq!(scanner.get_hosts_processed(), 6);
        // MockServer verifies the `.expect(1)` counts on drop.
    }

    #[tokio::test]
    async fn test_rejected_responses_are_not_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.seam"))
            .respond_with(html(404, "RichFaces"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/index.jsf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{\"RichFaces\": true}", "application/json"),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/index.faces"))
            .respond_with(html(500, "RichFaces stack trace"))
            .mount(&mock_server)
            .await;
        // Same signature on an acceptable response, so only the status and
        // content-type rules can explain the other three being dropped.
        Mock::given(method("GET"))
            .and(path("/index.xhtml"))
            .respond_with(html(200, "RichFaces"))
            .mount(&mock_server)
            .await;

        let scanner = Scanner::new(
            &signature_set(
                &["RichFaces"],
                &["/index.seam", "/index.jsf", "/index.faces", "/index.xhtml"],
                &[""],
            ),
            &FetcherConfig::default(),
            3,
        )
        .unwrap();

        let findings = scanner.scan(vec![host(&mock_server.uri())]).await.unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].url, format!("{}/index.xhtml", mock_server.uri()));
        assert_eq!(scanner.get_claimed_count(), 4);
    }

    #[tokio::test]
    async fn test_redirect_class_page_is_inspected() {
        let mock_server = MockServer::start().await;
        // No Location header, so the 302 itself is the final response.
        Mock::given(method("GET"))
            .and(path("/login.seam"))
            .respond_with(html(302, "<script src=\"/a4j/org.ajax4jsf.javascript.AjaxScript\">"))
            .mount(&mock_server)
            .await;

        let scanner = Scanner::new(
            &signature_set(&[r"org\.ajax4jsf"], &["/login.seam"], &[""]),
            &FetcherConfig::default(),
            1,
        )
        .unwrap();

        let findings = scanner.scan(vec![host(&mock_server.uri())]).await.unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].status_code, 302);
        assert_eq!(findings[0].pattern, r"org\.ajax4jsf");
    }

    #[tokio::test]
    async fn test_unreachable_host_does_not_fail_run() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(200, "Seam Application"))
            .mount(&mock_server)
            .await;

        let scanner = Scanner::new(
            &signature_set(&["Seam Application"], &["/"], &[""]),
            &FetcherConfig::default(),
            2,
        )
        .unwrap();

        let hosts = vec![host("127.0.0.1:9"), host(&mock_server.uri())];
        let findings = scanner.scan(hosts).await.unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(scanner.get_hosts_processed(), 2);
    }

    #[tokio::test]
    async fn test_finding_callback_sees_every_finding() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.seam"))
            .respond_with(html(200, "org.ajax4jsf"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b.seam"))
            .respond_with(html(200, "JBSEAM"))
            .mount(&mock_server)
            .await;

        let seen: Arc<StdMutex<Vec<String>>> = Arc::new(StdMutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let scanner = Scanner::new(
            &signature_set(&[r"org\.ajax4jsf", "JBSEAM"], &["/a.seam", "/b.seam"], &[""]),
            &FetcherConfig::default(),
            1,
        )
        .unwrap()
        .with_finding_callback(Arc::new(move |finding: &Finding| {
            seen_clone.lock().unwrap().push(finding.to_string());
        }));

        let findings = scanner.scan(vec![host(&mock_server.uri())]).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let lines: Vec<String> = findings.iter().map(|f| f.to_string()).collect();
        assert_eq!(*seen, lines);
        assert!(seen[0].ends_with(r"[Padrão: org\.ajax4jsf]"));
        assert!(seen[1].ends_with("[Padrão: JBSEAM]"));
    }

    #[tokio::test]
    async fn test_hosts_dispatched_in_input_order() {
        let order: Arc<StdMutex<Vec<String>>> = Arc::new(StdMutex::new(Vec::new()));
        let order_clone = order.clone();

        // Nothing listens on port 9, so each host is a fast skip.
        let scanner = Scanner::new(
            &signature_set(&["RichFaces"], &["/"], &[""]),
            &FetcherConfig::default(),
            1,
        )
        .unwrap()
        .with_progress_callback(Arc::new(move |_worker_id: usize, host: &Host| {
            order_clone.lock().unwrap().push(host.to_string());
        }));

        let hosts = vec![
            host("127.0.0.1:9/first"),
            host("127.0.0.1:9/second"),
            host("127.0.0.1:9/third"),
        ];
        scanner.scan(hosts).await.unwrap();

        assert_eq!(
            *order.lock().unwrap(),
            vec![
                "http://127.0.0.1:9/first",
                "http://127.0.0.1:9/second",
                "http://127.0.0.1:9/third",
            ]
        );
    }

    #[tokio::test]
    async fn test_many_hosts_more_than_workers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html(200, "<link href=\"/seam/resource/style.css\">"))
            .mount(&mock_server)
            .await;

        let scanner = Scanner::new(
            &signature_set(&["seam/resource"], &["/"], &[""]),
            &FetcherConfig::default(),
            3,
        )
        .unwrap();

        // Distinct hosts via distinct path prefixes on the same server.
        let hosts: Vec<Host> = (0..25)
            .map(|i| host(&format!("{}/tenant{}", mock_server.uri(), i)))
            .collect();
        let findings = scanner.scan(hosts).await.unwrap();

        assert_eq!(findings.len(), 25);
        assert_eq!(scanner.get_claimed_count(), 25);
    }

    #[tokio::test]
    async fn test_empty_host_list_completes() {
        let scanner =
            Scanner::new(&SignatureSet::default(), &FetcherConfig::default(), 20).unwrap();

        let findings = scanner.scan(Vec::new()).await.unwrap();

        assert!(findings.is_empty());
        assert_eq!(scanner.get_hosts_processed(), 0);
        assert_eq!(scanner.probes_per_host(), 24 * 6);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = Scanner::new(&SignatureSet::default(), &FetcherConfig::default(), 0);
        assert!(matches!(result, Err(ScanError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_pattern_rejected_before_scan() {
        let result = Scanner::new(
            &signature_set(&["[unterminated"], &["/"], &[""]),
            &FetcherConfig::default(),
            1,
        );
        assert!(matches!(result, Err(ScanError::InvalidPattern { .. })));
    }
}
