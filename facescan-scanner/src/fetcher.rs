use crate::error::Result;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::debug;

const ACCEPTED_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml", "application/xml"];

/// HTTP client settings shared by every worker.
///
/// `accept_invalid_certs` defaults to `true`: fingerprinting arbitrary hosts
/// means talking to self-signed and misconfigured TLS endpoints. With it
/// enabled the scanner cannot tell a genuine server from an interception
/// proxy, so never reuse this client for anything that sends credentials.
///
/// `max_redirects` bounds the whole redirect chain including the first
/// request: with 5, four redirects are followed and the fifth fails.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub accept_invalid_certs: bool,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_redirects: 5,
            accept_invalid_certs: true,
            pool_max_idle_per_host: 100,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: format!("facescan/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A response that passed validation, with its body fully read.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status_code: u16,
    pub body: Vec<u8>,
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .redirect(redirect_policy(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }

    /// Issue one GET for `url`.
    ///
    /// Transport errors, rejected responses and body read failures all come
    /// back as `None`; the reason is only traced. Dropping the response on
    /// the early returns hands the connection back to the pool.
    pub async fn fetch(&self, url: &str) -> Option<FetchedPage> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Skipping {}: request failed: {}", url, e);
                return None;
            }
        };

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        if !is_valid_response(status_code, content_type) {
            debug!(
                "Skipping {}: status {} content-type {:?}",
                url, status_code, content_type
            );
            return None;
        }

        match response.bytes().await {
            Ok(body) => Some(FetchedPage {
                status_code,
                body: body.to_vec(),
            }),
            Err(e) => {
                debug!("Skipping {}: body read failed: {}", url, e);
                None
            }
        }
    }
}

fn redirect_policy(max_redirects: usize) -> Policy {
    Policy::custom(move |attempt| {
        // `previous` already holds the original request URL.
        if attempt.previous().len() >= max_redirects {
            attempt.error(format!("stopped after {} redirects", max_redirects))
        } else {
            attempt.follow()
        }
    })
}

/// 200 and the whole 3xx class are inspected; every other status,
/// including the rest of 2xx, is dropped.
pub fn is_usable_status(status_code: u16) -> bool {
    if status_code == 404 {
        return false;
    }
    status_code == 200 || (300..=399).contains(&status_code)
}

pub fn is_usable_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let content_type = content_type.to_lowercase();
    ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| content_type.contains(accepted))
}

pub fn is_valid_response(status_code: u16, content_type: Option<&str>) -> bool {
    is_usable_status(status_code) && is_usable_content_type(content_type)
}
