//! Environment health check.
//!
//! Checks that the proxy and the backend are listening and that the proxy
//! answers its health endpoints. Every check runs; failures are collected
//! rather than stopping at the first one.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use tokio::net::TcpStream;
use url::Url;

use super::CliError;
use crate::output;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(800);
const HTTP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub level: Level,
    pub message: String,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            Level::Pass => "PASS",
            Level::Warn => "WARN",
            Level::Fail => "FAIL",
        };
        write!(f, "{tag}  {}", self.message)
    }
}

#[derive(Debug, Default)]
pub struct Report {
    checks: Vec<Check>,
}

impl Report {
    fn push(&mut self, level: Level, message: impl Into<String>) {
        self.checks.push(Check {
            level,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.checks.iter().filter(|c| c.level == Level::Fail).count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(f, "{check}")?;
        }
        Ok(())
    }
}

/// Whether something accepts TCP connections at `addr` within the timeout.
pub async fn port_open(addr: &str) -> bool {
    matches!(
        tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

/// `host:port` of an http(s) URL, using the scheme's default port.
fn socket_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}

async fn get_status(http: &reqwest::Client, url: &str) -> Result<(u16, String), reqwest::Error> {
    let response = http.get(url).timeout(HTTP_TIMEOUT).send().await?;
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Ok((status, body))
}

/// Run every check and collect the results.
pub async fn check(api_url: &str, upstream_addr: &str, token_file: &Path) -> Report {
    let mut report = Report::default();

    let api = match Url::parse(api_url) {
        Ok(url) => Some(url),
        Err(e) => {
            report.push(Level::Fail, format!("api url {api_url} is invalid: {e}"));
            None
        }
    };

    let mut proxy_up = false;
    if let Some(addr) = api.as_ref().and_then(socket_of) {
        proxy_up = port_open(&addr).await;
        if proxy_up {
            report.push(Level::Pass, format!("proxy: {addr} is listening"));
        } else {
            report.push(
                Level::Fail,
                format!("proxy: {addr} not listening (start vocalocart-proxy)"),
            );
        }
    }

    if port_open(upstream_addr).await {
        report.push(Level::Pass, format!("backend: {upstream_addr} is listening"));
    } else {
        report.push(
            Level::Warn,
            format!("backend: {upstream_addr} not listening (start the backend or set VOCALOCART_UPSTREAM_ADDR)"),
        );
    }

    if let (true, Some(api)) = (proxy_up, api.as_ref()) {
        let http = reqwest::Client::new();
        let base = api.as_str().trim_end_matches('/');

        match get_status(&http, &format!("{base}/health")).await {
            Ok((200, body)) if body.trim() == "ok" => {
                report.push(Level::Pass, "proxy: /health answered ok");
            }
            Ok((status, _)) => report.push(Level::Fail, format!("proxy: /health answered {status}")),
            Err(e) => report.push(Level::Fail, format!("proxy: /health failed: {e}")),
        }

        match get_status(&http, &format!("{base}/health/ready")).await {
            Ok((200, _)) => report.push(Level::Pass, "proxy: backend reachable through proxy"),
            Ok((status, _)) => report.push(
                Level::Warn,
                format!("proxy: /health/ready answered {status} (backend unreachable from proxy)"),
            ),
            Err(e) => report.push(Level::Warn, format!("proxy: /health/ready failed: {e}")),
        }
    }

    if token_file.exists() {
        report.push(
            Level::Pass,
            format!("session: token file {} present", token_file.display()),
        );
    } else {
        report.push(Level::Warn, "session: not logged in");
    }

    report
}

/// `vc-cli health`
///
/// # Errors
///
/// Returns [`CliError::HealthCheckFailed`] if any check failed.
pub async fn run(api_url: &str, upstream_addr: &str, token_file: &Path) -> Result<(), CliError> {
    let report = check(api_url, upstream_addr, token_file).await;
    output::emit(&format!("VocaloCart health check\n{report}"));
    match report.failures() {
        0 => Ok(()),
        n => Err(CliError::HealthCheckFailed(n)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_port_open() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        assert!(port_open(&addr).await);

        drop(listener);
        assert!(!port_open(&addr).await);
    }

    #[test]
    fn test_socket_of_uses_default_ports() {
        let url = Url::parse("http://shop.example.com").unwrap();
        assert_eq!(socket_of(&url).unwrap(), "shop.example.com:80");
        let url = Url::parse("http://127.0.0.1:5000/").unwrap();
        assert_eq!(socket_of(&url).unwrap(), "127.0.0.1:5000");
    }

    #[tokio::test]
    async fn test_check_runs_every_step() {
        let report = check("http://127.0.0.1:9", "127.0.0.1:9", &missing_token_file()).await;
        // proxy down (fail), backend down (warn), no token (warn)
        assert_eq!(report.checks().len(), 3);
        assert_eq!(report.failures(), 1);
        assert_eq!(report.checks()[1].level, Level::Warn);
        assert!(report.to_string().starts_with("FAIL  proxy:"));
    }

    #[tokio::test]
    async fn test_invalid_api_url_is_reported() {
        let report = check("::nope::", "127.0.0.1:9", &missing_token_file()).await;
        assert_eq!(report.failures(), 1);
        assert!(report.checks()[0].message.contains("invalid"));
    }

    fn missing_token_file() -> std::path::PathBuf {
        std::env::temp_dir().join("vocalocart-health-test-no-such-token")
    }
}
