use std::error::Error as _;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::ProbeError;

/// User agent sent with every probe.
pub const USER_AGENT: &str = concat!("pollwatch/", env!("CARGO_PKG_VERSION"));

/// Transport used to check whether an endpoint is alive
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Issue a lightweight existence check and return the reported status line
    async fn head(&self, target: &str) -> Result<String, ProbeError>;
}

/// HEAD-request checker
pub struct HttpChecker {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpChecker {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;

        Ok(Self { client, timeout })
    }

    fn classify(&self, error: &reqwest::Error) -> ProbeError {
        if error.is_timeout() {
            ProbeError::Timeout(self.timeout)
        } else {
            ProbeError::Transport(describe(error))
        }
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn head(&self, target: &str) -> Result<String, ProbeError> {
        // Any response counts, error codes are reported as the status
        let response =
            self.client.head(target).send().await.map_err(|e| self.classify(&e))?;

        Ok(status_text(response.status()))
    }
}

/// Render a status code as a status line, e.g. `200 OK`
pub fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Flatten an error and its sources into one line
fn describe(error: &reqwest::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_uses_canonical_reason() {
        assert_eq!(status_text(StatusCode::OK), "200 OK");
        assert_eq!(status_text(StatusCode::SERVICE_UNAVAILABLE), "503 Service Unavailable");
        assert_eq!(status_text(StatusCode::from_u16(599).unwrap()), "599");
    }

    #[tokio::test]
    async fn head_reports_status_line() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("HEAD", "/").with_status(200).create_async().await;

        let checker = HttpChecker::new(Duration::from_secs(5)).unwrap();
        let status = checker.head(&server.url()).await.unwrap();

        assert_eq!(status, "200 OK");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn head_treats_error_codes_as_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("HEAD", "/missing").with_status(404).create_async().await;

        let checker = HttpChecker::new(Duration::from_secs(5)).unwrap();
        let status = checker.head(&format!("{}/missing", server.url())).await.unwrap();

        assert_eq!(status, "404 Not Found");
    }

    #[tokio::test]
    async fn head_sends_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/")
            .match_header("user-agent", USER_AGENT)
            .with_status(204)
            .create_async()
            .await;

        let checker = HttpChecker::new(Duration::from_secs(5)).unwrap();
        assert_eq!(checker.head(&server.url()).await.unwrap(), "204 No Content");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn head_to_closed_port_is_transport_error() {
        let checker = HttpChecker::new(Duration::from_secs(2)).unwrap();
        let err = checker.head("http://127.0.0.1:1/").await.unwrap_err();

        assert!(matches!(err, ProbeError::Transport(_)), "unexpected error: {err:?}");
        assert!(!err.to_string().is_empty());
    }
}
