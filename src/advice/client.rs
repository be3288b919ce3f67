//! Core `AdviceClient` trait and the `HttpAdviceClient` implementation.
//!
//! The advisory backend takes a `{ emotion, transcript }` snapshot as a JSON
//! POST body and answers with either `{ advice }` or `{ error }`.  Any other
//! JSON shape is an empty reply, not a failure.  An `{ error }` body is
//! honoured even when it comes with a 4xx/5xx status.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AdvisorConfig;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The pair sent to the advisor on a poll tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub emotion: String,
    pub transcript: String,
}

impl Snapshot {
    pub fn new(emotion: impl Into<String>, transcript: impl Into<String>) -> Self {
        Self {
            emotion: emotion.into(),
            transcript: transcript.into(),
        }
    }

    /// `true` when there is nothing worth asking about.
    pub fn is_empty(&self) -> bool {
        self.emotion.is_empty() && self.transcript.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AdviceError
// ---------------------------------------------------------------------------

/// Errors that can occur while contacting the advisor.
///
/// Every variant is surfaced to the user as the same generic log entry.
#[derive(Debug, Error)]
pub enum AdviceError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("advice request timed out")]
    Timeout,

    /// The backend answered with a non-success status and no `error` message.
    #[error("backend returned HTTP {0}")]
    Status(u16),

    /// The response body was not JSON.
    #[error("failed to parse advice response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for AdviceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AdviceError::Timeout
        } else {
            AdviceError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AdviceReply
// ---------------------------------------------------------------------------

/// A successfully parsed backend answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdviceReply {
    Advice(String),
    Error(String),
    /// Neither field was present; the tick changes nothing.
    Empty,
}

impl AdviceReply {
    /// Interpret a JSON response body.
    ///
    /// `advice` wins over `error` when both are present.  Blank or
    /// non-string values count as absent.
    ///
    /// ```
    /// use serde_json::json;
    /// use voice_coach::advice::AdviceReply;
    ///
    /// assert_eq!(
    ///     AdviceReply::from_body(&json!({ "advice": "Try empathy", "checks": [] })),
    ///     AdviceReply::Advice("Try empathy".into()),
    /// );
    /// assert_eq!(AdviceReply::from_body(&json!({ "result": "ok" })), AdviceReply::Empty);
    /// ```
    pub fn from_body(body: &serde_json::Value) -> Self {
        let field = |name: &str| {
            body.get(name)
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if let Some(advice) = field("advice") {
            AdviceReply::Advice(advice)
        } else if let Some(error) = field("error") {
            AdviceReply::Error(error)
        } else {
            AdviceReply::Empty
        }
    }
}

// ---------------------------------------------------------------------------
// AdviceClient trait
// ---------------------------------------------------------------------------

/// Async interface to the advisory backend.
///
/// Implementors must be `Send + Sync` so they can be shared with the
/// request tasks spawned by the poller (`Arc<dyn AdviceClient>`).
#[async_trait]
pub trait AdviceClient: Send + Sync {
    async fn advise(&self, snapshot: &Snapshot) -> Result<AdviceReply, AdviceError>;
}

// ---------------------------------------------------------------------------
// HttpAdviceClient
// ---------------------------------------------------------------------------

/// Posts snapshots as JSON to the configured advice endpoint.
pub struct HttpAdviceClient {
    client: reqwest::Client,
    url: String,
}

impl HttpAdviceClient {
    /// Build a client from advisor config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`; a default client is used if the builder fails.
    pub fn from_config(config: &AdvisorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: config.advice_url(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AdviceClient for HttpAdviceClient {
    async fn advise(&self, snapshot: &Snapshot) -> Result<AdviceReply, AdviceError> {
        let response = self.client.post(&self.url).json(snapshot).send().await?;

        let status = response.status();
        if !status.is_success() {
            // The backend reports its own failures as `{error}` with a 4xx/5xx.
            let body = response.json::<serde_json::Value>().await.ok();
            if let Some(AdviceReply::Error(message)) = body.as_ref().map(AdviceReply::from_body) {
                log::debug!("advice: backend error {status}: {message}");
                return Ok(AdviceReply::Error(message));
            }
            return Err(AdviceError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AdviceError::Parse(e.to_string()))?;

        Ok(AdviceReply::from_body(&body))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_serialises_both_fields() {
        let body = serde_json::to_value(Snapshot::new("sad", "I feel bad")).unwrap();
        assert_eq!(body, json!({ "emotion": "sad", "transcript": "I feel bad" }));
    }

    #[test]
    fn snapshot_is_empty_only_when_both_are() {
        assert!(Snapshot::default().is_empty());
        assert!(!Snapshot::new("sad", "").is_empty());
        assert!(!Snapshot::new("", "hello ").is_empty());
    }

    #[test]
    fn reply_error_field() {
        assert_eq!(
            AdviceReply::from_body(&json!({ "error": "RAG index not initialized" })),
            AdviceReply::Error("RAG index not initialized".into())
        );
    }

    #[test]
    fn reply_advice_wins_over_error() {
        assert_eq!(
            AdviceReply::from_body(&json!({ "advice": "a", "error": "e" })),
            AdviceReply::Advice("a".into())
        );
    }

    #[test]
    fn reply_other_shapes_are_empty() {
        assert_eq!(AdviceReply::from_body(&json!([1, 2])), AdviceReply::Empty);
        assert_eq!(AdviceReply::from_body(&json!({ "advice": 7 })), AdviceReply::Empty);
        assert_eq!(AdviceReply::from_body(&json!({ "advice": "" })), AdviceReply::Empty);
        assert_eq!(AdviceReply::from_body(&json!(null)), AdviceReply::Empty);
    }

    #[test]
    fn from_config_uses_advice_url() {
        let client = HttpAdviceClient::from_config(&AdvisorConfig::default());
        assert_eq!(client.url(), "http://localhost:5000/api/advice");
    }

    #[test]
    fn client_is_object_safe() {
        let client: Box<dyn AdviceClient> =
            Box::new(HttpAdviceClient::from_config(&AdvisorConfig::default()));
        drop(client);
    }

    /// Serve exactly one HTTP response on an ephemeral port and return the
    /// base URL.  The request is read in full before answering.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}")
    }

    fn client_for(base_url: String) -> HttpAdviceClient {
        let config = AdvisorConfig {
            base_url,
            timeout_secs: 5,
            ..AdvisorConfig::default()
        };
        HttpAdviceClient::from_config(&config)
    }

    #[tokio::test]
    async fn success_body_is_parsed() {
        let base = serve_once("200 OK", r#"{"advice":"Slow down"}"#).await;
        let reply = client_for(base).advise(&Snapshot::new("sad", "hi ")).await;
        assert_eq!(reply.unwrap(), AdviceReply::Advice("Slow down".into()));
    }

    #[tokio::test]
    async fn error_body_with_failure_status_keeps_backend_message() {
        let base = serve_once(
            "500 Internal Server Error",
            r#"{"error":"RAG index not initialized"}"#,
        )
        .await;
        let result = client_for(base).advise(&Snapshot::new("sad", "hi ")).await;
        assert_eq!(
            result.unwrap(),
            AdviceReply::Error("RAG index not initialized".into())
        );
    }

    #[tokio::test]
    async fn failure_status_without_error_message_is_status_error() {
        let base = serve_once("502 Bad Gateway", "<html>bad gateway</html>").await;
        let result = client_for(base).advise(&Snapshot::new("sad", "hi ")).await;
        assert!(matches!(result, Err(AdviceError::Status(502))));

        let base = serve_once("400 Bad Request", r#"{"detail":"nope"}"#).await;
        let result = client_for(base).advise(&Snapshot::new("sad", "hi ")).await;
        assert!(matches!(result, Err(AdviceError::Status(400))));
    }

    #[tokio::test]
    async fn backend_error_message_reaches_the_log() {
        use crate::advice::{AdviceLog, EntryKind};

        let base = serve_once("400 Bad Request", r#"{"error":"No transcript provided"}"#).await;
        let result = client_for(base).advise(&Snapshot::new("sad", "")).await;

        let mut log = AdviceLog::new();
        log.record(&result);
        assert_eq!(log.entries()[0].text, "No transcript provided");
        assert_eq!(log.entries()[0].kind, EntryKind::Error);
    }

    /// Nothing listens on port 1; the request must fail as a transport error.
    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let mut config = AdvisorConfig::default();
        config.base_url = "http://127.0.0.1:1".into();
        config.timeout_secs = 5;
        let client = HttpAdviceClient::from_config(&config);

        let result = client.advise(&Snapshot::new("sad", "I feel bad")).await;
        assert!(matches!(
            result,
            Err(AdviceError::Request(_)) | Err(AdviceError::Timeout)
        ));
    }
}
