//! Network leg of the upload widget.
//!
//! An upload runs as a background task and reports through two channels: a
//! watch feed of whole-number percentages while the body goes out, and a
//! three-variant [`UploadOutcome`] once the exchange is over.

use std::convert::Infallible;
use std::path::Path;

use futures::StreamExt;
use reqwest::{multipart, Body};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::ErrorResponse;

/// How much of the body goes out per chunk of the progress stream.
const CHUNK_SIZE: usize = 64 * 1024;

/// The file currently held by the widget. Contents live in memory, so a
/// selection is cheap to replace wholesale and its total size is always
/// known to the progress math.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { name, bytes })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Terminal result of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The server answered 2xx. Carries its `message` when the JSON body
    /// had one.
    Completed { message: Option<String> },
    /// The server answered outside 2xx, or the request could not be built
    /// in the first place.
    Rejected { message: String },
    /// No response at all.
    Unreachable,
}

/// Transfer percentage, rounded. `None` when the total is unknown or zero,
/// in which case no progress is ever reported.
pub fn percent(sent: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    Some(((sent as f64 / total as f64) * 100.0).round() as u8)
}

/// Maps a terminal HTTP response onto an outcome.
///
/// An error body that fails to parse as JSON, or parses without a
/// `message`, degrades to a message carrying only the status code.
pub fn outcome_for_response(status: u16, body: &str) -> UploadOutcome {
    if (200..300).contains(&status) {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("message")?.as_str().map(str::to_string));
        UploadOutcome::Completed { message }
    } else {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|error| error.message)
            .unwrap_or_else(|_| format!("server error: {status}"));
        UploadOutcome::Rejected { message }
    }
}

/// An in-flight upload. Await [`UploadTask::outcome`] for the terminal
/// result; [`UploadTask::progress`] hands out the live percentage feed.
pub struct UploadTask {
    progress: watch::Receiver<u8>,
    handle: JoinHandle<UploadOutcome>,
}

impl UploadTask {
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress.clone()
    }

    pub async fn outcome(self) -> UploadOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(_) => UploadOutcome::Rejected {
                message: "the upload task was cancelled".to_string(),
            },
        }
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Issues single-field multipart uploads against one fixed endpoint.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    endpoint: String,
}

impl UploadClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Starts the upload in the background and returns its handle.
    pub fn start(&self, file: SelectedFile) -> UploadTask {
        let (feed, progress) = watch::channel(0);
        let client = self.clone();
        let handle = tokio::spawn(async move { client.send(file, feed).await });

        UploadTask { progress, handle }
    }

    async fn send(&self, file: SelectedFile, feed: watch::Sender<u8>) -> UploadOutcome {
        let total = file.bytes.len() as u64;
        let body = Body::wrap_stream(progress_stream(file.bytes, feed));
        let part = multipart::Part::stream_with_length(body, total).file_name(file.name);
        let form = multipart::Form::new().part("file", part);

        let response = match self.http.post(&self.endpoint).multipart(form).send().await {
            Ok(response) => response,
            Err(err) if err.is_builder() => {
                return UploadOutcome::Rejected { message: err.to_string() }
            }
            Err(_) => return UploadOutcome::Unreachable,
        };

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        outcome_for_response(status, &body)
    }
}

/// Chops the payload into chunks and publishes the running percentage as
/// each chunk is handed to the transport.
fn progress_stream(
    data: Vec<u8>,
    feed: watch::Sender<u8>,
) -> impl futures::Stream<Item = Result<Vec<u8>, Infallible>> {
    let total = data.len() as u64;
    let chunks: Vec<Vec<u8>> = data.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    let mut sent = 0u64;

    futures::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(pct) = percent(sent, total) {
            let _ = feed.send(pct);
        }
        Ok(chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_and_reaches_one_hundred() {
        assert_eq!(percent(1, 3), Some(33));
        assert_eq!(percent(2, 3), Some(67));
        assert_eq!(percent(512, 1024), Some(50));
        assert_eq!(percent(1024, 1024), Some(100));
    }

    #[test]
    fn percent_increases_with_the_byte_counter() {
        let total = 10_000;
        let mut last = 0;
        for sent in (0..=total).step_by(1000) {
            let pct = percent(sent, total).unwrap();
            assert!(pct >= last);
            last = pct;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn unknown_total_reports_no_progress() {
        assert_eq!(percent(0, 0), None);
    }

    #[test]
    fn success_response_carries_the_server_message() {
        let outcome =
            outcome_for_response(200, r#"{"message":"ok","filename":"a.txt","path":"/u/a.txt"}"#);
        assert_eq!(outcome, UploadOutcome::Completed { message: Some("ok".to_string()) });
    }

    #[test]
    fn success_without_a_message_field_still_completes() {
        assert_eq!(outcome_for_response(204, "{}"), UploadOutcome::Completed { message: None });
        assert_eq!(outcome_for_response(200, "plain"), UploadOutcome::Completed { message: None });
    }

    #[test]
    fn error_response_surfaces_the_server_message() {
        let outcome = outcome_for_response(500, r#"{"message":"disk full"}"#);
        assert_eq!(outcome, UploadOutcome::Rejected { message: "disk full".to_string() });
    }

    #[test]
    fn unparseable_error_body_falls_back_to_the_status_code() {
        let outcome = outcome_for_response(502, "<html>bad gateway</html>");
        assert_eq!(outcome, UploadOutcome::Rejected { message: "server error: 502".to_string() });
    }
}
