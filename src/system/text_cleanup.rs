//! Remote text cleanup.
//!
//! Optional alternative to the local reflow pipeline: the raw OCR text is sent to a
//! text-generation backend that rewrites it into clean prose. The call is best effort. Any
//! failure is logged and the caller gets its input back unchanged.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use pulldown_cmark::{Event, Parser, TagEnd};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default backend base URL when not set in config or env.
pub const DEFAULT_CLEANUP_URL: &str = "http://127.0.0.1:8080";

const CLEANUP_TASK: &str = "CLEANUP";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

const CLEANUP_PROMPT: &str = r#"The following text was extracted from a screenshot with OCR. It may contain navigation labels, broken words, stray symbols and missing paragraph breaks.

Rewrite it as clean, readable prose. Keep the original wording and order, fix spacing, casing and punctuation, drop menu or button labels, and separate paragraphs with a blank line. Do not summarize, add commentary or use markdown.

Text:
{content}"#;

#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Cleanup service error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Cleanup service returned no text")]
    Empty,
}

/// A text-generation backend. Object safe so sessions can hold `Box<dyn TextGenerator>`.
pub trait TextGenerator: Send + Sync {
    fn generate_text<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, CleanupError>>;
}

pub fn build_cleanup_prompt(text: &str) -> String {
    CLEANUP_PROMPT.replace("{content}", text)
}

/// Flattens markdown into plain paragraphs separated by blank lines.
fn markdown_to_plain_text(markdown: &str) -> String {
    fn flush(blocks: &mut Vec<String>, current: &mut String) {
        let block = current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !block.is_empty() {
            blocks.push(block);
        }
        current.clear();
    }

    let mut blocks = Vec::new();
    let mut current = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => current.push_str(&text),
            Event::SoftBreak | Event::HardBreak => current.push(' '),
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
            ) => flush(&mut blocks, &mut current),
            _ => {}
        }
    }
    flush(&mut blocks, &mut current);
    blocks.join("\n\n")
}

fn has_markdown_syntax(text: &str) -> bool {
    text.contains('#')
        || text.contains('*')
        || text.contains('[')
        || text.contains('`')
        || text.trim_start().starts_with("- ")
}

/// Collapses whitespace per line and keeps blank lines as paragraph breaks.
fn tidy_plain_text(text: &str) -> String {
    text.split("\n\n")
        .map(|block| block.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Sends `text` through the generator. Never fails: on any error the input comes back as is.
pub async fn cleanup_with_fallback(generator: &dyn TextGenerator, text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }
    info!(bytes = text.len(), "Sending text to cleanup service");

    let prompt = build_cleanup_prompt(text);
    let cleaned = match generator.generate_text(&prompt).await {
        Ok(cleaned) => cleaned,
        Err(e) => {
            warn!(error = %e, "Cleanup service failed, keeping original text");
            return text.to_string();
        }
    };

    let plain = if has_markdown_syntax(&cleaned) {
        markdown_to_plain_text(&cleaned)
    } else {
        tidy_plain_text(&cleaned)
    };
    if plain.is_empty() {
        warn!("Cleanup service returned only whitespace, keeping original text");
        return text.to_string();
    }

    info!(
        original_bytes = text.len(),
        cleaned_bytes = plain.len(),
        "Cleanup completed"
    );
    debug!(preview = %plain.chars().take(100).collect::<String>(), "Cleaned text preview");
    plain
}

#[derive(serde::Serialize)]
struct PromptRequest<'a> {
    task: &'a str,
    content: &'a str,
}

#[derive(serde::Deserialize)]
struct PromptResponse {
    response: String,
}

#[derive(serde::Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

/// HTTP client for a backend exposing `POST /api/prompt` and `GET /health`.
pub struct RemoteTextGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteTextGenerator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CleanupError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Pings `GET /health`. Returns true if the backend answered with success.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, url = %url, "Cleanup service health check failed");
                false
            }
        }
    }

    async fn prompt(&self, prompt: &str) -> Result<String, CleanupError> {
        let url = format!("{}/api/prompt", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&PromptRequest {
                task: CLEANUP_TASK,
                content: prompt,
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let body = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or(body);
            return Err(CleanupError::Status { status, body });
        }

        let parsed: PromptResponse = serde_json::from_str(&body).map_err(|e| CleanupError::Status {
            status,
            body: format!("invalid response: {e}"),
        })?;
        if parsed.response.trim().is_empty() {
            return Err(CleanupError::Empty);
        }
        Ok(parsed.response)
    }
}

impl TextGenerator for RemoteTextGenerator {
    fn generate_text<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, CleanupError>> {
        self.prompt(prompt).boxed()
    }
}
