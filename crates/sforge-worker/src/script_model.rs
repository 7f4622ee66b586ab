//! Topic scripts written by a language model served by Ollama.
//!
//! The model is asked for a single JSON object; text around it is ignored.
//! A reply whose narration is too short counts as a failed attempt. When every
//! attempt fails the caller falls back to the style templates.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use sforge_models::{Capabilities, Capability, Style};

use crate::config::WorkerConfig;
use crate::retry::{retry_async, RetryConfig};

/// A usable draft has more narration words than this.
pub const MIN_DRAFT_WORDS: usize = 50;

/// Comfortable speech pace in words per ten seconds, used to size the request.
const WORDS_PER_10_SECS_MIN: usize = 23;
const WORDS_PER_10_SECS_TARGET: usize = 25;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const ERROR_BODY_LIMIT: usize = 200;

const SYSTEM_PROMPT: &str =
    "You are a professional short-form video scriptwriter. Reply with valid JSON only.";

#[derive(Debug, Error)]
pub enum ScriptModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("reply contains no JSON object")]
    NoJson,

    #[error("reply is not a script object: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("script too short ({0} words)")]
    TooShort(usize),
}

pub type ScriptModelResult<T> = Result<T, ScriptModelError>;

/// Script fields filled in by the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelDraft {
    #[serde(default)]
    pub title: Option<String>,
    pub script: String,
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub cta: Option<String>,
}

impl ModelDraft {
    pub fn word_count(&self) -> usize {
        self.script.split_whitespace().count()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    format: &'static str,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
    num_ctx: u32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Ollama `/api/chat` client for topic scripts.
#[derive(Debug, Clone)]
pub struct OllamaScriptWriter {
    client: Client,
    base_url: String,
    model: String,
    retry: RetryConfig,
}

impl OllamaScriptWriter {
    pub fn new(base_url: &str, model: impl Into<String>) -> ScriptModelResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            model: model.into(),
            // Two attempts in total.
            retry: RetryConfig::new("script model").with_max_retries(1),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for a topic script.
    pub async fn write(
        &self,
        topic: &str,
        style: Style,
        duration_hint: u32,
    ) -> ScriptModelResult<ModelDraft> {
        let prompt = build_prompt(topic, style, duration_hint);
        let result = retry_async(
            &self.retry,
            |_: &ScriptModelError| true,
            || self.attempt(&prompt),
        )
        .await;

        let attempts = result.attempts();
        let draft = result.into_result()?;
        info!(
            model = %self.model,
            attempts,
            words = draft.word_count(),
            "Script model wrote draft"
        );
        Ok(draft)
    }

    async fn attempt(&self, prompt: &str) -> ScriptModelResult<ModelDraft> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            format: "json",
            options: ChatOptions {
                temperature: 0.7,
                top_p: 0.9,
                num_ctx: 8192,
                num_predict: 4096,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScriptModelError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let chat: ChatResponse = response.json().await?;
        debug!(chars = chat.message.content.len(), "Script model replied");
        parse_draft(&chat.message.content)
    }
}

/// Writer for the production pipeline, if the model is configured.
pub fn build_writer(caps: &Capabilities, config: &WorkerConfig) -> Option<OllamaScriptWriter> {
    if !caps.is_available(Capability::ScriptModel) {
        return None;
    }
    let url = config.ollama_url.as_deref()?;
    match OllamaScriptWriter::new(url, config.ollama_model.clone()) {
        Ok(writer) => Some(writer),
        Err(e) => {
            warn!("Script model disabled, HTTP client setup failed: {}", e);
            None
        }
    }
}

/// Decode a model reply into a draft.
pub fn parse_draft(content: &str) -> ScriptModelResult<ModelDraft> {
    let json = extract_json(content).ok_or(ScriptModelError::NoJson)?;
    let draft: ModelDraft = serde_json::from_str(json)?;
    let words = draft.word_count();
    if words <= MIN_DRAFT_WORDS {
        return Err(ScriptModelError::TooShort(words));
    }
    Ok(draft)
}

/// From the first `{` through the last `}`.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

fn style_direction(style: Style) -> &'static str {
    match style {
        Style::Viral => "hook-first and punchy, every sentence earns the next",
        Style::Educational => "a clear explainer built around three numbered points",
        Style::Story => "a narrative arc with a twist near the end",
    }
}

fn build_prompt(topic: &str, style: Style, duration_hint: u32) -> String {
    let secs = duration_hint as usize;
    let min_words = (secs * WORDS_PER_10_SECS_MIN / 10).max(MIN_DRAFT_WORDS + 1);
    let target_words = (secs * WORDS_PER_10_SECS_TARGET / 10).max(min_words);

    format!(
        r##"Write the narration for a {duration_hint}-second vertical video.
Topic: "{topic}"
Style: {style}, {direction}.

The narration MUST be between {min_words} and {target_words} words.
Go straight into the content. No greetings, no introductions.

Return ONLY a JSON object with this schema:
{{
  "title": "Catchy title, at most 60 characters",
  "hook": "The opening sentence of the narration",
  "script": "The complete narration text",
  "hashtags": ["#tag", "#tag", "#tag"],
  "cta": "One sentence asking viewers to follow or share"
}}"##,
        duration_hint = duration_hint,
        topic = topic.trim(),
        style = style,
        direction = style_direction(style),
        min_words = min_words,
        target_words = target_words,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn words(n: usize) -> String {
        vec!["ocean"; n].join(" ")
    }

    fn chat_reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1:8b",
            "message": { "role": "assistant", "content": content },
            "done": true
        }))
    }

    fn draft_json(word_count: usize) -> String {
        json!({
            "title": "The Deep Ocean Is Stranger Than Space",
            "hook": "Only 5% of the ocean has been mapped.",
            "script": words(word_count),
            "hashtags": ["#ocean", "#deepsea"],
            "cta": "Follow for more ocean facts."
        })
        .to_string()
    }

    fn writer(server: &MockServer) -> OllamaScriptWriter {
        OllamaScriptWriter::new(&server.uri(), "llama3.1:8b")
            .unwrap()
            .with_retry(
                RetryConfig::new("script model")
                    .with_max_retries(1)
                    .with_base_delay(Duration::from_millis(1)),
            )
    }

    #[test]
    fn test_parse_draft_ignores_surrounding_text() {
        let reply = format!("Sure! Here it is:\n```json\n{}\n```", draft_json(60));
        let draft = parse_draft(&reply).unwrap();
        assert_eq!(draft.title.as_deref(), Some("The Deep Ocean Is Stranger Than Space"));
        assert_eq!(draft.word_count(), 60);
        assert_eq!(draft.hashtags, vec!["#ocean", "#deepsea"]);
    }

    #[test]
    fn test_parse_draft_rejects_unusable_replies() {
        assert!(matches!(parse_draft("no json here"), Err(ScriptModelError::NoJson)));
        assert!(matches!(parse_draft("} backwards {"), Err(ScriptModelError::NoJson)));
        assert!(matches!(
            parse_draft(r#"{"title": "missing script"}"#),
            Err(ScriptModelError::Decode(_))
        ));
        assert!(matches!(
            parse_draft(&draft_json(MIN_DRAFT_WORDS)),
            Err(ScriptModelError::TooShort(50))
        ));
    }

    #[test]
    fn test_prompt_sizes_word_count() {
        let prompt = build_prompt("black holes", Style::Educational, 60);
        assert!(prompt.contains("between 138 and 150 words"));
        assert!(prompt.contains("Topic: \"black holes\""));

        // Short hints still ask for more than the minimum draft length.
        let prompt = build_prompt("AI", Style::Viral, 10);
        assert!(prompt.contains("between 51 and 51 words"));
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("ollama:11434"), "http://ollama:11434");
        assert_eq!(normalize_base_url("https://llm.local/"), "https://llm.local");
    }

    #[tokio::test]
    async fn test_write_returns_draft() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama3.1:8b",
                "stream": false,
                "format": "json"
            })))
            .respond_with(chat_reply(&draft_json(80)))
            .expect(1)
            .mount(&server)
            .await;

        let draft = writer(&server).write("deep ocean", Style::Viral, 60).await.unwrap();
        assert_eq!(draft.word_count(), 80);
        assert_eq!(draft.cta.as_deref(), Some("Follow for more ocean facts."));
    }

    #[tokio::test]
    async fn test_short_reply_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(chat_reply(&draft_json(12)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(chat_reply(&draft_json(70)))
            .mount(&server)
            .await;

        let draft = writer(&server).write("deep ocean", Style::Story, 30).await.unwrap();
        assert_eq!(draft.word_count(), 70);
    }

    #[tokio::test]
    async fn test_gives_up_after_two_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .expect(2)
            .mount(&server)
            .await;

        let err = writer(&server)
            .write("deep ocean", Style::Viral, 60)
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptModelError::Status { status: 500, ref body } if body == "model not loaded"));
    }

    #[test]
    fn test_build_writer_requires_capability() {
        let config = WorkerConfig {
            ollama_url: Some("http://localhost:11434".into()),
            ..WorkerConfig::default()
        };
        assert!(build_writer(&Capabilities::none(), &config).is_none());

        let caps = Capabilities::none().with(Capability::ScriptModel, true);
        let writer = build_writer(&caps, &config).unwrap();
        assert_eq!(writer.model(), "llama3.1:8b");
    }
}
