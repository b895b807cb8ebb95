//! Per-paragraph revision against a chat-completions style service.

use super::errors::RevisionError;
use crate::extract::ParagraphUnit;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.deepseek.com/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(200);

/// Longest slice of an error response body kept for the log.
const ERROR_BODY_LIMIT: usize = 200;

const DEFAULT_PROMPT: &str = "\
You will receive one paragraph of a longer document. Revise it lightly: fix \
typos, grammar mistakes, and sentences that are unclear or do not read \
naturally. Keep the original meaning, language and all important \
information; do not rewrite it heavily or cut content.

Paragraph {index}:
{paragraph}

Return only the revised paragraph.";

/// Instruction sent with every paragraph.
///
/// `{index}` expands to the 1-based paragraph number and `{paragraph}` to the
/// paragraph text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, unit: &ParagraphUnit) -> String {
        self.0
            .replace("{index}", &(unit.index + 1).to_string())
            .replace("{paragraph}", &unit.text)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT)
    }
}

/// Where and how paragraphs are sent.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
    pub prompt: PromptTemplate,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            prompt: PromptTemplate::default(),
        }
    }
}

/// Transport seam: one attempt to revise one paragraph.
pub trait RevisionBackend: Send + Sync {
    fn try_revise(&self, unit: &ParagraphUnit) -> Result<String, RevisionError>;
}

/// Fail-open wrapper around a backend.
///
/// [`RevisionClient::revise`] always yields text: the revision on success,
/// the unit's original text on any failure. Failures are only visible in the
/// log and in [`RevisionClient::failure_count`].
#[derive(Debug)]
pub struct RevisionClient<B> {
    backend: B,
    failures: AtomicUsize,
}

impl<B: RevisionBackend> RevisionClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            failures: AtomicUsize::new(0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn revise(&self, unit: &ParagraphUnit) -> String {
        match self.backend.try_revise(unit) {
            Ok(revised) => {
                log::debug!("paragraph {} revised", unit.index + 1);
                revised
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "paragraph {} revision failed, keeping original: {}",
                    unit.index + 1,
                    e
                );
                unit.text.clone()
            }
        }
    }

    /// Number of calls that fell back to the original text.
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP backend speaking the chat-completions protocol with bearer auth.
#[derive(Debug, Clone)]
pub struct ChatCompletionsBackend {
    client: Client,
    api_key: String,
    settings: ServiceSettings,
}

impl ChatCompletionsBackend {
    pub fn new(api_key: impl Into<String>, settings: ServiceSettings) -> Result<Self, RevisionError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            settings,
        })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }
}

impl RevisionBackend for ChatCompletionsBackend {
    fn try_revise(&self, unit: &ParagraphUnit) -> Result<String, RevisionError> {
        let prompt = self.settings.prompt.render(unit);
        let request = ChatRequest {
            model: &self.settings.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(RevisionError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        parse_content(&body)
    }
}

/// Extract `choices[0].message.content`, trimmed.
pub(crate) fn parse_content(body: &str) -> Result<String, RevisionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| RevisionError::MalformedResponse(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RevisionError::MalformedResponse("no choices in response".to_string()))?
        .message
        .content
        .ok_or_else(|| RevisionError::MalformedResponse("choice has no content".to_string()))?;

    let content = content.trim();
    if content.is_empty() {
        return Err(RevisionError::EmptyContent);
    }
    Ok(content.to_string())
}
