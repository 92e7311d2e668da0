use std::borrow::Cow;
use std::sync::OnceLock;

use minijinja::{Environment, context};
use regex::Regex;
use serde::Deserialize;

use crate::entities::patient::PatientRecord;
use crate::error::TrialScoutError;

const OPENAI_BASE: &str = "https://api.openai.com/v1";
const OPENAI_BASE_ENV: &str = "TRIALSCOUT_OPENAI_BASE";
const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
const MOCK_ENV: &str = "TRIALSCOUT_MOCK_EXTRACTION";
const EXTRACTION_API: &str = "openai";
const EXTRACTION_MODEL: &str = "gpt-4o-mini";

const PROMPT_TEMPLATE: &str = r#"You are a medical intake assistant. Extract structured patient oncology data from the conversation transcript below.

Return a JSON object with EXACTLY these keys:
{
  "age": number | null,
  "sex": string | null,
  "diagnosis": string | null,
  "cancer_stage": string | null,
  "location": string | null,
  "prior_treatments": string[],
  "performance_status": string | null
}

Rules:
- Use null if unknown.
- "performance_status" should be ECOG-style text if mentioned (e.g. "ECOG 1").
- "prior_treatments" should be an array of strings of systemic therapies, radiation, surgeries, etc.
- Be concise, no extra keys, no commentary.
- Output ONLY raw JSON, no markdown fences.

Transcript:
"""{{ transcript }}"""
"#;

static PROMPT_ENV: OnceLock<Environment<'static>> = OnceLock::new();
static FENCE_RE: OnceLock<Regex> = OnceLock::new();

/// Client for the transcript-extraction collaborator (an OpenAI-compatible
/// chat-completion API). With `TRIALSCOUT_MOCK_EXTRACTION=true` it
/// short-circuits to the static demonstration record and needs no key.
#[derive(Clone)]
pub struct ExtractionClient {
    client: reqwest::Client,
    base: Cow<'static, str>,
    api_key: Option<String>,
    mock: bool,
}

impl ExtractionClient {
    pub fn from_env() -> Result<Self, TrialScoutError> {
        let mock = std::env::var(MOCK_ENV)
            .is_ok_and(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"));
        let api_key = std::env::var(OPENAI_KEY_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if !mock && api_key.is_none() {
            return Err(TrialScoutError::ApiKeyRequired {
                api: EXTRACTION_API.to_string(),
                env_var: OPENAI_KEY_ENV.to_string(),
                docs_url: "https://platform.openai.com/api-keys".to_string(),
            });
        }

        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(OPENAI_BASE, OPENAI_BASE_ENV),
            api_key,
            mock,
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String, api_key: String) -> Result<Self, TrialScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base),
            api_key: Some(api_key),
            mock: false,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Sends the transcript through the extraction prompt and returns the
    /// raw attribute bag from the model's reply.
    ///
    /// The bag is deliberately untyped; it must pass through
    /// [`PatientRecord::from_attributes`] before reaching the pipeline.
    pub async fn extract(&self, transcript: &str) -> Result<serde_json::Value, TrialScoutError> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(TrialScoutError::InvalidArgument(
                "Transcript is required".into(),
            ));
        }

        if self.mock {
            return Ok(serde_json::to_value(PatientRecord::demo())?);
        }

        let Some(api_key) = self.api_key.as_deref() else {
            return Err(TrialScoutError::ApiKeyRequired {
                api: EXTRACTION_API.to_string(),
                env_var: OPENAI_KEY_ENV.to_string(),
                docs_url: "https://platform.openai.com/api-keys".to_string(),
            });
        };

        let prompt = build_prompt(transcript)?;
        let body = serde_json::json!({
            "model": EXTRACTION_MODEL,
            "temperature": 0,
            "messages": [{"role": "user", "content": prompt}],
        });

        let resp = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, EXTRACTION_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(TrialScoutError::Api {
                api: EXTRACTION_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        let completion: ChatCompletionResponse =
            serde_json::from_slice(&bytes).map_err(|source| TrialScoutError::ApiJson {
                api: EXTRACTION_API.to_string(),
                source,
            })?;
        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.trim())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| TrialScoutError::Api {
                api: EXTRACTION_API.to_string(),
                message: "Completion contained no content".into(),
            })?;

        parse_attribute_bag(content)
    }
}

fn build_prompt(transcript: &str) -> Result<String, TrialScoutError> {
    if let Some(env) = PROMPT_ENV.get() {
        return Ok(env.get_template("extract")?.render(context! { transcript })?);
    }

    let mut env = Environment::new();
    env.add_template("extract", PROMPT_TEMPLATE)?;
    let _ = PROMPT_ENV.set(env);
    match PROMPT_ENV.get() {
        Some(env) => Ok(env.get_template("extract")?.render(context! { transcript })?),
        None => Err(TrialScoutError::Api {
            api: EXTRACTION_API.to_string(),
            message: "Prompt environment initialization race".into(),
        }),
    }
}

/// Parses the model reply as JSON, stripping markdown code fences if the
/// model wrapped its output despite the prompt.
fn parse_attribute_bag(raw: &str) -> Result<serde_json::Value, TrialScoutError> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Ok(value);
    }

    let fence = FENCE_RE.get_or_init(|| Regex::new(r"(?i)```(?:json)?").expect("valid regex"));
    let cleaned = fence.replace_all(raw, "");
    serde_json::from_str(cleaned.trim()).map_err(|source| TrialScoutError::ApiJson {
        api: EXTRACTION_API.to_string(),
        source,
    })
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}
