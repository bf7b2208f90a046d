use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::app::ports::TextGenerator;
use crate::config::GenerationConfig;
use crate::error::GenerationFailure;
use crate::pipeline::processing::CanonicalField;
use crate::pipeline::RECORD_ID_FIELD;
use crate::types::Record;

const PERSONA: &str = "あなたはプロの営業文面作成者です。";

/// Fields that describe processing state rather than the company.
const EXCLUDED_FIELDS: [&str; 2] = ["status", "generated_text"];

/// Live generator backed by the Gemini `generateContent` REST endpoint.
pub struct GeminiGenerator {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationFailure> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GenerationFailure::Disabled("GEMINI_API_KEY is not set".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key,
        })
    }
}

/// `key: value` lines for every field that says something about the company.
pub fn build_prompt(record: &Record) -> String {
    let company_info: String = record
        .fields
        .keys()
        .filter(|key| key.as_str() != RECORD_ID_FIELD && !EXCLUDED_FIELDS.contains(&key.as_str()))
        .filter_map(|key| {
            record
                .display(key)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{key}: {v}\n"))
        })
        .collect();

    format!(
        "以下の企業情報に基づいて、効果的な営業文面を日本語で作成してください。\n\n\
         ## 企業情報\n{company_info}\n\
         ## 指示\n\
         - 丁寧な敬語を使用すること\n\
         - 企業の業種や規模に合わせた提案をすること\n\
         - 具体的な価値提案を含めること\n\
         - 営業文面は300文字程度にすること\n"
    )
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": [{ "text": PERSONA }] },
            { "role": "user", "parts": [{ "text": prompt }] }
        ]
    })
}

fn extract_text(response: GenerateResponse) -> Result<String, GenerationFailure> {
    response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .find(|t| !t.trim().is_empty())
        .ok_or(GenerationFailure::EmptyResponse)
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, record: &Record) -> Result<String, GenerationFailure> {
        let company = record
            .display(CanonicalField::CompanyName.id())
            .unwrap_or_default();
        debug!("Requesting outreach text for '{}'", company);

        let resp = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(&build_prompt(record)))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationFailure::Status {
                status: status.as_u16(),
                body,
            });
        }
        extract_text(resp.json::<GenerateResponse>().await?)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    #[test]
    fn test_prompt_lists_only_company_fields() {
        let record = Record::new("r1")
            .with_field("company_name", "テスト株式会社")
            .with_field("employee_count", 100.0)
            .with_field("status", "処理中")
            .with_field("generated_text", "old")
            .with_field("email", CellValue::Null);

        let prompt = build_prompt(&record);
        assert!(prompt.contains("company_name: テスト株式会社\n"));
        assert!(prompt.contains("employee_count: 100\n"));
        assert!(!prompt.contains("status"));
        assert!(!prompt.contains("generated_text"));
        assert!(!prompt.contains("email"));
        assert!(!prompt.contains("r1"));
    }

    #[test]
    fn test_request_body_carries_persona_first() {
        let body = request_body("hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], PERSONA);
        assert_eq!(body["contents"][1]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_extract_text() {
        let ok: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "拝啓" }] } }]
        }))
        .unwrap();
        assert_eq!(extract_text(ok).unwrap(), "拝啓");

        let empty: GenerateResponse = serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(matches!(extract_text(empty), Err(GenerationFailure::EmptyResponse)));
    }

    #[test]
    fn test_missing_key_disables_backend() {
        let err = GeminiGenerator::new(&GenerationConfig::default()).err();
        assert!(matches!(err, Some(GenerationFailure::Disabled(_))));
    }
}
