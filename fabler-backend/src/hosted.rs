use async_trait::async_trait;
use fabler_common::{bail, err, Conf, Context as _, Report};
use isahc::HttpClient;

use crate::StoryBackend;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_API_MODEL: &str = "gemini-2.0-flash";

/// Client for a hosted `generateContent` style text completion endpoint.
pub struct HostedBackend {
    client: HttpClient,
    api_key: String,
    model: String,
    base: String,
}

impl HostedBackend {
    pub fn from_conf(conf: &Conf) -> Result<Self, Report> {
        let api_key = conf.api_key.clone().ok_or_else(|| {
            err!("the hosted backend needs a credential, set `FABLER_API_KEY` or `--api-key`")
        })?;

        Ok(Self {
            client: crate::utils::client()?,
            api_key,
            model: conf
                .api_model
                .clone()
                .unwrap_or_else(|| DEFAULT_API_MODEL.to_string()),
            base: conf
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base, self.model, self.api_key
        )
    }
}

#[async_trait]
impl StoryBackend for HostedBackend {
    #[tracing::instrument(skip_all, fields(model = %self.model), err)]
    async fn generate(&self, prompt: &str) -> Result<String, Report> {
        let body = serde_json::to_vec(&GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        })?;

        let (status, text) = crate::utils::post_json(&self.client, &self.url(), body).await?;

        if !(200..300).contains(&status) {
            bail!("completion endpoint returned status {}", status);
        }

        extract_completion(&text)
    }
}

#[derive(serde::Serialize)]
struct GenerateRequest<'p> {
    contents: Vec<Content<'p>>,
}

#[derive(serde::Serialize)]
struct Content<'p> {
    parts: Vec<Part<'p>>,
}

#[derive(serde::Serialize)]
struct Part<'p> {
    text: &'p str,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(serde::Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(serde::Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pulls the completion text out of the response body. An answer with no
/// candidates decodes to an empty string, which the sanitizer rejects
/// downstream.
fn extract_completion(body: &str) -> Result<String, Report> {
    let response: GenerateResponse =
        serde_json::from_str(body).context("malformed completion response")?;

    let text = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_text_is_extracted() {
        let body = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "Once upon " },
                            { "text": "a time." }
                        ]
                    }
                }
            ]
        }"#;

        assert_eq!(extract_completion(body).unwrap(), "Once upon a time.");
    }

    #[test]
    fn missing_candidates_decode_to_an_empty_completion() {
        assert_eq!(extract_completion("{}").unwrap(), "");
    }

    #[test]
    fn garbage_bodies_are_an_error() {
        assert!(extract_completion("not json").is_err());
    }
}
