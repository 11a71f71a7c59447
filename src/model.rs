//! Client for the language-model collaborator.
//!
//! Model output is never trusted: responses are decoded leniently (strip
//! code fences, structured parse, regex extraction as the last resort)
//! and always reduce to a well-typed, possibly empty result instead of a
//! parse error.

use crate::error::{AppError, Result};
use crate::models::ListingDetails;
use crate::scanner;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// A bearer token shorter than this cannot be a real credential.
const MIN_CREDENTIAL_LEN: usize = 10;

const ANALYZE_MAX_TOKENS: u32 = 800;
const GENERATE_MAX_TOKENS: u32 = 50;

static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?").expect("code fence pattern"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?[\d\s\-()]{10,}").expect("phone pattern"));

/// Structured contact data recovered from a model response.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub(crate) struct ModelEnrichment {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub social_media: Vec<String>,
    #[serde(default)]
    pub additional_contacts: Vec<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl ModelEnrichment {
    pub(crate) fn is_empty(&self) -> bool {
        self.emails.is_empty()
            && self.phones.is_empty()
            && self.social_media.is_empty()
            && self.additional_contacts.is_empty()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub(crate) struct ModelClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ModelClient {
    pub(crate) fn new(
        http: Client,
        endpoint: String,
        model: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            endpoint,
            model,
            api_key,
        }
    }

    /// True when a plausible credential is present. Absent or implausibly
    /// short credentials short-circuit the model states without a network
    /// call.
    pub(crate) fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map(str::trim)
            .is_some_and(|key| key.len() >= MIN_CREDENTIAL_LEN)
    }

    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref().map(str::trim) else {
            return Err(AppError::ModelNotConfigured);
        };
        if api_key.len() < MIN_CREDENTIAL_LEN {
            return Err(AppError::ModelNotConfigured);
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.3,
            max_tokens,
            top_p: 0.9,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Model(format!(
                "model endpoint answered {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Model("no content in model response".to_string()))
    }

    /// Asks the model to analyze the listing's known data and propose
    /// contact information. The response is decoded leniently; emails and
    /// phones are post-filtered for shape.
    pub(crate) async fn analyze_listing(&self, details: &ListingDetails) -> Result<ModelEnrichment> {
        let prompt = analysis_prompt(details);
        let content = self
            .complete(
                "You are a helpful assistant specialized in extracting and analyzing business contact information. Always respond with valid JSON and provide realistic, useful suggestions.",
                &prompt,
                ANALYZE_MAX_TOKENS,
            )
            .await?;

        let mut enrichment = decode_enrichment(&content);
        enrichment.emails.retain(|email| {
            email.contains('@') && email.contains('.') && email.len() > 5
        });
        enrichment
            .phones
            .retain(|phone| phone.chars().filter(char::is_ascii_digit).count() >= 10);
        tracing::debug!(
            target: "model",
            "Analysis yielded {} emails, {} phones",
            enrichment.emails.len(),
            enrichment.phones.len()
        );
        Ok(enrichment)
    }

    /// Asks the model to generate a single plausible address from the
    /// user-supplied prompt. Returns `None` when the reply is not a valid
    /// email.
    pub(crate) async fn generate_address(&self, prompt: &str) -> Result<Option<String>> {
        let content = self
            .complete(
                "You are an expert at generating likely business email addresses based on business information. Respond only with the most likely email address in a valid email format, nothing else.",
                prompt,
                GENERATE_MAX_TOKENS,
            )
            .await?;

        let candidate = content.trim().to_lowercase();
        if scanner::is_email_format(&candidate) {
            Ok(Some(candidate))
        } else {
            tracing::debug!(target: "model", "Generated text is not a valid address: {}", candidate);
            Ok(None)
        }
    }
}

fn analysis_prompt(details: &ListingDetails) -> String {
    format!(
        "You are an expert at finding business contact information. Analyze the following business data and help find potential email addresses, phone numbers, and other contact information.\n\n\
         Business Information:\n\
         - Name: {}\n\
         - Address: {}\n\
         - Phone: {}\n\
         - Website: {}\n\
         - Additional Information: {}\n\n\
         Suggest likely email patterns for this business (info@, contact@, sales@, support@, hello@ on its domain), extract any additional phone numbers, and identify social media profiles or alternative contact methods mentioned above.\n\n\
         Provide your analysis in this JSON format:\n\
         {{\n\
             \"emails\": [\"email1@example.com\", \"email2@example.com\"],\n\
             \"phones\": [\"phone1\", \"phone2\"],\n\
             \"social_media\": [\"profile1\", \"profile2\"],\n\
             \"additional_contacts\": [\"contact1\", \"contact2\"],\n\
             \"confidence\": \"high|medium|low\",\n\
             \"reasoning\": \"Brief explanation of your analysis\"\n\
         }}\n\n\
         Focus on realistic, likely contact information based on the business data provided. Return only valid JSON.",
        non_empty(details.name.as_str()),
        non_empty(details.address.as_deref().unwrap_or("")),
        non_empty(details.phone.as_deref().unwrap_or("")),
        non_empty(details.website.as_deref().unwrap_or("")),
        non_empty(&details.additional_info),
    )
}

fn non_empty(value: &str) -> &str {
    if value.trim().is_empty() { "Unknown" } else { value }
}

/// Strict structured parse first, pattern extraction second, and always a
/// well-typed result.
pub(crate) fn decode_enrichment(content: &str) -> ModelEnrichment {
    let cleaned = CODE_FENCE_RE.replace_all(content, "");
    let cleaned = cleaned.trim();

    if let Ok(enrichment) = serde_json::from_str::<ModelEnrichment>(cleaned) {
        return enrichment;
    }

    tracing::debug!(target: "model", "Structured parse failed, extracting by pattern");
    ModelEnrichment {
        emails: scanner::scan_text(content),
        phones: PHONE_RE
            .find_iter(content)
            .map(|m| m.as_str().trim().to_string())
            .collect(),
        social_media: Vec::new(),
        additional_contacts: Vec::new(),
        confidence: Some("low".to_string()),
        reasoning: Some("Extracted using pattern matching due to JSON parsing failure".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fenced_json() {
        let content = "```json\n{\"emails\": [\"info@acme.com\"], \"confidence\": \"high\"}\n```";
        let enrichment = decode_enrichment(content);
        assert_eq!(enrichment.emails, vec!["info@acme.com".to_string()]);
        assert_eq!(enrichment.confidence.as_deref(), Some("high"));
    }

    #[test]
    fn test_decode_bare_json() {
        let content = r#"{"emails": ["a@b.co"], "phones": ["+1 555 010 0000"]}"#;
        let enrichment = decode_enrichment(content);
        assert_eq!(enrichment.emails, vec!["a@b.co".to_string()]);
        assert_eq!(enrichment.phones.len(), 1);
    }

    #[test]
    fn test_decode_free_text_falls_back_to_patterns() {
        let content = "The most likely contact would be info@acme.com or call +1 (555) 010-0000.";
        let enrichment = decode_enrichment(content);
        assert_eq!(enrichment.emails, vec!["info@acme.com".to_string()]);
        assert!(!enrichment.phones.is_empty());
        assert_eq!(enrichment.confidence.as_deref(), Some("low"));
    }

    #[test]
    fn test_decode_garbage_is_empty() {
        let enrichment = decode_enrichment("no contact data listed anywhere");
        assert!(enrichment.emails.is_empty());
        assert!(enrichment.is_empty());
    }

    #[test]
    fn test_not_configured_without_plausible_key() {
        let http = Client::new();
        let absent = ModelClient::new(http.clone(), String::new(), String::new(), None);
        assert!(!absent.is_configured());
        let short = ModelClient::new(
            http.clone(),
            String::new(),
            String::new(),
            Some("short".to_string()),
        );
        assert!(!short.is_configured());
        let plausible = ModelClient::new(
            http,
            String::new(),
            String::new(),
            Some("sk-or-v1-abcdef123456".to_string()),
        );
        assert!(plausible.is_configured());
    }
}
