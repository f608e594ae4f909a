use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{LookupError, RegionalEstimate, parse_estimate, validate_zip_code};

const SYSTEM_PROMPT: &str = "You are a real estate data assistant. Provide realistic estimates for property-related costs in the given zip code. Return ONLY a JSON object with no additional text or markdown formatting.";

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            temperature: 0.3,
            max_tokens: 200,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
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
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegionalCostClient {
    client: Client,
    api_key: String,
    config: LookupConfig,
}

impl RegionalCostClient {
    pub fn new(config: LookupConfig) -> Result<Self, LookupError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(LookupError::MissingCredential)?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub async fn estimate(
        &self,
        zip_code: &str,
        home_price: f64,
    ) -> Result<RegionalEstimate, LookupError> {
        let zip_code = validate_zip_code(zip_code)?;
        debug!(zip_code, home_price, model = %self.config.model, "requesting regional costs");

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(zip_code, home_price),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "regional cost lookup rejected");
            return Err(LookupError::Status(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LookupError::EmptyCompletion)?;

        parse_estimate(&content)
    }
}

fn user_prompt(zip_code: &str, home_price: f64) -> String {
    format!(
        "For zip code {zip_code} and a home price of ${home_price}, provide realistic monthly estimates for:
- Property tax (monthly)
- Home insurance (monthly)
- HOA fees (monthly, if applicable in the area)

Return ONLY a JSON object in this exact format with no additional text:
{{
  \"propertyTax\": <number>,
  \"homeInsurance\": <number>,
  \"hoa\": <number>,
  \"location\": \"<city, state>\"
}}"
    )
}
