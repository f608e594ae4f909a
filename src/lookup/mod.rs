//! Regional property-cost estimates from an OpenAI-compatible chat endpoint.

mod client;
mod estimate;

pub use client::{LookupConfig, RegionalCostClient};
pub use estimate::{RegionalEstimate, parse_estimate};

use thiserror::Error;

/// Errors that can occur while looking up regional costs.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Please enter a valid 5-digit zip code")]
    InvalidZip,

    #[error("API key not configured. Set OPENAI_API_KEY to enable regional lookups")]
    MissingCredential,

    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request failed: {0}")]
    Status(reqwest::StatusCode),

    #[error("API returned no completion")]
    EmptyCompletion,

    #[error("Failed to parse response data")]
    Malformed(#[source] serde_json::Error),
}

impl LookupError {
    /// Line shown under the lookup button. Input problems read as plain
    /// prompts; anything after the request went out is a failed lookup.
    pub fn status_message(&self) -> String {
        match self {
            LookupError::InvalidZip | LookupError::MissingCredential => self.to_string(),
            _ => format!("✗ Lookup failed: {self}"),
        }
    }
}

/// Exactly five ASCII digits, after trimming surrounding whitespace.
pub fn validate_zip_code(raw: &str) -> Result<&str, LookupError> {
    let zip = raw.trim();
    if zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit()) {
        Ok(zip)
    } else {
        Err(LookupError::InvalidZip)
    }
}
