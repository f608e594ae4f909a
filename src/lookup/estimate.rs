use serde::{Deserialize, Serialize};

use super::LookupError;
use crate::core::ExtraCostKind;

/// Monthly cost estimates for one postal code. Fields the model leaves out
/// stay `None` and are not applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegionalEstimate {
    pub property_tax: Option<f64>,
    pub home_insurance: Option<f64>,
    pub hoa: Option<f64>,
    pub location: Option<String>,
}

impl RegionalEstimate {
    /// Extra-cost writes for the calculator, rounded to whole dollars.
    pub fn updates(&self) -> Vec<(ExtraCostKind, f64)> {
        [
            (ExtraCostKind::PropertyTax, self.property_tax),
            (ExtraCostKind::HomeInsurance, self.home_insurance),
            (ExtraCostKind::Hoa, self.hoa),
        ]
        .into_iter()
        .filter_map(|(kind, value)| value.map(|v| (kind, v.round())))
        .collect()
    }

    pub fn location_label(&self) -> &str {
        match self.location.as_deref().map(str::trim) {
            Some(location) if !location.is_empty() => location,
            _ => "this area",
        }
    }

    pub fn status_message(&self) -> String {
        format!("✓ Data loaded for {}", self.location_label())
    }
}

/// Parses the completion text, tolerating a Markdown code fence around it.
pub fn parse_estimate(content: &str) -> Result<RegionalEstimate, LookupError> {
    let cleaned = content
        .trim()
        .replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "");
    serde_json::from_str(cleaned.trim()).map_err(LookupError::Malformed)
}
