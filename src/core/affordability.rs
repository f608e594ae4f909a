use serde::Serialize;

use super::profile::{CalculatorProfile, RatioBasis};
use super::types::Derived;

#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Excellent,
    Good,
    Moderate,
    HighRisk,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Excellent => "Excellent",
            RiskLevel::Good => "Good",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::HighRisk => "High Risk",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            RiskLevel::Excellent => "excellent",
            RiskLevel::Good => "good",
            RiskLevel::Moderate => "moderate",
            RiskLevel::HighRisk => "high-risk",
        }
    }
}

/// Advice text with `{ratio}` and `{debt_ratio}` placeholders.
///
/// `over_back_end` replaces `within_limit` when the profile has a back-end
/// limit and the total debt ratio exceeds it.
#[derive(Debug, Clone, Copy)]
pub struct AdviceTemplate {
    pub within_limit: &'static str,
    pub over_back_end: Option<&'static str>,
}

/// One row of a tier table. Rows are evaluated in order; a ratio belongs to
/// the first row whose `upper_bound` it does not exceed.
#[derive(Debug, Clone, Copy)]
pub struct Tier {
    pub upper_bound: f64,
    pub level: RiskLevel,
    pub advice: AdviceTemplate,
}

#[derive(Debug, Clone, Copy)]
pub struct ReferenceFractions {
    pub conservative: f64,
    pub recommended: f64,
    pub risky: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceAmounts {
    pub conservative: f64,
    pub recommended: f64,
    pub risky: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityReport {
    pub ratio: f64,
    pub level: RiskLevel,
    pub status: &'static str,
    pub status_class: &'static str,
    pub advice: String,
    pub references: ReferenceAmounts,
    pub marker_position: f64,
}

pub fn ratio_of(amount: f64, monthly_income: f64) -> f64 {
    if monthly_income > 0.0 {
        amount / monthly_income * 100.0
    } else {
        0.0
    }
}

pub fn classify(tiers: &[Tier], ratio: f64) -> Option<&Tier> {
    tiers
        .iter()
        .find(|tier| ratio <= tier.upper_bound)
        .or_else(|| tiers.last())
}

pub fn render_advice(
    template: &AdviceTemplate,
    ratio: f64,
    debt_ratio: f64,
    back_end_limit: Option<f64>,
) -> String {
    let text = match (template.over_back_end, back_end_limit) {
        (Some(over), Some(limit)) if debt_ratio > limit => over,
        _ => template.within_limit,
    };
    text.replace("{ratio}", &format!("{ratio:.1}"))
        .replace("{debt_ratio}", &format!("{debt_ratio:.1}"))
}

pub fn reference_amounts(monthly_income: f64, fractions: ReferenceFractions) -> ReferenceAmounts {
    ReferenceAmounts {
        conservative: monthly_income * fractions.conservative,
        recommended: monthly_income * fractions.recommended,
        risky: monthly_income * fractions.risky,
    }
}

pub fn marker_position(ratio: f64, max_range_fraction: f64) -> f64 {
    let position = (ratio / 100.0) / max_range_fraction * 100.0;
    position.max(0.0).min(100.0)
}

pub fn evaluate(profile: &CalculatorProfile, derived: &Derived) -> AffordabilityReport {
    let ratio = match profile.ratio_basis {
        RatioBasis::DebtRatio => derived.debt_ratio,
        RatioBasis::PaymentRatio => derived.payment_ratio,
    };
    let (level, advice) = match classify(profile.tiers, ratio) {
        Some(tier) => (
            tier.level,
            render_advice(
                &tier.advice,
                ratio,
                derived.debt_ratio,
                profile.back_end_limit,
            ),
        ),
        None => (RiskLevel::Excellent, String::new()),
    };

    AffordabilityReport {
        ratio,
        level,
        status: level.label(),
        status_class: level.css_class(),
        advice,
        references: reference_amounts(derived.monthly_income, profile.references),
        marker_position: marker_position(ratio, profile.marker_range),
    }
}
