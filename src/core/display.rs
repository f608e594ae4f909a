use serde::Serialize;

use super::calculator::Snapshot;
use super::profile::CalculatorProfile;
use super::types::{ExtraCostKind, Mode};

/// `$1,234.56`; negatives render as `-$1,234.56`.
pub fn format_currency(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{sign}${}.{:02}",
        group_thousands(cents / 100),
        cents % 100
    )
}

pub fn format_grouped(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let whole = value.abs().round() as u64;
    let sign = if value < 0.0 && whole > 0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(whole))
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    while n >= 1_000 {
        groups.push(format!("{:03}", n % 1_000));
        n /= 1_000;
    }
    groups.push(n.to_string());
    groups.reverse();
    groups.join(",")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraCostLine {
    pub kind: ExtraCostKind,
    pub label: &'static str,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayProjection {
    pub main_result_label: String,
    pub main_result_value: String,
    pub price_label: &'static str,
    pub price: String,
    pub down_payment: String,
    pub down_payment_percent: String,
    pub target_monthly_payment: String,
    pub loan_amount: String,
    pub monthly_principal_interest: String,
    pub extra_costs: Vec<ExtraCostLine>,
    pub total_monthly_payment: String,
    pub total_interest: String,
    pub total_amount: String,
    pub monthly_income: String,
    pub payment_ratio: String,
    pub debt_ratio: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub advice: String,
    pub conservative: String,
    pub recommended: String,
    pub risky: String,
    pub marker_position: f64,
    pub ideal_payment: Option<String>,
}

impl DisplayProjection {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let profile = CalculatorProfile::for_kind(snapshot.calculator);
        let inputs = &snapshot.inputs;
        let derived = &snapshot.derived;
        let report = &snapshot.affordability;

        let (main_result_label, main_result_value) = match snapshot.mode {
            Mode::Payment => (
                "Monthly Payment".to_string(),
                format_currency(derived.total_monthly_payment),
            ),
            Mode::Affordability => (
                format!("Affordable {}", profile.price_label),
                format_currency(inputs.price),
            ),
        };

        Self {
            main_result_label,
            main_result_value,
            price_label: profile.price_label,
            price: format_grouped(inputs.price),
            down_payment: format_grouped(inputs.down_payment),
            down_payment_percent: format_percent(derived.down_payment_percent),
            target_monthly_payment: format_grouped(inputs.target_monthly_payment),
            loan_amount: format_currency(derived.loan_amount),
            monthly_principal_interest: format_currency(derived.monthly_principal_interest),
            extra_costs: inputs
                .extra_costs
                .iter()
                .map(|cost| ExtraCostLine {
                    kind: cost.kind,
                    label: cost.kind.label(),
                    amount: format_grouped(cost.amount),
                })
                .collect(),
            total_monthly_payment: format_currency(derived.total_monthly_payment),
            total_interest: format_currency(derived.total_interest),
            total_amount: format_currency(derived.total_amount),
            monthly_income: format_currency(derived.monthly_income),
            payment_ratio: format_percent(derived.payment_ratio),
            debt_ratio: format_percent(derived.debt_ratio),
            status: report.status,
            status_class: report.status_class,
            advice: report.advice.clone(),
            conservative: format_currency(report.references.conservative),
            recommended: format_currency(report.references.recommended),
            risky: format_currency(report.references.risky),
            marker_position: snapshot.marker_position,
            ideal_payment: snapshot.ideal_payment.map(format_currency),
        }
    }
}
