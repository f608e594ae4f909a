use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    Calculator, CalculatorKind, CalculatorProfile, DisplayProjection, DragOutcome, ExtraCostKind,
    Mode, OptimizeOutcome, Snapshot,
};
use crate::lookup::LookupError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CliCalculator {
    CarLoan,
    Mortgage,
}

impl From<CliCalculator> for CalculatorKind {
    fn from(value: CliCalculator) -> Self {
        match value {
            CliCalculator::CarLoan => CalculatorKind::CarLoan,
            CliCalculator::Mortgage => CalculatorKind::Mortgage,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CliMode {
    Payment,
    Affordability,
}

impl From<CliMode> for Mode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::Payment => Mode::Payment,
            CliMode::Affordability => Mode::Affordability,
        }
    }
}

/// One calculation request. Absent fields keep the calculator's defaults.
#[derive(Debug, Default, Clone, Deserialize, Args)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculatePayload {
    /// Which quantity is solved for
    #[arg(long, value_enum)]
    pub mode: Option<CliMode>,
    #[arg(long)]
    pub price: Option<f64>,
    #[arg(long)]
    pub down_payment: Option<f64>,
    /// Annual interest rate in percent
    #[arg(long)]
    pub interest_rate: Option<f64>,
    /// Loan term in months
    #[arg(long)]
    pub loan_term: Option<u32>,
    /// Target total monthly payment (affordability mode)
    #[arg(long)]
    pub target_payment: Option<f64>,
    #[arg(long)]
    pub annual_income: Option<f64>,
    /// Existing monthly debt payments
    #[arg(long)]
    pub existing_debt: Option<f64>,
    #[arg(long)]
    pub property_tax: Option<f64>,
    #[arg(long)]
    pub home_insurance: Option<f64>,
    #[arg(long)]
    pub hoa: Option<f64>,
    #[arg(long)]
    pub pmi: Option<f64>,
    /// Size the price (or target payment) from income
    #[arg(long)]
    pub optimize: bool,
    /// Keep the optimizer's lock on the submitted values without re-solving
    #[arg(long, conflicts_with = "optimize")]
    pub optimizer_locked: bool,
    /// Simulated marker drag, 0.0 to 1.0 across the affordability bar
    #[arg(long)]
    pub drag_fraction: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub display: DisplayProjection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizeOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drag: Option<DragOutcome>,
}

impl CalculateResponse {
    pub fn of(calc: &Calculator) -> Self {
        let snapshot = calc.snapshot();
        let display = DisplayProjection::from_snapshot(&snapshot);
        Self {
            snapshot,
            display,
            optimizer: None,
            drag: None,
        }
    }
}

/// Errors returned by the HTTP and CLI calculation surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{field} {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    #[error("{field} is not an input of the {calculator} calculator")]
    UnsupportedField {
        field: &'static str,
        calculator: &'static str,
    },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl ApiError {
    pub fn message(&self) -> String {
        match self {
            ApiError::Lookup(err) => err.status_message(),
            _ => self.to_string(),
        }
    }
}

fn check_amount(field: &'static str, value: Option<f64>) -> Result<Option<f64>, ApiError> {
    match value {
        Some(v) if !v.is_finite() => Err(ApiError::InvalidField {
            field,
            reason: "must be a finite number",
        }),
        Some(v) if v < 0.0 => Err(ApiError::InvalidField {
            field,
            reason: "must be non-negative",
        }),
        other => Ok(other),
    }
}

fn calculator_name(kind: CalculatorKind) -> &'static str {
    match kind {
        CalculatorKind::CarLoan => "car-loan",
        CalculatorKind::Mortgage => "mortgage",
    }
}

/// Builds a calculator from the profile defaults with the payload laid over
/// them, then applies the optimizer and drag requests in that order.
pub fn calculate(
    kind: CalculatorKind,
    payload: &CalculatePayload,
) -> Result<(Calculator, CalculateResponse), ApiError> {
    let profile = CalculatorProfile::for_kind(kind);
    let mut inputs = profile.default_inputs();

    if let Some(v) = check_amount("price", payload.price)? {
        inputs.price = v;
    }
    if let Some(v) = check_amount("downPayment", payload.down_payment)? {
        inputs.down_payment = v;
    }
    if let Some(v) = check_amount("interestRate", payload.interest_rate)? {
        inputs.annual_interest_rate_percent = v;
    }
    if let Some(v) = payload.loan_term {
        if v == 0 {
            return Err(ApiError::InvalidField {
                field: "loanTerm",
                reason: "must be at least one month",
            });
        }
        inputs.loan_term_months = v;
    }
    if let Some(v) = check_amount("targetPayment", payload.target_payment)? {
        inputs.target_monthly_payment = v;
    }
    if let Some(v) = check_amount("annualIncome", payload.annual_income)? {
        inputs.annual_income = v;
    }
    if let Some(v) = check_amount("existingDebt", payload.existing_debt)? {
        inputs.existing_monthly_debt = v;
    }

    let extras = [
        ("propertyTax", ExtraCostKind::PropertyTax, payload.property_tax),
        ("homeInsurance", ExtraCostKind::HomeInsurance, payload.home_insurance),
        ("hoa", ExtraCostKind::Hoa, payload.hoa),
        ("pmi", ExtraCostKind::Pmi, payload.pmi),
    ];
    for (field, extra, value) in extras {
        if let Some(v) = check_amount(field, value)? {
            if !inputs.extra_costs.set(extra, v) {
                return Err(ApiError::UnsupportedField {
                    field,
                    calculator: calculator_name(kind),
                });
            }
        }
    }

    let drag_fraction = match payload.drag_fraction {
        Some(f) if !(0.0..=1.0).contains(&f) => {
            return Err(ApiError::InvalidField {
                field: "dragFraction",
                reason: "must be between 0 and 1",
            });
        }
        other => other,
    };

    let mode = payload.mode.map(Mode::from).unwrap_or_default();
    let mut calc = Calculator::with_inputs(kind, inputs, mode);

    let optimizer = if payload.optimize {
        Some(calc.set_optimize(true))
    } else if payload.optimizer_locked {
        calc.resume_optimizer();
        None
    } else {
        None
    };
    let drag = drag_fraction.map(|fraction| {
        calc.begin_drag();
        calc.drag_to(fraction)
    });

    let mut response = CalculateResponse::of(&calc);
    response.optimizer = optimizer;
    response.drag = drag;
    Ok((calc, response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InputField;

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn payload_from_json(json: &str) -> CalculatePayload {
        serde_json::from_str(json).expect("valid payload json")
    }

    #[test]
    fn empty_payload_uses_profile_defaults() {
        let (calc, response) =
            calculate(CalculatorKind::CarLoan, &CalculatePayload::default()).expect("defaults");
        assert_eq!(calc.inputs().price, 25_000.0);
        assert_eq!(response.snapshot.mode, Mode::Payment);
        assert!(response.optimizer.is_none());
        assert!(response.drag.is_none());
    }

    #[test]
    fn payload_parses_web_keys() {
        let payload = payload_from_json(
            r#"{"mode":"affordability","targetPayment":2000,"downPayment":70000,
                "interestRate":7,"loanTerm":360,"annualIncome":120000,"optimize":false}"#,
        );
        assert_eq!(payload.mode, Some(CliMode::Affordability));
        assert_eq!(payload.loan_term, Some(360));

        let (calc, response) = calculate(CalculatorKind::Mortgage, &payload).expect("valid");
        assert_approx_tol(calc.inputs().price, 295_461.35, 0.01);
        assert_eq!(response.display.main_result_label, "Affordable Home Price");
    }

    #[test]
    fn car_loan_rejects_housing_extras() {
        let payload = payload_from_json(r#"{"propertyTax": 300}"#);
        let err = calculate(CalculatorKind::CarLoan, &payload).expect_err("car has no tax");
        assert_eq!(
            err.message(),
            "propertyTax is not an input of the car-loan calculator"
        );
    }

    #[test]
    fn rejects_negative_amounts_and_zero_term() {
        let err = calculate(CalculatorKind::Mortgage, &payload_from_json(r#"{"price": -1}"#))
            .expect_err("negative price");
        assert_eq!(err.message(), "price must be non-negative");

        let err = calculate(CalculatorKind::Mortgage, &payload_from_json(r#"{"loanTerm": 0}"#))
            .expect_err("zero term");
        assert!(err.message().starts_with("loanTerm"));

        let err = calculate(
            CalculatorKind::Mortgage,
            &payload_from_json(r#"{"dragFraction": 1.5}"#),
        )
        .expect_err("drag off the bar");
        assert!(err.message().starts_with("dragFraction"));
    }

    #[test]
    fn optimize_then_drag_are_both_reported() {
        let payload = payload_from_json(r#"{"annualIncome": 120000, "optimize": true, "dragFraction": 0.5}"#);
        let (calc, response) = calculate(CalculatorKind::CarLoan, &payload).expect("valid");

        assert!(matches!(
            response.optimizer,
            Some(OptimizeOutcome::PriceSolved { .. })
        ));
        assert!(matches!(response.drag, Some(DragOutcome::Applied { .. })));
        assert!(response.snapshot.dragging);
        assert_eq!(response.snapshot.locked_field, Some(InputField::Price));
        assert_approx_tol(calc.derived().monthly_principal_interest, 750.0, 1e-6);
    }

    #[test]
    fn locked_request_keeps_the_dragged_price() {
        let dragged = payload_from_json(
            r#"{"annualIncome": 120000, "optimize": true, "dragFraction": 0.9}"#,
        );
        let (during, _) = calculate(CalculatorKind::CarLoan, &dragged).expect("valid");
        let price = during.inputs().price;

        let release = CalculatePayload {
            annual_income: Some(120_000.0),
            price: Some(price),
            optimizer_locked: true,
            ..CalculatePayload::default()
        };
        let (after, response) = calculate(CalculatorKind::CarLoan, &release).expect("valid");

        assert_approx_tol(after.inputs().price, price, 1e-9);
        assert_approx_tol(after.derived().monthly_principal_interest, 1_350.0, 1e-6);
        assert_eq!(response.snapshot.locked_field, Some(InputField::Price));
        assert!(response.optimizer.is_none());
        assert!(!response.snapshot.dragging);
    }

    #[test]
    fn response_flattens_the_snapshot() {
        let (_, response) =
            calculate(CalculatorKind::Mortgage, &CalculatePayload::default()).expect("defaults");
        let json = serde_json::to_value(&response).expect("serializes");

        assert_eq!(json["calculator"], "mortgage");
        assert_eq!(json["mode"], "payment");
        assert_eq!(json["inputs"]["loanTermMonths"], 360);
        assert_eq!(json["inputs"]["extraCosts"][0]["kind"], "propertyTax");
        assert_eq!(json["affordability"]["level"], "excellent");
        assert!(json.get("optimizer").is_none());
    }
}
