mod affordability;
mod amortization;
mod calculator;
mod display;
mod profile;
mod range;
mod solver;
mod types;

pub use affordability::{AffordabilityReport, ReferenceAmounts, RiskLevel};
pub use amortization::{PaymentBreakdown, compute_payment, compute_principal, monthly_rate};
pub use calculator::{Calculator, InputOutcome, Snapshot};
pub use display::{DisplayProjection, format_currency, format_grouped, format_percent};
pub use profile::{CAR_LOAN, CalculatorProfile, MORTGAGE, PriceBounds, RatioBasis};
pub use range::DragOutcome;
pub use solver::OptimizeOutcome;
pub use types::{
    CalculatorKind, Derived, ExtraCost, ExtraCostKind, ExtraCosts, InputField, Inputs,
    MAX_LOAN_TERM_MONTHS, Mode, parse_amount,
};
