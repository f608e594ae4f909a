use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculatorKind {
    CarLoan,
    Mortgage,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Payment,
    Affordability,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtraCostKind {
    PropertyTax,
    HomeInsurance,
    Hoa,
    Pmi,
}

impl ExtraCostKind {
    pub fn label(self) -> &'static str {
        match self {
            ExtraCostKind::PropertyTax => "Property tax",
            ExtraCostKind::HomeInsurance => "Home insurance",
            ExtraCostKind::Hoa => "HOA",
            ExtraCostKind::Pmi => "PMI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraCost {
    pub kind: ExtraCostKind,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExtraCosts(Vec<ExtraCost>);

impl ExtraCosts {
    pub fn new(items: &[(ExtraCostKind, f64)]) -> Self {
        Self(
            items
                .iter()
                .map(|&(kind, amount)| ExtraCost {
                    kind,
                    amount: sanitize_amount(amount),
                })
                .collect(),
        )
    }

    pub fn get(&self, kind: ExtraCostKind) -> Option<f64> {
        self.0.iter().find(|c| c.kind == kind).map(|c| c.amount)
    }

    /// Returns false when `kind` is not part of this list.
    pub fn set(&mut self, kind: ExtraCostKind, amount: f64) -> bool {
        match self.0.iter_mut().find(|c| c.kind == kind) {
            Some(cost) => {
                cost.amount = sanitize_amount(amount);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, kind: ExtraCostKind) -> bool {
        self.0.iter().any(|c| c.kind == kind)
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|c| c.amount).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtraCost> {
        self.0.iter()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputField {
    Price,
    DownPayment,
    InterestRate,
    LoanTerm,
    TargetPayment,
    AnnualIncome,
    ExistingDebt,
    ExtraCost(ExtraCostKind),
}

impl InputField {
    /// Fields whose change re-runs the optimizer while it is active.
    pub fn affects_optimizer(self) -> bool {
        !matches!(self, InputField::Price | InputField::TargetPayment)
    }
}

pub const MAX_LOAN_TERM_MONTHS: u32 = 600;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inputs {
    pub price: f64,
    pub down_payment: f64,
    pub annual_interest_rate_percent: f64,
    pub loan_term_months: u32,
    pub extra_costs: ExtraCosts,
    pub target_monthly_payment: f64,
    pub annual_income: f64,
    pub existing_monthly_debt: f64,
}

impl Inputs {
    pub fn normalize(&mut self) {
        self.price = sanitize_amount(self.price);
        self.down_payment = sanitize_amount(self.down_payment).min(self.price);
        self.annual_interest_rate_percent = sanitize_amount(self.annual_interest_rate_percent);
        self.loan_term_months = self.loan_term_months.clamp(1, MAX_LOAN_TERM_MONTHS);
        self.target_monthly_payment = sanitize_amount(self.target_monthly_payment);
        self.annual_income = sanitize_amount(self.annual_income);
        self.existing_monthly_debt = sanitize_amount(self.existing_monthly_debt);
    }

    pub fn loan_amount(&self) -> f64 {
        self.price - self.down_payment
    }

    pub fn monthly_income(&self) -> f64 {
        self.annual_income / 12.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    pub loan_amount: f64,
    pub monthly_rate: f64,
    pub monthly_principal_interest: f64,
    pub extra_costs_total: f64,
    pub total_monthly_payment: f64,
    pub total_interest: f64,
    pub total_amount: f64,
    pub down_payment_percent: f64,
    pub monthly_income: f64,
    pub payment_ratio: f64,
    pub debt_ratio: f64,
}

pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parses user text the way a form field would: the longest leading decimal
/// number wins, and anything unparseable reads as zero.
pub fn parse_amount(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;

    while end < bytes.len() {
        let b = bytes[end];
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'+' | b'-' if end == 0 => {}
            b'+' | b'-' if seen_exp && matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => seen_exp = true,
            _ => break,
        }
        end += 1;
    }

    let mut candidate = &text[..end];
    while !candidate.is_empty() {
        if let Ok(value) = candidate.parse::<f64>() {
            return sanitize_amount(value);
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    0.0
}
