use super::affordability::{AdviceTemplate, ReferenceFractions, RiskLevel, Tier};
use super::types::{CalculatorKind, ExtraCostKind, ExtraCosts, Inputs};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RatioBasis {
    DebtRatio,
    PaymentRatio,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

impl PriceBounds {
    pub fn clamp(self, price: f64) -> f64 {
        price.max(self.min).min(self.max)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PmiRule {
    pub annual_rate: f64,
    pub min_equity_percent: f64,
    /// A PMI value this close to the auto estimate is treated as auto-filled.
    pub clear_tolerance: f64,
}

impl PmiRule {
    pub fn estimate(&self, loan_amount: f64) -> f64 {
        (loan_amount.max(0.0) * self.annual_rate / 12.0).round()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileDefaults {
    pub price: f64,
    pub down_payment: f64,
    pub annual_interest_rate_percent: f64,
    pub loan_term_months: u32,
    pub target_monthly_payment: f64,
    pub annual_income: f64,
    pub existing_monthly_debt: f64,
    pub extra_costs: &'static [(ExtraCostKind, f64)],
}

#[derive(Debug)]
pub struct CalculatorProfile {
    pub kind: CalculatorKind,
    pub price_label: &'static str,
    pub price_bounds: PriceBounds,
    pub defaults: ProfileDefaults,
    pub ratio_basis: RatioBasis,
    pub tiers: &'static [Tier],
    pub back_end_limit: Option<f64>,
    pub references: ReferenceFractions,
    pub marker_range: f64,
    pub optimizer_fraction: f64,
    pub pmi: Option<PmiRule>,
}

impl CalculatorProfile {
    pub fn for_kind(kind: CalculatorKind) -> &'static CalculatorProfile {
        match kind {
            CalculatorKind::CarLoan => &CAR_LOAN,
            CalculatorKind::Mortgage => &MORTGAGE,
        }
    }

    pub fn default_inputs(&self) -> Inputs {
        let d = self.defaults;
        let mut inputs = Inputs {
            price: d.price,
            down_payment: d.down_payment,
            annual_interest_rate_percent: d.annual_interest_rate_percent,
            loan_term_months: d.loan_term_months,
            extra_costs: ExtraCosts::new(d.extra_costs),
            target_monthly_payment: d.target_monthly_payment,
            annual_income: d.annual_income,
            existing_monthly_debt: d.existing_monthly_debt,
        };
        inputs.normalize();
        inputs
    }

    pub fn extra_cost_kinds(&self) -> impl Iterator<Item = ExtraCostKind> {
        self.defaults.extra_costs.iter().map(|&(kind, _)| kind)
    }
}

const CAR_LOAN_TIERS: &[Tier] = &[
    Tier {
        upper_bound: 5.0,
        level: RiskLevel::Excellent,
        advice: AdviceTemplate {
            within_limit: "Excellent! Your car payments are {ratio}% of your income, well within the conservative 5% target. You have plenty of room for savings and other expenses.",
            over_back_end: None,
        },
    },
    Tier {
        upper_bound: 10.0,
        level: RiskLevel::Good,
        advice: AdviceTemplate {
            within_limit: "Good! At {ratio}% of gross monthly income, your car payments stay within the 10% guideline and leave adequate budget flexibility.",
            over_back_end: None,
        },
    },
    Tier {
        upper_bound: 15.0,
        level: RiskLevel::Moderate,
        advice: AdviceTemplate {
            within_limit: "Moderate. Your car payments take {ratio}% of your income, above the 10% guideline. Make sure enough is left for other expenses and emergency savings.",
            over_back_end: None,
        },
    },
    Tier {
        upper_bound: f64::INFINITY,
        level: RiskLevel::HighRisk,
        advice: AdviceTemplate {
            within_limit: "High Risk! Car payments of {ratio}% of your gross income far exceed the 10% guideline. Consider a less expensive vehicle, a larger down payment, or a longer loan term.",
            over_back_end: None,
        },
    },
];

const MORTGAGE_TIERS: &[Tier] = &[
    Tier {
        upper_bound: 15.0,
        level: RiskLevel::Excellent,
        advice: AdviceTemplate {
            within_limit: "Excellent! Your housing payment is very conservative at {ratio}% of your income, and total debt of {debt_ratio}% is well within the 36% guideline.",
            over_back_end: Some(
                "Excellent housing payment at {ratio}% of your income, but total debt of {debt_ratio}% exceeds the 36% guideline. Consider paying down other debts.",
            ),
        },
    },
    Tier {
        upper_bound: 30.0,
        level: RiskLevel::Good,
        advice: AdviceTemplate {
            within_limit: "Good! Your housing payment of {ratio}% is acceptable, and your total debt ratio of {debt_ratio}% is within the recommended 36% maximum.",
            over_back_end: Some(
                "Your housing payment of {ratio}% is good, but your total debt ratio of {debt_ratio}% exceeds the 36% guideline. Consider reducing other debts before taking on this mortgage.",
            ),
        },
    },
    Tier {
        upper_bound: 36.0,
        level: RiskLevel::Moderate,
        advice: AdviceTemplate {
            within_limit: "Moderate. Your housing payment of {ratio}% is elevated but manageable, with a total debt ratio of {debt_ratio}%. Keep a solid emergency fund.",
            over_back_end: Some(
                "Caution! Your housing payment of {ratio}% is elevated and your total debt ratio of {debt_ratio}% exceeds recommended limits. Consider a less expensive home or reducing existing debts.",
            ),
        },
    },
    Tier {
        upper_bound: f64::INFINITY,
        level: RiskLevel::HighRisk,
        advice: AdviceTemplate {
            within_limit: "High Risk! Your housing payment of {ratio}% is very high, with total debt at {debt_ratio}% of income. You may struggle to get approved at this ratio.",
            over_back_end: None,
        },
    },
];

pub static CAR_LOAN: CalculatorProfile = CalculatorProfile {
    kind: CalculatorKind::CarLoan,
    price_label: "Car Price",
    price_bounds: PriceBounds {
        min: 5_000.0,
        max: 200_000.0,
    },
    defaults: ProfileDefaults {
        price: 25_000.0,
        down_payment: 5_000.0,
        annual_interest_rate_percent: 6.5,
        loan_term_months: 60,
        target_monthly_payment: 400.0,
        annual_income: 0.0,
        existing_monthly_debt: 0.0,
        extra_costs: &[],
    },
    ratio_basis: RatioBasis::DebtRatio,
    tiers: CAR_LOAN_TIERS,
    back_end_limit: None,
    references: ReferenceFractions {
        conservative: 0.05,
        recommended: 0.10,
        risky: 0.15,
    },
    marker_range: 0.15,
    optimizer_fraction: 0.07,
    pmi: None,
};

pub static MORTGAGE: CalculatorProfile = CalculatorProfile {
    kind: CalculatorKind::Mortgage,
    price_label: "Home Price",
    price_bounds: PriceBounds {
        min: 50_000.0,
        max: 2_000_000.0,
    },
    defaults: ProfileDefaults {
        price: 350_000.0,
        down_payment: 70_000.0,
        annual_interest_rate_percent: 7.0,
        loan_term_months: 360,
        target_monthly_payment: 2_000.0,
        annual_income: 0.0,
        existing_monthly_debt: 0.0,
        extra_costs: &[
            (ExtraCostKind::PropertyTax, 350.0),
            (ExtraCostKind::HomeInsurance, 150.0),
            (ExtraCostKind::Hoa, 0.0),
            (ExtraCostKind::Pmi, 0.0),
        ],
    },
    ratio_basis: RatioBasis::PaymentRatio,
    tiers: MORTGAGE_TIERS,
    back_end_limit: Some(36.0),
    references: ReferenceFractions {
        conservative: 0.25,
        recommended: 0.28,
        risky: 0.36,
    },
    marker_range: 0.50,
    optimizer_fraction: 0.28,
    pmi: Some(PmiRule {
        annual_rate: 0.005,
        min_equity_percent: 20.0,
        clear_tolerance: 5.0,
    }),
};
