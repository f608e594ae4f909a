#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentBreakdown {
    pub monthly_principal_interest: f64,
    pub total_interest: f64,
}

impl PaymentBreakdown {
    const ZERO: Self = Self {
        monthly_principal_interest: 0.0,
        total_interest: 0.0,
    };
}

pub fn monthly_rate(annual_interest_rate_percent: f64) -> f64 {
    annual_interest_rate_percent / 100.0 / 12.0
}

// 1 - (1 + r)^-n, computed without forming (1 + r)^n so that tiny rates and
// long terms stay finite.
fn discount_factor(monthly_rate: f64, n: f64) -> f64 {
    -(-n * monthly_rate.ln_1p()).exp_m1()
}

pub fn compute_payment(loan_amount: f64, monthly_rate: f64, term_months: u32) -> PaymentBreakdown {
    if loan_amount <= 0.0 || term_months == 0 {
        return PaymentBreakdown::ZERO;
    }
    let n = term_months as f64;

    if monthly_rate > 0.0 {
        let discount = discount_factor(monthly_rate, n);
        let payment = loan_amount * monthly_rate / discount;
        if discount > 0.0 && payment.is_finite() {
            return PaymentBreakdown {
                monthly_principal_interest: payment,
                total_interest: (payment * n - loan_amount).max(0.0),
            };
        }
    }
    PaymentBreakdown {
        monthly_principal_interest: loan_amount / n,
        total_interest: 0.0,
    }
}

/// Returns `None` when there is nothing to finance.
pub fn compute_principal(target_pi: f64, monthly_rate: f64, term_months: u32) -> Option<f64> {
    if target_pi.is_nan() || target_pi <= 0.0 || term_months == 0 {
        return None;
    }
    let n = term_months as f64;

    if monthly_rate > 0.0 {
        let loan_amount = target_pi * discount_factor(monthly_rate, n) / monthly_rate;
        if loan_amount.is_finite() && loan_amount > 0.0 {
            return Some(loan_amount);
        }
    }
    Some(target_pi * n)
}
