use serde::Serialize;
use tracing::debug;

use super::amortization::{compute_principal, monthly_rate};
use super::calculator::Calculator;
use super::types::{InputField, Mode};

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum OptimizeOutcome {
    Inactive,
    NothingToFinance { ideal_payment: f64 },
    PriceSolved { ideal_payment: f64, price: f64 },
    TargetSet { ideal_payment: f64 },
}

impl Calculator {
    pub fn is_optimizing(&self) -> bool {
        self.optimizing
    }

    /// Enabling runs the optimizer once immediately.
    pub fn set_optimize(&mut self, enabled: bool) -> OptimizeOutcome {
        self.optimizing = enabled;
        debug!(calculator = ?self.kind(), enabled, "optimizer toggled");
        self.run_optimizer()
    }

    /// Locks the optimizer's field without solving again.
    pub fn resume_optimizer(&mut self) {
        self.optimizing = true;
    }

    pub fn locked_field(&self) -> Option<InputField> {
        if !self.optimizing {
            return None;
        }
        Some(match self.mode {
            Mode::Payment => InputField::Price,
            Mode::Affordability => InputField::TargetPayment,
        })
    }

    pub fn ideal_payment(&self) -> f64 {
        let share = self.inputs.monthly_income() * self.profile.optimizer_fraction;
        (share - self.inputs.existing_monthly_debt).max(0.0)
    }

    pub(super) fn run_optimizer(&mut self) -> OptimizeOutcome {
        if !self.optimizing {
            return OptimizeOutcome::Inactive;
        }
        let ideal_payment = self.ideal_payment();

        let outcome = match self.mode {
            Mode::Payment => {
                let target_pi = ideal_payment - self.inputs.extra_costs.total();
                let rate = monthly_rate(self.inputs.annual_interest_rate_percent);
                match compute_principal(target_pi, rate, self.inputs.loan_term_months) {
                    Some(loan_amount) => {
                        self.write_price(loan_amount + self.inputs.down_payment);
                        OptimizeOutcome::PriceSolved {
                            ideal_payment,
                            price: self.inputs.price,
                        }
                    }
                    None => return OptimizeOutcome::NothingToFinance { ideal_payment },
                }
            }
            Mode::Affordability => {
                self.inputs.target_monthly_payment = ideal_payment;
                OptimizeOutcome::TargetSet { ideal_payment }
            }
        };
        self.recompute();
        outcome
    }
}
