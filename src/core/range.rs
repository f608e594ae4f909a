use serde::Serialize;
use tracing::trace;

use super::amortization::{compute_principal, monthly_rate};
use super::calculator::Calculator;
use super::profile::RatioBasis;
use super::types::Mode;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DragGesture {
    held_position: Option<f64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum DragOutcome {
    Applied { ratio: f64, price: f64 },
    NotDragging,
    NoIncome,
    NothingToFinance { ratio: f64 },
}

impl Calculator {
    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    /// Held during a drag, otherwise projected from the current ratio.
    pub fn marker_position(&self) -> f64 {
        self.gesture
            .and_then(|g| g.held_position)
            .unwrap_or(self.report.marker_position)
    }

    pub fn begin_drag(&mut self) {
        self.gesture = Some(DragGesture::default());
    }

    pub fn end_drag(&mut self) {
        self.gesture = None;
    }

    /// `fraction` is the pointer position across the bar, 0.0 to 1.0.
    pub fn drag_to(&mut self, fraction: f64) -> DragOutcome {
        if self.gesture.is_none() {
            return DragOutcome::NotDragging;
        }
        let monthly_income = self.inputs.monthly_income();
        if monthly_income <= 0.0 {
            return DragOutcome::NoIncome;
        }

        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.gesture = Some(DragGesture {
            held_position: Some(fraction * 100.0),
        });
        let ratio = fraction * self.profile.marker_range;
        let mut payment = monthly_income * ratio;
        if self.profile.ratio_basis == RatioBasis::DebtRatio {
            payment -= self.inputs.existing_monthly_debt;
        }
        let target_pi = payment - self.inputs.extra_costs.total();

        let rate = monthly_rate(self.inputs.annual_interest_rate_percent);
        let Some(loan_amount) = compute_principal(target_pi, rate, self.inputs.loan_term_months)
        else {
            trace!(ratio, target_pi, "drag position leaves nothing to finance");
            return DragOutcome::NothingToFinance {
                ratio: ratio * 100.0,
            };
        };

        match self.mode {
            Mode::Payment => self.write_price(loan_amount + self.inputs.down_payment),
            Mode::Affordability => self.inputs.target_monthly_payment = payment,
        }
        self.recompute();

        DragOutcome::Applied {
            ratio: ratio * 100.0,
            price: self.inputs.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CalculatorKind, InputField};
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn car_with_income(income: f64) -> Calculator {
        let mut calc = Calculator::new(CalculatorKind::CarLoan);
        calc.set_input(InputField::AnnualIncome, income);
        calc
    }

    #[test]
    fn drag_is_ignored_outside_a_gesture() {
        let mut calc = car_with_income(120_000.0);
        assert_eq!(calc.drag_to(0.5), DragOutcome::NotDragging);
        assert_eq!(calc.inputs().price, 25_000.0);
    }

    #[test]
    fn drag_without_income_is_a_no_op() {
        let mut calc = Calculator::new(CalculatorKind::CarLoan);
        calc.begin_drag();
        assert_eq!(calc.drag_to(0.5), DragOutcome::NoIncome);
        assert_eq!(calc.inputs().price, 25_000.0);
    }

    #[test]
    fn car_drag_solves_price_net_of_existing_debt() {
        let mut calc = car_with_income(120_000.0);
        calc.set_input(InputField::ExistingDebt, 200.0);
        calc.begin_drag();

        // Half of a 15% bar: 7.5% of 10,000 is 750, less 200 of existing debt.
        let outcome = calc.drag_to(0.5);
        assert!(matches!(outcome, DragOutcome::Applied { .. }));
        assert_approx_tol(calc.derived().monthly_principal_interest, 550.0, 1e-6);
        assert_approx_tol(calc.report().ratio, 7.5, 1e-6);
        assert_eq!(calc.marker_position(), 50.0);
    }

    #[test]
    fn mortgage_drag_subtracts_extra_costs() {
        let mut calc = Calculator::new(CalculatorKind::Mortgage);
        calc.set_input(InputField::AnnualIncome, 120_000.0);
        calc.set_input(InputField::DownPayment, 120_000.0);
        calc.begin_drag();

        // 30% of 10,000 is 3,000 total, of which 500 goes to tax and insurance.
        calc.drag_to(0.6);
        assert_approx_tol(calc.derived().monthly_principal_interest, 2_500.0, 1e-6);
        assert_approx_tol(calc.derived().total_monthly_payment, 3_000.0, 1e-6);
    }

    #[test]
    fn drag_in_affordability_mode_sets_target_payment() {
        let mut calc = car_with_income(120_000.0);
        calc.switch_mode(Mode::Affordability);
        calc.begin_drag();

        calc.drag_to(0.4);
        assert_approx_tol(calc.inputs().target_monthly_payment, 600.0, 1e-9);
        assert_approx_tol(calc.derived().monthly_principal_interest, 600.0, 1e-6);
    }

    #[test]
    fn drag_to_zero_leaves_state_alone() {
        let mut calc = car_with_income(120_000.0);
        calc.begin_drag();
        calc.drag_to(0.5);
        let before = calc.snapshot();

        assert!(matches!(
            calc.drag_to(0.0),
            DragOutcome::NothingToFinance { .. }
        ));
        assert_eq!(calc.inputs(), &before.inputs);
        assert_eq!(calc.marker_position(), 0.0);
    }

    #[test]
    fn marker_follows_the_projection_after_release() {
        let mut calc = car_with_income(400_000.0);
        calc.begin_drag();
        calc.drag_to(0.9);
        // Clamped to the price ceiling, so the real ratio sits below the pointer.
        assert_eq!(calc.inputs().price, 200_000.0);
        assert_approx_tol(calc.marker_position(), 90.0, 1e-9);
        assert!(calc.report().marker_position < 90.0);

        calc.end_drag();
        assert!(!calc.is_dragging());
        assert_eq!(calc.marker_position(), calc.report().marker_position);
    }

    #[test]
    fn drag_is_allowed_while_optimizing() {
        let mut calc = car_with_income(120_000.0);
        calc.set_optimize(true);
        calc.begin_drag();

        assert!(matches!(calc.drag_to(0.2), DragOutcome::Applied { .. }));
        assert_approx_tol(calc.derived().monthly_principal_interest, 300.0, 1e-6);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_further_drag_never_lowers_price(
            a in 0.05f64..1.0,
            b in 0.05f64..1.0,
            income in 20_000u32..400_000
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let mut calc = car_with_income(income as f64);
            calc.begin_drag();
            calc.drag_to(lo);
            let price_lo = calc.inputs().price;
            calc.drag_to(hi);
            prop_assert!(calc.inputs().price >= price_lo);
        }
    }
}
