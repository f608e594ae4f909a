use std::ops::{Deref, DerefMut};

use serde::Serialize;
use tracing::{debug, trace};

use super::affordability::{AffordabilityReport, evaluate, ratio_of};
use super::amortization::{compute_payment, compute_principal, monthly_rate};
use super::profile::CalculatorProfile;
use super::range::DragGesture;
use super::types::{
    CalculatorKind, Derived, ExtraCostKind, InputField, Inputs, Mode, parse_amount,
    sanitize_amount,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InputOutcome {
    Applied,
    Derived,
    Locked,
    NotApplicable,
    /// A recompute is in progress; the event is dropped.
    Busy,
}

#[derive(Debug, Clone)]
pub struct Calculator {
    pub(super) profile: &'static CalculatorProfile,
    pub(super) inputs: Inputs,
    pub(super) derived: Derived,
    pub(super) report: AffordabilityReport,
    pub(super) mode: Mode,
    pub(super) optimizing: bool,
    pub(super) gesture: Option<DragGesture>,
    updating: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub calculator: CalculatorKind,
    pub mode: Mode,
    pub inputs: Inputs,
    pub derived: Derived,
    pub affordability: AffordabilityReport,
    pub marker_position: f64,
    pub dragging: bool,
    pub optimizing: bool,
    pub ideal_payment: Option<f64>,
    pub locked_field: Option<InputField>,
}

/// Holds the `updating` flag for one recompute and clears it on drop.
pub(super) struct UpdateScope<'a> {
    calculator: &'a mut Calculator,
}

impl Deref for UpdateScope<'_> {
    type Target = Calculator;

    fn deref(&self) -> &Calculator {
        self.calculator
    }
}

impl DerefMut for UpdateScope<'_> {
    fn deref_mut(&mut self) -> &mut Calculator {
        self.calculator
    }
}

impl Drop for UpdateScope<'_> {
    fn drop(&mut self) {
        self.calculator.updating = false;
    }
}

impl Calculator {
    pub fn new(kind: CalculatorKind) -> Self {
        let profile = CalculatorProfile::for_kind(kind);
        Self::with_inputs(kind, profile.default_inputs(), Mode::Payment)
    }

    pub fn with_inputs(kind: CalculatorKind, mut inputs: Inputs, mode: Mode) -> Self {
        let profile = CalculatorProfile::for_kind(kind);
        inputs.normalize();
        let mut calculator = Self {
            profile,
            inputs,
            derived: Derived::default(),
            report: evaluate(profile, &Derived::default()),
            mode,
            optimizing: false,
            gesture: None,
            updating: false,
        };
        calculator.recompute();
        calculator
    }

    pub fn kind(&self) -> CalculatorKind {
        self.profile.kind
    }

    pub fn profile(&self) -> &'static CalculatorProfile {
        self.profile
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    pub fn report(&self) -> &AffordabilityReport {
        &self.report
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn dependent_field(&self) -> InputField {
        match self.mode {
            Mode::Payment => InputField::TargetPayment,
            Mode::Affordability => InputField::Price,
        }
    }

    pub fn set_input(&mut self, field: InputField, value: f64) -> InputOutcome {
        if self.updating {
            return InputOutcome::Busy;
        }
        if field == self.dependent_field() {
            return InputOutcome::Derived;
        }
        if self.locked_field() == Some(field) {
            return InputOutcome::Locked;
        }

        let value = sanitize_amount(value);
        match field {
            InputField::Price => self.inputs.price = value,
            InputField::DownPayment => self.inputs.down_payment = value,
            InputField::InterestRate => self.inputs.annual_interest_rate_percent = value,
            InputField::LoanTerm => self.inputs.loan_term_months = value.round() as u32,
            InputField::TargetPayment => self.inputs.target_monthly_payment = value,
            InputField::AnnualIncome => self.inputs.annual_income = value,
            InputField::ExistingDebt => self.inputs.existing_monthly_debt = value,
            InputField::ExtraCost(kind) => {
                if !self.inputs.extra_costs.set(kind, value) {
                    return InputOutcome::NotApplicable;
                }
            }
        }
        self.inputs.normalize();
        trace!(?field, value, "input changed");

        self.recompute();
        if field.affects_optimizer() {
            self.run_optimizer();
        }
        InputOutcome::Applied
    }

    pub fn set_input_text(&mut self, field: InputField, text: &str) -> InputOutcome {
        self.set_input(field, parse_amount(text))
    }

    pub fn switch_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!(calculator = ?self.kind(), from = ?self.mode, to = ?mode, "mode switch");
        }
        self.mode = mode;
        self.recompute();
        self.run_optimizer();
    }

    /// Overwrites extra-cost line items and recomputes. Kinds this calculator
    /// does not carry are skipped; returns how many were written.
    pub fn apply_extra_costs(&mut self, updates: &[(ExtraCostKind, f64)]) -> usize {
        if self.updating {
            return 0;
        }
        let applied = updates
            .iter()
            .filter(|&&(kind, amount)| self.inputs.extra_costs.set(kind, amount))
            .count();
        debug!(calculator = ?self.kind(), applied, "extra costs replaced");

        self.recompute();
        self.run_optimizer();
        applied
    }

    pub fn recompute(&mut self) {
        match self.begin_update() {
            Some(mut scope) => scope.run_pipeline(),
            None => trace!("recompute skipped while an update is in progress"),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            calculator: self.kind(),
            mode: self.mode,
            inputs: self.inputs.clone(),
            derived: self.derived.clone(),
            affordability: self.report.clone(),
            marker_position: self.marker_position(),
            dragging: self.is_dragging(),
            optimizing: self.optimizing,
            ideal_payment: self.optimizing.then(|| self.ideal_payment()),
            locked_field: self.locked_field(),
        }
    }

    pub(super) fn begin_update(&mut self) -> Option<UpdateScope<'_>> {
        if self.updating {
            return None;
        }
        self.updating = true;
        Some(UpdateScope { calculator: self })
    }

    pub(super) fn write_price(&mut self, price: f64) {
        self.inputs.price = self.profile.price_bounds.clamp(price);
        self.inputs.normalize();
    }

    fn run_pipeline(&mut self) {
        match self.mode {
            Mode::Payment => self.apply_pmi_rule(),
            Mode::Affordability => self.solve_price_from_target(),
        }
        self.derived = derive(&self.inputs);
        self.report = evaluate(self.profile, &self.derived);
    }

    fn solve_price_from_target(&mut self) {
        let target_pi = self.inputs.target_monthly_payment - self.inputs.extra_costs.total();
        let rate = monthly_rate(self.inputs.annual_interest_rate_percent);
        match compute_principal(target_pi, rate, self.inputs.loan_term_months) {
            Some(loan_amount) => self.write_price(loan_amount + self.inputs.down_payment),
            None => trace!(target_pi, "target payment does not cover extra costs; price kept"),
        }
    }

    fn apply_pmi_rule(&mut self) {
        let Some(rule) = self.profile.pmi else {
            return;
        };
        let Some(current) = self.inputs.extra_costs.get(ExtraCostKind::Pmi) else {
            return;
        };
        let equity_percent = down_payment_percent(&self.inputs);
        let estimate = rule.estimate(self.inputs.loan_amount());

        if equity_percent < rule.min_equity_percent && current == 0.0 {
            self.inputs.extra_costs.set(ExtraCostKind::Pmi, estimate);
        } else if equity_percent >= rule.min_equity_percent
            && current != 0.0
            && (current - estimate).abs() < rule.clear_tolerance
        {
            self.inputs.extra_costs.set(ExtraCostKind::Pmi, 0.0);
        }
    }
}

fn down_payment_percent(inputs: &Inputs) -> f64 {
    if inputs.price > 0.0 {
        inputs.down_payment / inputs.price * 100.0
    } else {
        0.0
    }
}

fn derive(inputs: &Inputs) -> Derived {
    let loan_amount = inputs.loan_amount();
    let rate = monthly_rate(inputs.annual_interest_rate_percent);
    let payment = compute_payment(loan_amount, rate, inputs.loan_term_months);
    let extra_costs_total = inputs.extra_costs.total();
    let total_monthly_payment = payment.monthly_principal_interest + extra_costs_total;
    let monthly_income = inputs.monthly_income();

    Derived {
        loan_amount,
        monthly_rate: rate,
        monthly_principal_interest: payment.monthly_principal_interest,
        extra_costs_total,
        total_monthly_payment,
        total_interest: payment.total_interest,
        total_amount: loan_amount + payment.total_interest,
        down_payment_percent: down_payment_percent(inputs),
        monthly_income,
        payment_ratio: ratio_of(total_monthly_payment, monthly_income),
        debt_ratio: ratio_of(
            total_monthly_payment + inputs.existing_monthly_debt,
            monthly_income,
        ),
    }
}
