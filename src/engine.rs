//! Payroll computation engine.
//!
//! The `engine` module walks the dependency-ordered salary component
//! chain for one employee and assembles a [`PayrollResult`]: gross
//! income, taxable income, personal income tax, net income and the
//! per-category insurance breakdown.  Batch runs use the [`rayon`]
//! crate to parallelise per-employee calculations across multiple
//! CPU cores; a single calculation is a pure function of the inputs
//! and the injected rate tables.
//!
//! The engine never fails a calculation.  A malformed formula, a
//! missing insurance rate or a gap in the bracket table degrades the
//! affected component to zero and the run continues, so one bad
//! configuration entry cannot abort a payroll batch.  Callers that
//! want strict validation should lint the rate tables up front with
//! [`crate::validate::lint_tables`].

use crate::formula::evaluate_formula;
use crate::models::{
    ComponentMethod, ComponentType, EmployeePayrollResult, InsuranceContribution, PayRunInput,
    PayRunResult, PayrollInput, PayrollResult,
};
use crate::tables::RateTables;
use crate::tax::{ProgressiveTaxCalculator, TaxCalculator};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Component code carrying the contribution base for insurance.
pub const BASE_SALARY: &str = "BASE_SALARY";
/// Component code extracted into [`PayrollResult::gross_income`].
pub const GROSS_INCOME: &str = "GROSS_INCOME";
/// Component code extracted into [`PayrollResult::taxable_income`].
pub const TAXABLE_INCOME: &str = "TAXABLE_INCOME";
/// The special-cased tax component: its value comes from the tax
/// calculator applied to `TAXABLE_INCOME`, not from its method.
pub const PIT: &str = "PIT";
/// Component code extracted into [`PayrollResult::net_income`].
pub const NET_INCOME: &str = "NET_INCOME";

/// The payroll calculation engine.
///
/// Constructed over one rate table snapshot; every call to
/// [`PayrollEngine::calculate`] is independent and side-effect-free,
/// so an engine can be shared across threads and reused for any
/// number of employees.
pub struct PayrollEngine {
    tables: RateTables,
    tax_calculator: Arc<dyn TaxCalculator>,
}

impl PayrollEngine {
    /// Builds an engine over `tables`, deriving a progressive tax
    /// calculator from the tables' bracket list.
    pub fn new(tables: RateTables) -> Self {
        let tax_calculator = Arc::new(ProgressiveTaxCalculator::new(tables.brackets().to_vec()));
        PayrollEngine {
            tables,
            tax_calculator,
        }
    }

    /// Builds an engine with an explicit tax calculator, e.g. a
    /// [`crate::tax::FlatTaxCalculator`] for flat-withholding
    /// contracts.
    pub fn with_tax_calculator(tables: RateTables, tax_calculator: Arc<dyn TaxCalculator>) -> Self {
        PayrollEngine {
            tables,
            tax_calculator,
        }
    }

    /// Calculates one employee's payroll from the supplied seed
    /// values.  The caller's mapping is cloned, never mutated.
    ///
    /// Components are processed ascending by `order`.  `FIXED`
    /// components take their seeded value (zero when absent);
    /// `FORMULA` components are evaluated against the values computed
    /// so far; `PERCENTAGE` insurance components apply their rate to
    /// the capped contribution base; the `PIT` component is resolved
    /// through the tax calculator.  Seeds for inactive component
    /// codes are dropped from the working context first, so formulas
    /// referencing a deactivated component resolve it to zero rather
    /// than picking up a stale value.
    pub fn calculate(&self, inputs: &PayrollInput) -> PayrollResult {
        let mut context: HashMap<String, f64> = inputs.clone();
        for component in self.tables.components() {
            if !component.is_active {
                context.remove(&component.code);
            }
        }

        let mut insurance_breakdown: HashMap<String, InsuranceContribution> = HashMap::new();
        let mut tax_breakdown: HashMap<String, f64> = HashMap::new();

        for component in self.tables.active_components() {
            if component.code == PIT {
                let taxable = context.get(TAXABLE_INCOME).copied().unwrap_or(0.0).max(0.0);
                let tax = self.tax_calculator.calculate(taxable);
                context.insert(component.code.clone(), tax);
                tax_breakdown.insert(component.code.clone(), tax);
                continue;
            }
            match component.method {
                ComponentMethod::Formula => {
                    let value =
                        evaluate_formula(component.formula.as_deref().unwrap_or(""), &context);
                    context.insert(component.code.clone(), value);
                }
                ComponentMethod::Percentage
                    if component.component_type == ComponentType::Insurance =>
                {
                    match self.tables.insurance_rate_for(component) {
                        Some(rate) => {
                            let base_salary = context.get(BASE_SALARY).copied().unwrap_or(0.0);
                            let base = match rate.cap_base_salary {
                                Some(cap) => base_salary.min(cap),
                                None => base_salary,
                            };
                            let employee_amount = (base * rate.employee_rate / 100.0).round();
                            let employer_amount = (base * rate.employer_rate / 100.0).round();
                            context.insert(component.code.clone(), employee_amount);
                            insurance_breakdown.insert(
                                rate.rate_type.clone(),
                                InsuranceContribution {
                                    base,
                                    employee_amount,
                                    employer_amount,
                                },
                            );
                        }
                        None => {
                            warn!(
                                code = %component.code,
                                "no insurance rate matches component, amount falls back to 0"
                            );
                            context.insert(component.code.clone(), 0.0);
                        }
                    }
                }
                // FIXED seeds, and any percentage component that is
                // neither insurance nor PIT, take their value from
                // the inputs as-is.
                _ => {
                    let value = context.get(&component.code).copied().unwrap_or(0.0);
                    context.insert(component.code.clone(), value);
                }
            }
        }

        let extract = |code: &str| context.get(code).copied().unwrap_or(0.0);
        PayrollResult {
            gross_income: extract(GROSS_INCOME),
            taxable_income: extract(TAXABLE_INCOME),
            tax_amount: extract(PIT),
            net_income: extract(NET_INCOME),
            values: context,
            insurance_breakdown,
            tax_breakdown,
        }
    }

    /// Runs a payroll for many employees over one pay period.
    ///
    /// Each employee is calculated independently and in parallel;
    /// there is no ordering dependency between employees, only within
    /// one employee's component chain.  Result order matches input
    /// order.
    pub fn run_batch(&self, input: PayRunInput) -> PayRunResult {
        let period = input.pay_period;
        let results: Vec<EmployeePayrollResult> = input
            .employees
            .into_par_iter()
            .map(|employee| EmployeePayrollResult {
                result: self.calculate(&employee.inputs),
                employee_id: employee.employee_id,
            })
            .collect();
        PayRunResult { period, results }
    }
}
