//! Data models for the Payroll Engine.
//!
//! The `models` module defines a set of serialisable structs and
//! enums representing salary components, tax brackets, insurance
//! rates and the input/output of a payroll calculation.  These data
//! types derive `Serialize` and `Deserialize` so that they can be
//! easily persisted or transmitted over a network.  They form the
//! basis of the engine's configuration and result structures.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Classification of a salary component.  The classification is
/// descriptive only; it does not drive the computation, which is
/// determined by [`ComponentMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    /// Earnings: base salary, allowances, overtime pay.
    Income,
    /// Statutory insurance deductions withheld from the employee.
    Insurance,
    /// Personal income tax.
    Tax,
    /// The final take-home figure.
    NetIncome,
}

/// How a salary component's value is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentMethod {
    /// The value is seeded externally (e.g. base salary from the
    /// employee's contract).  A missing seed defaults to zero.
    Fixed,
    /// The value is derived from other components via an arithmetic
    /// formula.  See the `formula` module for the expression grammar.
    Formula,
    /// The value is a percentage of a contribution base, currently
    /// used for insurance deductions.
    Percentage,
}

/// One named line item in a payroll calculation.
///
/// Components form a dependency-ordered chain: a formula component
/// may reference any component produced before it (strictly smaller
/// `order`) by writing its code in square brackets, e.g.
/// `[BASE_SALARY] + [LUNCH]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryComponent {
    /// Unique identifier referenced by formulas and lookups, e.g.
    /// `BASE_SALARY`, `GROSS_INCOME`, `PIT`, `NET_INCOME`.
    pub code: String,
    /// Human-readable display name for payslips.
    pub name: String,
    /// Descriptive classification of this component.
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    /// How the value is derived.
    pub method: ComponentMethod,
    /// Expression string, required when `method` is `FORMULA`.
    #[serde(default)]
    pub formula: Option<String>,
    /// Explicit reference to the insurance rate this component draws
    /// from (the rate's `type` field).  When absent, the rate is
    /// resolved by the legacy convention of matching a rate type that
    /// prefixes the component code (`BHXH_EMP` matches `BHXH`).
    #[serde(default)]
    pub insurance_ref: Option<String>,
    /// Evaluation position.  Components are computed in ascending
    /// order; a formula must be ordered after every component it
    /// references or those references resolve to zero.
    pub order: i32,
    /// Inactive components are skipped entirely: never computed and
    /// absent from reference resolution.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// One row of the progressive personal-income-tax table.
///
/// The table uses the fast-calculation method: rather than summing
/// marginal slices, the tax for an income inside a bracket is
/// `income * tax_rate / 100 - subtract_amount`, where the subtract
/// amount is precomputed so the result equals the true marginal sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Ascending bracket position; exactly one bracket matches a
    /// given taxable income.
    pub order: i32,
    /// Exclusive lower bound of the bracket.
    pub min_income: f64,
    /// Inclusive upper bound; `None` marks the unbounded top bracket.
    #[serde(default)]
    pub max_income: Option<f64>,
    /// Percentage applied to the entire taxable income.
    pub tax_rate: f64,
    /// Precomputed fast-calculation constant subtracted after the
    /// flat rate is applied.
    pub subtract_amount: f64,
}

/// Contribution rate for one insurance category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceRate {
    /// Category code, e.g. `BHXH` (social), `BHYT` (health), `BHTN`
    /// (unemployment).
    #[serde(rename = "type")]
    pub rate_type: String,
    /// Percentage withheld from the employee.
    pub employee_rate: f64,
    /// Percentage contributed by the employer on top of gross pay.
    pub employer_rate: f64,
    /// Optional regulatory ceiling on the contribution base: when
    /// present the base is `min(base_salary, cap_base_salary)`.
    #[serde(default)]
    pub cap_base_salary: Option<f64>,
    /// Only active rates participate in a calculation.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// ISO 8601 date (`YYYY-MM-DD`) from which this rate applies.
    /// Only the latest rate per type on or before the calculation
    /// date is used.
    pub effective_date: String,
}

/// Per-employee seed values for one calculation, keyed by component
/// code (e.g. `{BASE_SALARY: 10_000_000, OT_HOURS: 20}`).  The engine
/// clones this mapping and never mutates the caller's copy.
pub type PayrollInput = HashMap<String, f64>;

/// Employee and employer shares of one insurance category, computed
/// on the capped contribution base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceContribution {
    /// The contribution base after applying any cap.
    pub base: f64,
    /// Amount withheld from the employee.
    pub employee_amount: f64,
    /// Amount paid by the employer; reported for regulatory filings,
    /// never deducted from the employee's pay.
    pub employer_amount: f64,
}

/// The result of a payroll calculation for a single employee.
///
/// Produced fresh on every call; the engine caches nothing and the
/// caller owns the value outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollResult {
    /// Final value of every computed component plus the seed values
    /// that were carried through, keyed by component code.
    pub values: HashMap<String, f64>,
    /// Value of `GROSS_INCOME` in the final context, zero if absent.
    pub gross_income: f64,
    /// Value of `TAXABLE_INCOME` in the final context, zero if absent.
    pub taxable_income: f64,
    /// Value of `PIT` in the final context, zero if absent.
    pub tax_amount: f64,
    /// Value of `NET_INCOME` in the final context, zero if absent.
    pub net_income: f64,
    /// Per-category insurance amounts, keyed by rate type.
    pub insurance_breakdown: HashMap<String, InsuranceContribution>,
    /// Per-code tax amounts, keyed by component code.
    pub tax_breakdown: HashMap<String, f64>,
}

/// Defines the start and end dates of a pay period.  Dates are
/// represented as ISO 8601 strings (`YYYY-MM-DD`) for simplicity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Inclusive start date of the pay period.
    pub start: String,
    /// Inclusive end date of the pay period.
    pub end: String,
}

/// One employee's entry in a batch payroll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeePayrollInput {
    /// Identifier assigned by the surrounding HR system.  The engine
    /// carries it through unchanged.
    pub employee_id: String,
    /// Seed values for this employee.
    pub inputs: PayrollInput,
}

/// Input to a batch payroll run: many employees, one pay period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRunInput {
    /// The employees to be paid in this run.
    pub employees: Vec<EmployeePayrollInput>,
    /// The period over which payment is being calculated.
    pub pay_period: PayPeriod,
}

/// One employee's result within a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeePayrollResult {
    /// Identifier copied from the corresponding input entry.
    pub employee_id: String,
    /// The full calculation result for this employee.
    pub result: PayrollResult,
}

/// The aggregate result of a batch payroll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRunResult {
    /// The pay period that was processed.
    pub period: PayPeriod,
    /// Individual results, in the same order as the input employees.
    pub results: Vec<EmployeePayrollResult>,
}
