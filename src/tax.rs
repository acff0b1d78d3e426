//! Personal income tax calculation.
//!
//! The `tax` module defines the `TaxCalculator` trait together with
//! the two withholding regimes the engine ships with: progressive
//! bracket taxation using the fast-calculation method, and flat-rate
//! withholding (used e.g. for probationary contracts taxed at a
//! fixed percentage).  The bracket table itself is configuration
//! supplied through the rate tables; see [`crate::models::TaxBracket`].

use crate::models::TaxBracket;
use tracing::warn;

/// A tax calculator turns a taxable-income figure into the payable
/// personal income tax for one pay period.
///
/// Tax calculators must be thread-safe (`Send + Sync`) because the
/// engine invokes them concurrently across batch workers.
pub trait TaxCalculator: Send + Sync {
    /// Calculates the tax payable on `taxable_income`.  Non-positive
    /// income yields zero.  Implementations are total: a
    /// configuration gap degrades to zero rather than failing the
    /// calculation.
    fn calculate(&self, taxable_income: f64) -> f64;
}

/// Progressive bracket taxation via the fast-calculation method.
///
/// Each bracket carries a flat rate applied to the *entire* taxable
/// income and a precomputed subtraction constant chosen so that
/// `income * rate / 100 - subtract_amount` equals the true
/// marginal-sum tax for any income inside the bracket.  Brackets are
/// expected to partition `(0, +inf)`; the table is trusted as-is and
/// can be checked beforehand with [`crate::validate::lint_tables`].
pub struct ProgressiveTaxCalculator {
    brackets: Vec<TaxBracket>,
}

impl ProgressiveTaxCalculator {
    /// Builds a calculator over the given bracket table.  Brackets
    /// are sorted ascending by `order` once here; a calculation never
    /// mutates them.
    pub fn new(mut brackets: Vec<TaxBracket>) -> Self {
        brackets.sort_by_key(|b| b.order);
        ProgressiveTaxCalculator { brackets }
    }

    /// Selects the bracket containing `taxable_income`: the first, in
    /// ascending order, whose range `(min_income, max_income]` holds
    /// the figure.  The unbounded top bracket has no `max_income`.
    fn bracket_for(&self, taxable_income: f64) -> Option<&TaxBracket> {
        self.brackets.iter().find(|b| {
            taxable_income > b.min_income
                && taxable_income <= b.max_income.unwrap_or(f64::INFINITY)
        })
    }
}

impl TaxCalculator for ProgressiveTaxCalculator {
    fn calculate(&self, taxable_income: f64) -> f64 {
        if taxable_income <= 0.0 {
            return 0.0;
        }
        match self.bracket_for(taxable_income) {
            Some(bracket) => {
                (taxable_income * bracket.tax_rate / 100.0 - bracket.subtract_amount).round()
            }
            None => {
                warn!(taxable_income, "no tax bracket matches, tax falls back to 0");
                0.0
            }
        }
    }
}

/// Flat-rate withholding: `round(income * rate / 100)` on any
/// positive taxable income.
pub struct FlatTaxCalculator {
    /// Withholding percentage, e.g. `10.0` for a 10% flat regime.
    pub rate: f64,
}

impl TaxCalculator for FlatTaxCalculator {
    fn calculate(&self, taxable_income: f64) -> f64 {
        if taxable_income <= 0.0 {
            return 0.0;
        }
        (taxable_income * self.rate / 100.0).round()
    }
}
