//! Rate table validation.
//!
//! The engine itself never rejects configuration: at calculation
//! time every problem degrades to a zero contribution so a batch run
//! cannot abort over one bad entry.  Surfacing those problems to an
//! operator is this module's job.  [`lint_tables`] runs against a
//! rate table snapshot independently of any employee and reports
//! everything the engine would silently zero out, plus consistency
//! checks the engine deliberately skips.  Intended to run when
//! configuration is saved and before a pay run is opened.

use crate::formula::{formula_is_well_formed, formula_references};
use crate::models::{ComponentMethod, ComponentType};
use crate::tables::RateTables;
use std::collections::HashMap;
use thiserror::Error;

/// Boundary tolerance when comparing currency amounts: half a unit,
/// since every stored amount is whole.
const AMOUNT_TOLERANCE: f64 = 0.5;

/// One configuration problem found by [`lint_tables`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LintIssue {
    #[error("duplicate component code {code}")]
    DuplicateCode { code: String },

    #[error("component {code} uses the FORMULA method but carries no formula")]
    MissingFormula { code: String },

    #[error("component {code} formula is not valid arithmetic: {formula}")]
    MalformedFormula { code: String, formula: String },

    #[error("component {code} references {reference}, which no component or declared input provides")]
    UnknownReference { code: String, reference: String },

    #[error(
        "component {code} (order {order}) references {reference}, which is not \
         produced until order {reference_order}"
    )]
    ForwardReference {
        code: String,
        reference: String,
        order: i32,
        reference_order: i32,
    },

    #[error("component {code} references inactive component {reference}, which resolves to 0")]
    InactiveReference { code: String, reference: String },

    #[error("tax bracket {order} has min_income {min_income} at or above its max_income {max_income}")]
    InvertedBracket {
        order: i32,
        min_income: f64,
        max_income: f64,
    },

    #[error("tax bracket {order} starts at {min_income} but the previous bracket ends at {expected}")]
    BracketGap {
        order: i32,
        expected: f64,
        min_income: f64,
    },

    #[error("tax bracket {order} is unbounded but is not the top bracket")]
    UnboundedInnerBracket { order: i32 },

    #[error("top tax bracket {order} is bounded, leaving incomes above {max_income} unmatched")]
    BoundedTopBracket { order: i32, max_income: f64 },

    #[error(
        "tax bracket {order} subtract_amount {subtract_amount} is inconsistent with \
         marginal taxation, expected {expected}"
    )]
    InconsistentSubtract {
        order: i32,
        subtract_amount: f64,
        expected: f64,
    },

    #[error("insurance component {code} resolves no active insurance rate")]
    MissingInsuranceRate { code: String },

    #[error(
        "insurance component {code} resolves rate type {rate_type} by code prefix; \
         set insurance_ref explicitly"
    )]
    PrefixResolvedInsurance { code: String, rate_type: String },
}

/// Lints a rate table snapshot.
///
/// `external_codes` declares the seed codes the surrounding system
/// supplies per employee without defining a component for them (e.g.
/// `OT_HOURS`, `DEPENDENTS`); formula references to those are fine.
/// Returns every issue found, in component/bracket order.  An empty
/// vector means the engine will not silently zero anything for this
/// configuration.
pub fn lint_tables(tables: &RateTables, external_codes: &[&str]) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    lint_components(tables, external_codes, &mut issues);
    lint_brackets(tables, &mut issues);
    lint_insurance(tables, &mut issues);
    issues
}

fn lint_components(tables: &RateTables, external_codes: &[&str], issues: &mut Vec<LintIssue>) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for component in tables.components() {
        *seen.entry(component.code.as_str()).or_insert(0) += 1;
    }
    let mut duplicates: Vec<&str> = seen
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(code, _)| *code)
        .collect();
    duplicates.sort_unstable();
    for code in duplicates {
        issues.push(LintIssue::DuplicateCode {
            code: code.to_string(),
        });
    }

    for component in tables.active_components() {
        if component.method != ComponentMethod::Formula {
            continue;
        }
        let formula = match component.formula.as_deref() {
            Some(f) => f,
            None => {
                issues.push(LintIssue::MissingFormula {
                    code: component.code.clone(),
                });
                continue;
            }
        };
        if !formula_is_well_formed(formula) {
            issues.push(LintIssue::MalformedFormula {
                code: component.code.clone(),
                formula: formula.to_string(),
            });
        }
        for reference in formula_references(formula) {
            match tables.components().iter().find(|c| c.code == reference) {
                Some(target) if !target.is_active => {
                    issues.push(LintIssue::InactiveReference {
                        code: component.code.clone(),
                        reference: reference.to_string(),
                    });
                }
                Some(target) if target.order >= component.order => {
                    issues.push(LintIssue::ForwardReference {
                        code: component.code.clone(),
                        reference: reference.to_string(),
                        order: component.order,
                        reference_order: target.order,
                    });
                }
                Some(_) => {}
                None if external_codes.contains(&reference) => {}
                None => {
                    issues.push(LintIssue::UnknownReference {
                        code: component.code.clone(),
                        reference: reference.to_string(),
                    });
                }
            }
        }
    }
}

/// Brackets must partition `(0, +inf)`: contiguous ranges from zero,
/// exactly one unbounded bracket, and fast-calculation subtraction
/// constants matching cumulative marginal tax at each bracket floor.
fn lint_brackets(tables: &RateTables, issues: &mut Vec<LintIssue>) {
    let brackets = tables.brackets();
    let mut expected_min = 0.0;
    for (index, bracket) in brackets.iter().enumerate() {
        let last = index + 1 == brackets.len();
        if (bracket.min_income - expected_min).abs() > AMOUNT_TOLERANCE {
            issues.push(LintIssue::BracketGap {
                order: bracket.order,
                expected: expected_min,
                min_income: bracket.min_income,
            });
        }
        match bracket.max_income {
            Some(max_income) => {
                if max_income <= bracket.min_income {
                    issues.push(LintIssue::InvertedBracket {
                        order: bracket.order,
                        min_income: bracket.min_income,
                        max_income,
                    });
                }
                if last {
                    issues.push(LintIssue::BoundedTopBracket {
                        order: bracket.order,
                        max_income,
                    });
                }
                expected_min = max_income;
            }
            None => {
                if !last {
                    issues.push(LintIssue::UnboundedInnerBracket {
                        order: bracket.order,
                    });
                }
            }
        }

        // Continuity at the bracket floor: the fast formula must meet
        // the previous bracket's value there.  Using the previous
        // row's actual constant keeps one bad row from cascading.
        let expected_subtract = if index == 0 {
            bracket.min_income * bracket.tax_rate / 100.0
        } else {
            let previous = &brackets[index - 1];
            previous.subtract_amount
                + bracket.min_income * (bracket.tax_rate - previous.tax_rate) / 100.0
        };
        if (bracket.subtract_amount - expected_subtract).abs() > AMOUNT_TOLERANCE {
            issues.push(LintIssue::InconsistentSubtract {
                order: bracket.order,
                subtract_amount: bracket.subtract_amount,
                expected: expected_subtract,
            });
        }
    }
}

fn lint_insurance(tables: &RateTables, issues: &mut Vec<LintIssue>) {
    for component in tables.active_components() {
        if component.method != ComponentMethod::Percentage
            || component.component_type != ComponentType::Insurance
        {
            continue;
        }
        match tables.insurance_rate_for(component) {
            None => issues.push(LintIssue::MissingInsuranceRate {
                code: component.code.clone(),
            }),
            Some(rate) if component.insurance_ref.is_none() => {
                issues.push(LintIssue::PrefixResolvedInsurance {
                    code: component.code.clone(),
                    rate_type: rate.rate_type.clone(),
                });
            }
            Some(_) => {}
        }
    }
}
