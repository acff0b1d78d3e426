//! Payroll Engine library crate.
//!
//! This crate exposes a pure payroll calculation core as reusable
//! modules.  External applications depend on `payroll_engine`,
//! construct a [`PayrollEngine`] over a rate table snapshot and call
//! [`PayrollEngine::calculate`] per employee (or
//! [`PayrollEngine::run_batch`] per pay period).  Configuration
//! linting lives in [`validate`], deliberately outside the
//! calculation path.

pub mod engine;
pub mod formula;
pub mod models;
pub mod tables;
pub mod tax;
pub mod validate;

pub use engine::PayrollEngine;
pub use models::{PayRunInput, PayRunResult, PayrollInput, PayrollResult};
pub use tables::RateTables;
