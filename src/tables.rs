//! Rate table configuration.
//!
//! The `tables` module holds the three configuration collections the
//! engine computes from: salary components, progressive tax brackets
//! and insurance rates.  A [`RateTables`] value is pure data injected
//! into the engine at construction; it is loaded once and never
//! mutated during a calculation.  Where the configuration actually
//! lives (files, a database) is the surrounding application's
//! concern; this module only provides JSON loading helpers in the
//! same shape the rest of the system serialises.

use crate::models::{InsuranceRate, SalaryComponent, TaxBracket};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors raised while loading a rate table file.  These surface to
/// the caller; unlike calculation-time problems, a configuration
/// *file* that cannot be read or parsed is a hard error.
#[derive(Debug, Error)]
pub enum TableError {
    /// The file could not be read from disk.
    #[error("failed to read rate table file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file contents are not a valid rate table document.
    #[error("failed to parse rate table file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk shape of one rate table snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RateTableDocument {
    #[serde(default)]
    components: Vec<SalaryComponent>,
    #[serde(default)]
    tax_brackets: Vec<TaxBracket>,
    #[serde(default)]
    insurance_rates: Vec<InsuranceRate>,
}

/// The versioned configuration a payroll calculation runs against.
///
/// Components and brackets are sorted by `order` at construction so
/// calculations can walk them without re-sorting.
#[derive(Debug, Clone)]
pub struct RateTables {
    components: Vec<SalaryComponent>,
    brackets: Vec<TaxBracket>,
    insurance_rates: Vec<InsuranceRate>,
}

impl RateTables {
    pub fn new(
        mut components: Vec<SalaryComponent>,
        mut brackets: Vec<TaxBracket>,
        insurance_rates: Vec<InsuranceRate>,
    ) -> Self {
        components.sort_by_key(|c| c.order);
        brackets.sort_by_key(|b| b.order);
        RateTables {
            components,
            brackets,
            insurance_rates,
        }
    }

    /// Parses a rate table snapshot from a JSON document.
    pub fn from_json_str(data: &str) -> serde_json::Result<Self> {
        let doc: RateTableDocument = serde_json::from_str(data)?;
        Ok(RateTables::new(
            doc.components,
            doc.tax_brackets,
            doc.insurance_rates,
        ))
    }

    /// All components, ascending by `order`.
    pub fn components(&self) -> &[SalaryComponent] {
        &self.components
    }

    /// Active components, ascending by `order`: the evaluation chain
    /// a calculation walks.
    pub fn active_components(&self) -> impl Iterator<Item = &SalaryComponent> {
        self.components.iter().filter(|c| c.is_active)
    }

    /// The tax bracket table, ascending by `order`.
    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// All insurance rates as loaded.
    pub fn insurance_rates(&self) -> &[InsuranceRate] {
        &self.insurance_rates
    }

    /// Resolves the insurance rate an insurance component draws from.
    ///
    /// A component naming an explicit `insurance_ref` matches the
    /// rate of exactly that type.  Without a reference the legacy
    /// convention applies: a rate whose type prefixes the component
    /// code (`BHXH_EMP` matches `BHXH`).  When the prefix convention
    /// matches several categories the longest type wins, and within a
    /// type the newest effective date wins.
    pub fn insurance_rate_for(&self, component: &SalaryComponent) -> Option<&InsuranceRate> {
        let mut candidates: Vec<&InsuranceRate> = self
            .insurance_rates
            .iter()
            .filter(|r| r.is_active)
            .filter(|r| match &component.insurance_ref {
                Some(reference) => &r.rate_type == reference,
                None => component.code.starts_with(&r.rate_type),
            })
            .collect();
        candidates.sort_by(|a, b| {
            (a.rate_type.len(), &a.effective_date).cmp(&(b.rate_type.len(), &b.effective_date))
        });
        candidates.pop()
    }

    /// Returns the snapshot current as of `as_of` (an ISO 8601 date):
    /// active components and brackets as-is, and for each insurance
    /// category only the latest active rate whose effective date is
    /// on or before `as_of`.  The engine assumes it is handed exactly
    /// one active snapshot per calculation.
    pub fn snapshot(&self, as_of: &str) -> RateTables {
        let mut latest: HashMap<&str, &InsuranceRate> = HashMap::new();
        for rate in &self.insurance_rates {
            if !rate.is_active || rate.effective_date.as_str() > as_of {
                continue;
            }
            let newer = match latest.get(rate.rate_type.as_str()) {
                Some(current) => rate.effective_date > current.effective_date,
                None => true,
            };
            if newer {
                latest.insert(rate.rate_type.as_str(), rate);
            }
        }
        let mut rates: Vec<InsuranceRate> = latest.into_values().cloned().collect();
        rates.sort_by(|a, b| a.rate_type.cmp(&b.rate_type));
        RateTables {
            components: self.components.clone(),
            brackets: self.brackets.clone(),
            insurance_rates: rates,
        }
    }
}

/// Loads one rate table snapshot from a JSON file.
pub fn load_rate_tables(path: &Path) -> Result<RateTables, TableError> {
    let data = std::fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    RateTables::from_json_str(&data).map_err(|source| TableError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load all rate table snapshots from a directory.
///
/// This helper scans a directory and attempts to parse any `.json`
/// files as rate table documents.  Files that fail to parse are
/// skipped with a warning rather than failing the scan, so one stale
/// file does not take down configuration loading for the rest.
pub fn load_rate_tables_from_dir(path: &Path) -> Result<Vec<RateTables>> {
    let mut tables = Vec::new();
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(ext) = entry.path().extension() {
                    if ext == "json" {
                        match load_rate_tables(&entry.path()) {
                            Ok(parsed) => tables.push(parsed),
                            Err(err) => {
                                warn!(error = %err, "skipping unparsable rate table file");
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(tables)
}
