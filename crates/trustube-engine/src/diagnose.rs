//! Factor-importance diagnostics over trained ensembles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tube::VariableEnsemble;

/// Selection counts: how often each factor was used per target variable.
///
/// Rows are target variables (in model order), columns are factors; the
/// cell counts the candidates of that variable's ensemble whose feature
/// subset contains the factor. Untrained variables and never-selected
/// factors read zero. This is the audit of which predictors the engine
/// actually relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FactorUsage {
    variables: Vec<String>,
    factors: Vec<String>,
    counts: Vec<Vec<usize>>,
}

impl FactorUsage {
    pub(crate) fn from_ensembles(
        variables: &[String],
        factors: &[String],
        ensembles: &[VariableEnsemble],
    ) -> Self {
        let mut counts = vec![vec![0_usize; factors.len()]; variables.len()];
        for (row, variable) in variables.iter().enumerate() {
            let Some(ensemble) = ensembles
                .iter()
                .find(|ensemble| ensemble.variable() == variable)
            else {
                continue;
            };
            for candidate in ensemble.candidates() {
                for feature in candidate.features() {
                    if let Some(column) = factors.iter().position(|factor| factor == feature) {
                        counts[row][column] += 1;
                    }
                }
            }
        }
        Self {
            variables: variables.to_vec(),
            factors: factors.to_vec(),
            counts,
        }
    }

    /// Returns the target variables (table rows).
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Returns the factors (table columns).
    #[must_use]
    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    /// Returns the selection count for one `(variable, factor)` cell, or
    /// `None` if either name is not part of the table.
    #[must_use]
    pub fn count(&self, variable: &str, factor: &str) -> Option<usize> {
        let row = self.variables.iter().position(|v| v == variable)?;
        let column = self.factors.iter().position(|f| f == factor)?;
        Some(self.counts[row][column])
    }

    /// Returns the total selection count across all factors for one
    /// variable: the sum of feature-subset sizes over its ensemble.
    #[must_use]
    pub fn row_total(&self, variable: &str) -> Option<usize> {
        let row = self.variables.iter().position(|v| v == variable)?;
        Some(self.counts[row].iter().sum())
    }
}

impl fmt::Display for FactorUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .variables
            .iter()
            .map(String::len)
            .chain([6])
            .max()
            .unwrap_or(6);
        let widths: Vec<usize> = self
            .factors
            .iter()
            .enumerate()
            .map(|(column, factor)| {
                let digits = self
                    .counts
                    .iter()
                    .map(|row| decimal_width(row[column]))
                    .max()
                    .unwrap_or(1);
                factor.len().max(digits)
            })
            .collect();

        write!(f, "{:<name_width$}", "target")?;
        for (factor, &width) in self.factors.iter().zip(&widths) {
            write!(f, "  {factor:>width$}")?;
        }
        for (variable, row) in self.variables.iter().zip(&self.counts) {
            write!(f, "\n{variable:<name_width$}")?;
            for (&count, &width) in row.iter().zip(&widths) {
                write!(f, "  {count:>width$}")?;
            }
        }
        Ok(())
    }
}

fn decimal_width(mut value: usize) -> usize {
    let mut width = 1;
    while value >= 10 {
        value /= 10;
        width += 1;
    }
    width
}
