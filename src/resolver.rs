// 🔎 Column Resolver - Which column holds the transaction amount?
//
// Three mutually exclusive policies:
//   NamedColumn    → conventional header names, then numeric/"amount" heuristics
//   FixedName      → a column literally named "Amount"
//   PositionalPair → 4th + 5th columns summed (falls back to NamedColumn)
//
// A manual column choice always wins over every policy.

use crate::error::{AllocatorError, Result};
use crate::table::TransactionTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Header names tried in order by the named-column policy
pub const AMOUNT_COLUMN_CANDIDATES: [&str; 12] = [
    "Amount",
    "amount",
    "AMOUNT",
    "Transaction Amount",
    "Trans Amount",
    "Trans. Amount",
    "Debit",
    "Credit",
    "Balance",
    "Value",
    "Purchase Amount",
    "Charge Amount",
];

pub const FIXED_AMOUNT_COLUMN: &str = "Amount";

/// 0-based positions of the positional pair (spreadsheet columns D and E)
pub const PAIR_FIRST_COLUMN: usize = 3;
pub const PAIR_SECOND_COLUMN: usize = 4;
pub const PAIR_MIN_COLUMNS: usize = 6;

// ============================================================================
// POLICIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AmountPolicy {
    #[default]
    NamedColumn,
    FixedName,
    PositionalPair,
}

impl AmountPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            AmountPolicy::NamedColumn => "named-column",
            AmountPolicy::FixedName => "fixed-name",
            AmountPolicy::PositionalPair => "positional-pair",
        }
    }
}

impl fmt::Display for AmountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AmountPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "named-column" | "named" => Ok(AmountPolicy::NamedColumn),
            "fixed-name" | "fixed" => Ok(AmountPolicy::FixedName),
            "positional-pair" | "pair" => Ok(AmountPolicy::PositionalPair),
            other => Err(format!(
                "unknown amount policy '{}' (expected named-column, fixed-name or positional-pair)",
                other
            )),
        }
    }
}

/// What to do with amount cells that are not numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvalidNumericPolicy {
    /// Treat the cell as 0.0 and record it
    #[default]
    Zero,
    /// Abort the request
    Error,
    /// Leave the row out of the allocation and record it
    Skip,
}

impl InvalidNumericPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            InvalidNumericPolicy::Zero => "zero",
            InvalidNumericPolicy::Error => "error",
            InvalidNumericPolicy::Skip => "skip",
        }
    }
}

impl fmt::Display for InvalidNumericPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InvalidNumericPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zero" => Ok(InvalidNumericPolicy::Zero),
            "error" => Ok(InvalidNumericPolicy::Error),
            "skip" => Ok(InvalidNumericPolicy::Skip),
            other => Err(format!(
                "unknown invalid-numeric policy '{}' (expected zero, error or skip)",
                other
            )),
        }
    }
}

// ============================================================================
// AMOUNT SOURCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountSource {
    /// One column holds the amount
    Column { index: usize, name: String },

    /// Two columns added together (positional pair)
    Pair {
        first: usize,
        first_name: String,
        second: usize,
        second_name: String,
    },
}

impl AmountSource {
    pub fn is_pair(&self) -> bool {
        matches!(self, AmountSource::Pair { .. })
    }

    /// 0-based column indices feeding the amount
    pub fn columns(&self) -> Vec<usize> {
        match self {
            AmountSource::Column { index, .. } => vec![*index],
            AmountSource::Pair { first, second, .. } => vec![*first, *second],
        }
    }

    /// Human-readable description for reports
    pub fn describe(&self) -> String {
        match self {
            AmountSource::Column { name, .. } => name.clone(),
            AmountSource::Pair {
                first_name,
                second_name,
                ..
            } => format!("{} + {} (columns D+E)", first_name, second_name),
        }
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Resolve the amount source under a policy
pub fn resolve_amount_source(table: &TransactionTable, policy: AmountPolicy) -> Result<AmountSource> {
    let source = match policy {
        AmountPolicy::NamedColumn => named_column(table),
        AmountPolicy::FixedName => fixed_name(table)?,
        AmountPolicy::PositionalPair => match positional_pair(table) {
            Some(pair) => Some(pair),
            None => {
                tracing::debug!(
                    columns = table.column_count(),
                    "positional pair not applicable, falling back to named-column policy"
                );
                named_column(table)
            }
        },
    };

    let source = source.ok_or_else(|| AllocatorError::AmountColumnNotFound {
        columns: table.headers().to_vec(),
    })?;

    tracing::info!(policy = %policy, source = %source.describe(), "resolved amount source");
    Ok(source)
}

/// Resolve with an optional manual column choice that overrides the policy
pub fn resolve_with_override(
    table: &TransactionTable,
    policy: AmountPolicy,
    manual_column: Option<&str>,
) -> Result<AmountSource> {
    match manual_column {
        Some(name) => {
            let index = table
                .column_index(name)
                .ok_or_else(|| AllocatorError::UnknownColumn {
                    column: name.to_string(),
                    columns: table.headers().to_vec(),
                })?;
            tracing::info!(column = name, "using manual amount column");
            Ok(AmountSource::Column {
                index,
                name: name.to_string(),
            })
        }
        None => resolve_amount_source(table, policy),
    }
}

/// Conventional header names first, then the first numeric or "amount"-like column
fn named_column(table: &TransactionTable) -> Option<AmountSource> {
    for candidate in AMOUNT_COLUMN_CANDIDATES {
        if let Some(index) = table.column_index(candidate) {
            return Some(AmountSource::Column {
                index,
                name: candidate.to_string(),
            });
        }
    }

    table
        .headers()
        .iter()
        .enumerate()
        .find(|(index, header)| {
            table.is_numeric_column(*index) || header.to_lowercase().contains("amount")
        })
        .map(|(index, header)| AmountSource::Column {
            index,
            name: header.clone(),
        })
}

fn fixed_name(table: &TransactionTable) -> Result<Option<AmountSource>> {
    match table.column_index(FIXED_AMOUNT_COLUMN) {
        Some(index) => Ok(Some(AmountSource::Column {
            index,
            name: FIXED_AMOUNT_COLUMN.to_string(),
        })),
        None => Err(AllocatorError::MissingPolicyColumn {
            policy: AmountPolicy::FixedName.to_string(),
            reason: format!("no column named '{}'", FIXED_AMOUNT_COLUMN),
        }),
    }
}

fn positional_pair(table: &TransactionTable) -> Option<AmountSource> {
    if table.column_count() < PAIR_MIN_COLUMNS {
        return None;
    }
    if !table.is_numeric_column(PAIR_FIRST_COLUMN) || !table.is_numeric_column(PAIR_SECOND_COLUMN) {
        return None;
    }

    let headers = table.headers();
    Some(AmountSource::Pair {
        first: PAIR_FIRST_COLUMN,
        first_name: headers[PAIR_FIRST_COLUMN].clone(),
        second: PAIR_SECOND_COLUMN,
        second_name: headers[PAIR_SECOND_COLUMN].clone(),
    })
}

// ============================================================================
// NUMERIC COERCION
// ============================================================================

/// An amount cell that could not be read as a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercedCell {
    pub row: usize,
    pub column: String,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoercionReport {
    /// Cells replaced by 0.0 (or that caused a skip)
    pub cells: Vec<CoercedCell>,
    /// Rows left out under `InvalidNumericPolicy::Skip`
    pub skipped_rows: Vec<usize>,
}

impl CoercionReport {
    pub fn count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_clean(&self) -> bool {
        self.cells.is_empty() && self.skipped_rows.is_empty()
    }
}

/// Parse a statement amount
///
/// Accepts "$1,234.56", "-12.50", "(12.50)". Blank cells are `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let mut negate = false;
    if text.starts_with('(') && text.ends_with(')') && text.len() > 2 {
        negate = true;
        text = &text[1..text.len() - 1];
    }

    let cleaned: String = text.chars().filter(|c| *c != '$' && *c != ',').collect();
    let value = cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;

    Some(if negate { -value } else { value })
}

/// Per-row amounts: `(source_row, amount)` in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedAmounts {
    pub amounts: Vec<(usize, f64)>,
    pub report: CoercionReport,
}

/// Read the amount for every row according to `source`
///
/// Blank cells count as 0.0 without being reported; non-numeric text is
/// handled by `on_invalid`.
pub fn read_amounts(
    table: &TransactionTable,
    source: &AmountSource,
    on_invalid: InvalidNumericPolicy,
) -> Result<ResolvedAmounts> {
    let columns = source.columns();
    if let Some(bad) = columns.iter().find(|c| **c >= table.column_count()) {
        return Err(AllocatorError::UnknownColumn {
            column: format!("#{}", bad + 1),
            columns: table.headers().to_vec(),
        });
    }

    let mut resolved = ResolvedAmounts::default();

    for row in 0..table.len() {
        let mut amount = 0.0;
        let mut row_invalid = false;

        for &column in &columns {
            let raw = table.raw(row, column);
            if raw.trim().is_empty() {
                continue;
            }

            match parse_amount(raw) {
                Some(value) => amount += value,
                None => {
                    let column_name = table.headers()[column].clone();
                    if on_invalid == InvalidNumericPolicy::Error {
                        return Err(AllocatorError::InvalidNumeric {
                            column: column_name,
                            row: row + 1,
                            value: raw.to_string(),
                        });
                    }
                    tracing::warn!(
                        row = row + 1,
                        column = %column_name,
                        value = raw,
                        policy = %on_invalid,
                        "non-numeric amount"
                    );
                    resolved.report.cells.push(CoercedCell {
                        row,
                        column: column_name,
                        raw: raw.to_string(),
                    });
                    row_invalid = true;
                }
            }
        }

        if row_invalid && on_invalid == InvalidNumericPolicy::Skip {
            resolved.report.skipped_rows.push(row);
            continue;
        }
        resolved.amounts.push((row, amount));
    }

    if !resolved.report.is_clean() {
        tracing::warn!(
            coerced = resolved.report.count(),
            skipped = resolved.report.skipped_rows.len(),
            "amount column contained non-numeric values"
        );
    }

    Ok(resolved)
}

// ============================================================================
// TESTS
// ============================================================================
