// 🧮 Formula Projector - Live spreadsheet formulas for the enhanced export
//
// Rewrites Total_Allocated, Allocation_Check, Allocation_Status and Property
// as formula text so a reviewer can re-split amounts by hand in a spreadsheet
// and see the balance checks update. Formulas are only emitted, never evaluated.
//
// Sheet layout (1-based columns, header on row 1, data from row 2):
//   [original columns] [entity columns...] Total_Allocated Allocation_Check
//   Allocation_Status Property
// followed by one TOTALS row. Source columns that share a name with a
// generated column are left out and replaced by the generated one.

use crate::allocation::{AllocationRow, BALANCE_TOLERANCE};
use crate::entities::EntitySet;
use crate::error::{AllocatorError, Result};
use crate::export::ExportTable;
use crate::resolver::AmountSource;
use crate::table::TransactionTable;

pub const TOTAL_ALLOCATED_COLUMN: &str = "Total_Allocated";
pub const ALLOCATION_CHECK_COLUMN: &str = "Allocation_Check";
pub const ALLOCATION_STATUS_COLUMN: &str = "Allocation_Status";
pub const PROPERTY_COLUMN: &str = "Property";

pub const TOTALS_LABEL: &str = "TOTALS";
pub const PROPERTY_FLAG_TEXT: &str = "Required";
pub const PROPERTY_COUNT_SUFFIX: &str = " Required";

pub type FormulaTable = ExportTable;

// ============================================================================
// COLUMN LETTERS
// ============================================================================

/// 1-based column number → spreadsheet letters (1 → A, 26 → Z, 27 → AA)
///
/// Bijective base-26. Returns an empty string for 0.
pub fn num_to_letter(n: usize) -> String {
    let mut letters = Vec::new();
    let mut n = n;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Spreadsheet letters → 1-based column number ("A" → 1, "AA" → 27)
pub fn letter_to_num(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }

    letters.chars().try_fold(0usize, |acc, c| {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        acc.checked_mul(26)?
            .checked_add((c as u8 - b'A') as usize + 1)
    })
}

// ============================================================================
// COLUMN LAYOUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountColumns {
    /// 1-based column of the single amount column
    Single(usize),
    /// 1-based columns of the positional pair (D and E unless a column before them was dropped)
    Pair(usize, usize),
}

/// Where every formula-relevant column sits in the exported sheet (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    /// 0-based source columns copied into the sheet, in order
    pub columns: Vec<usize>,
    pub amount: AmountColumns,
    pub entity_start: usize,
    pub entity_count: usize,
    pub trigger_offset: Option<usize>,
    pub total_allocated: usize,
    pub allocation_check: usize,
    pub allocation_status: usize,
    pub property: usize,
    /// 1-based column that receives the TOTALS label, if any
    pub label: Option<usize>,
}

impl ColumnLayout {
    /// Layout used by the exports: originals, then entities, then the four check columns
    ///
    /// Source columns named like a generated column are replaced by it, so
    /// re-processing an earlier export keeps headers unique. The amount column
    /// itself may not be one of them.
    pub fn for_export(table: &TransactionTable, source: &AmountSource, entities: &EntitySet) -> Result<Self> {
        let columns = retained_columns(table, entities);

        let sheet_column = |source_column: usize| -> Result<usize> {
            columns
                .iter()
                .position(|c| *c == source_column)
                .map(|p| p + 1)
                .ok_or_else(|| {
                    AllocatorError::InvalidTable(format!(
                        "amount column '{}' clashes with a generated allocation column",
                        table.headers()[source_column]
                    ))
                })
        };

        let amount = match source {
            AmountSource::Column { index, .. } => AmountColumns::Single(sheet_column(*index)?),
            AmountSource::Pair { first, second, .. } => {
                AmountColumns::Pair(sheet_column(*first)?, sheet_column(*second)?)
            }
        };

        let mut layout = ColumnLayout {
            amount,
            entity_start: columns.len() + 1,
            entity_count: entities.len(),
            trigger_offset: entities.trigger_index(),
            total_allocated: 0,
            allocation_check: 0,
            allocation_status: 0,
            property: 0,
            label: None,
            columns,
        };

        let after_entities = layout.entity_start + layout.entity_count;
        layout.total_allocated = after_entities;
        layout.allocation_check = after_entities + 1;
        layout.allocation_status = after_entities + 2;
        layout.property = after_entities + 3;

        let amount_cols = layout.amount_columns();
        layout.label = (1..=layout.columns.len()).find(|c| !amount_cols.contains(c));

        Ok(layout)
    }

    pub fn entity_end(&self) -> usize {
        self.entity_start + self.entity_count - 1
    }

    pub fn width(&self) -> usize {
        self.property
    }

    fn amount_columns(&self) -> Vec<usize> {
        match self.amount {
            AmountColumns::Single(c) => vec![c],
            AmountColumns::Pair(first, second) => vec![first, second],
        }
    }

    /// Retained source cells of one row, in sheet order
    pub fn source_cells(&self, table: &TransactionTable, row: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| table.raw(row, *c).to_string())
            .collect()
    }

    // ------------------------------------------------------------------------
    // Row formulas
    // ------------------------------------------------------------------------

    pub fn total_allocated_formula(&self, row: usize) -> String {
        format!(
            "=SUM({}{}:{}{})",
            num_to_letter(self.entity_start),
            row,
            num_to_letter(self.entity_end()),
            row
        )
    }

    pub fn check_formula(&self, row: usize) -> String {
        let total = num_to_letter(self.total_allocated);
        match self.amount {
            AmountColumns::Single(c) => format!("={}{}-{}{}", num_to_letter(c), row, total, row),
            AmountColumns::Pair(first, second) => format!(
                "={}{}+{}{}-{}{}",
                num_to_letter(first),
                row,
                num_to_letter(second),
                row,
                total,
                row
            ),
        }
    }

    pub fn status_formula(&self, row: usize) -> String {
        let check = format!("{}{}", num_to_letter(self.allocation_check), row);
        format!(
            "=IF(ABS({})<{},\"Balanced\",\"Off by $\"&ROUND({},2))",
            check, BALANCE_TOLERANCE, check
        )
    }

    pub fn property_formula(&self, row: usize) -> String {
        match self.trigger_offset {
            Some(offset) => format!(
                "=IF({}{}<>0,\"{}\",\"\")",
                num_to_letter(self.entity_start + offset),
                row,
                PROPERTY_FLAG_TEXT
            ),
            None => String::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Totals-row formulas
    // ------------------------------------------------------------------------

    /// Column sum over the data rows (2..=last_row); "=0" when there are none
    pub fn column_sum_formula(&self, column: usize, last_row: usize) -> String {
        if last_row < 2 {
            return "=0".to_string();
        }
        let letter = num_to_letter(column);
        format!("=SUM({}2:{}{})", letter, letter, last_row)
    }

    pub fn property_count_formula(&self, last_row: usize) -> String {
        if last_row < 2 {
            return format!("=\"0{}\"", PROPERTY_COUNT_SUFFIX);
        }
        let letter = num_to_letter(self.property);
        format!(
            "=COUNTIF({}2:{}{},\"{}\")&\"{}\"",
            letter, letter, last_row, PROPERTY_FLAG_TEXT, PROPERTY_COUNT_SUFFIX
        )
    }
}

// ============================================================================
// PROJECTION
// ============================================================================

/// Entity columns followed by the four check columns
pub fn generated_headers(entities: &EntitySet) -> Vec<String> {
    entities
        .iter()
        .chain([
            TOTAL_ALLOCATED_COLUMN,
            ALLOCATION_CHECK_COLUMN,
            ALLOCATION_STATUS_COLUMN,
            PROPERTY_COLUMN,
        ])
        .map(|h| h.to_string())
        .collect()
}

/// 0-based source columns that survive into the exports
pub fn retained_columns(table: &TransactionTable, entities: &EntitySet) -> Vec<usize> {
    let generated = generated_headers(entities);
    table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, header)| {
            let clashes = generated.contains(*header);
            if clashes {
                tracing::debug!(column = %header, "replacing source column with generated column");
            }
            !clashes
        })
        .map(|(i, _)| i)
        .collect()
}

/// Sheet headers: retained source columns, then the generated ones
pub fn allocation_headers(table: &TransactionTable, layout: &ColumnLayout, entities: &EntitySet) -> Vec<String> {
    let mut headers: Vec<String> = layout
        .columns
        .iter()
        .map(|c| table.headers()[*c].clone())
        .collect();
    headers.extend(generated_headers(entities));
    headers
}

/// Build the formula-annotated export table
///
/// Original cells are copied verbatim, entity cells hold the allocated values,
/// the four check columns hold formulas, and a TOTALS row closes the sheet.
pub fn project_formulas(
    table: &TransactionTable,
    rows: &[AllocationRow],
    layout: &ColumnLayout,
    entities: &EntitySet,
) -> FormulaTable {
    let headers = allocation_headers(table, layout, entities);
    let mut out = Vec::with_capacity(rows.len() + 1);

    for (i, row) in rows.iter().enumerate() {
        let sheet_row = i + 2;
        let mut cells = layout.source_cells(table, row.source_row);

        cells.extend(row.entity_values().iter().map(|v| format_value(*v)));
        cells.push(layout.total_allocated_formula(sheet_row));
        cells.push(layout.check_formula(sheet_row));
        cells.push(layout.status_formula(sheet_row));
        cells.push(layout.property_formula(sheet_row));
        out.push(cells);
    }

    out.push(totals_row(rows.len(), layout));

    FormulaTable { headers, rows: out }
}

fn totals_row(data_rows: usize, layout: &ColumnLayout) -> Vec<String> {
    let last_row = data_rows + 1;
    let totals_row = data_rows + 2;
    let mut cells = vec![String::new(); layout.width()];

    if let Some(label) = layout.label {
        cells[label - 1] = TOTALS_LABEL.to_string();
    }

    for column in layout.amount_columns() {
        cells[column - 1] = layout.column_sum_formula(column, last_row);
    }

    for column in layout.entity_start..=layout.entity_end() {
        cells[column - 1] = layout.column_sum_formula(column, last_row);
    }

    cells[layout.total_allocated - 1] = layout.column_sum_formula(layout.total_allocated, last_row);
    cells[layout.allocation_check - 1] = layout.check_formula(totals_row);
    cells[layout.allocation_status - 1] = layout.status_formula(totals_row);
    cells[layout.property - 1] = layout.property_count_formula(last_row);

    cells
}

/// Two-decimal rendering used for every computed number in the exports
pub fn format_value(value: f64) -> String {
    let rounded = format!("{:.2}", value);
    if rounded == "-0.00" {
        "0.00".to_string()
    } else {
        rounded
    }
}

// ============================================================================
// TESTS
// ============================================================================
