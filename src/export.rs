// 📥 Export - CSV artifacts for a processed statement
//
//   <stem>_enhanced.csv      originals + entities + formula check columns + TOTALS
//   <stem>_allocations.csv   same columns, computed values, no TOTALS row
//   <stem>_summary.csv       Metric,Value report
//   <stem>_entity_totals.csv Entity,Total,Percentage,Transaction Count

use crate::error::Result;
use crate::formula::{allocation_headers, format_value, PROPERTY_FLAG_TEXT};
use crate::pipeline::ProcessedStatement;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

// ============================================================================
// EXPORT TABLE
// ============================================================================

/// Header + string rows, ready to serialize
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Computed-value export: same columns as the enhanced export, no formulas
pub fn basic_table(processed: &ProcessedStatement) -> ExportTable {
    let table = &processed.table;
    let layout = &processed.layout;
    let headers = allocation_headers(table, layout, &processed.entities);

    let rows = processed
        .rows
        .iter()
        .map(|row| {
            let mut cells = layout.source_cells(table, row.source_row);

            cells.extend(row.entity_values().iter().map(|v| format_value(*v)));
            cells.push(format_value(row.total_allocated()));
            cells.push(format_value(row.allocation_check()));
            cells.push(row.status().to_string());
            cells.push(if row.property_flag() {
                PROPERTY_FLAG_TEXT.to_string()
            } else {
                String::new()
            });
            cells
        })
        .collect();

    ExportTable { headers, rows }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// `$1,234.56` style, negative as `$-150.00`
pub fn format_currency(value: f64) -> String {
    let fixed = format_value(value);
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("${}{}.{}", sign, grouped, frac_part)
}

pub fn summary_table(processed: &ProcessedStatement) -> ExportTable {
    let summary = &processed.summary;
    let metrics = [
        ("Total Transactions", summary.row_count.to_string()),
        ("Total Amount", format_currency(summary.total_transactions)),
        ("Total Allocated", format_currency(summary.total_allocated)),
        ("Allocation Check", format!("${:.2}", summary.grand_total_check)),
        ("Unbalanced Transactions", summary.unbalanced_count.to_string()),
        ("Amount Column Used", processed.source.describe()),
        ("Amount Policy", processed.policy.to_string()),
        ("Coerced Cells", processed.coercions.count().to_string()),
        ("Skipped Rows", processed.coercions.skipped_rows.len().to_string()),
    ];

    ExportTable {
        headers: vec!["Metric".to_string(), "Value".to_string()],
        rows: metrics
            .iter()
            .map(|(k, v)| vec![k.to_string(), v.clone()])
            .collect(),
    }
}

pub fn entity_totals_table(processed: &ProcessedStatement) -> ExportTable {
    ExportTable {
        headers: vec![
            "Entity".to_string(),
            "Total".to_string(),
            "Percentage".to_string(),
            "Transaction Count".to_string(),
        ],
        rows: processed
            .summary
            .entity_totals
            .iter()
            .map(|t| {
                vec![
                    t.entity.clone(),
                    format_value(t.total),
                    format!("{:.1}%", t.percentage),
                    t.transaction_count.to_string(),
                ]
            })
            .collect(),
    }
}

// ============================================================================
// FILES
// ============================================================================

/// `credit_card_allocations_YYYYMMDD_HHMMSS`
pub fn default_stem(now: DateTime<Local>) -> String {
    format!("credit_card_allocations_{}", now.format("%Y%m%d_%H%M%S"))
}

#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub enhanced: PathBuf,
    pub basic: PathBuf,
    pub summary: PathBuf,
    pub entity_totals: PathBuf,
}

fn write_file(path: &Path, table: &ExportTable) -> Result<()> {
    let file = std::fs::File::create(path)?;
    table.write_csv(std::io::BufWriter::new(file))?;
    tracing::info!(path = %path.display(), rows = table.rows.len(), "wrote export");
    Ok(())
}

/// Write all four artifacts into `out_dir`
pub fn write_all(processed: &ProcessedStatement, out_dir: &Path, stem: &str) -> Result<ExportPaths> {
    std::fs::create_dir_all(out_dir)?;

    let paths = ExportPaths {
        enhanced: out_dir.join(format!("{}_enhanced.csv", stem)),
        basic: out_dir.join(format!("{}_allocations.csv", stem)),
        summary: out_dir.join(format!("{}_summary.csv", stem)),
        entity_totals: out_dir.join(format!("{}_entity_totals.csv", stem)),
    };

    write_file(&paths.enhanced, &processed.formula_table())?;
    write_file(&paths.basic, &basic_table(processed))?;
    write_file(&paths.summary, &summary_table(processed))?;
    write_file(&paths.entity_totals, &entity_totals_table(processed))?;

    Ok(paths)
}

// ============================================================================
// TESTS
// ============================================================================
