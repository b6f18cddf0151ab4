// 🔁 Pipeline - raw table → amount source → allocation → validation
//
// Structural failures (no amount source, invalid config, strict numeric errors)
// stop here, before any allocation exists, so nothing can be exported.

use crate::allocation::{AllocationEngine, AllocationRow};
use crate::config::AllocatorConfig;
use crate::entities::EntitySet;
use crate::error::{AllocatorError, Result};
use crate::formula::{project_formulas, ColumnLayout, FormulaTable};
use crate::resolver::{resolve_with_override, AmountPolicy, AmountSource, CoercionReport};
use crate::table::TransactionTable;
use crate::validation::{validate, ValidationSummary};
use std::path::Path;

/// Everything derived from one statement
#[derive(Debug, Clone)]
pub struct ProcessedStatement {
    /// Working copy of the input
    pub table: TransactionTable,
    pub entities: EntitySet,
    pub policy: AmountPolicy,
    pub source: AmountSource,
    /// Sheet layout shared by every export
    pub layout: ColumnLayout,
    pub rows: Vec<AllocationRow>,
    pub coercions: CoercionReport,
    pub summary: ValidationSummary,
}

impl ProcessedStatement {
    /// Formula-annotated variant for the enhanced export
    pub fn formula_table(&self) -> FormulaTable {
        project_formulas(&self.table, &self.rows, &self.layout, &self.entities)
    }

    /// Manually re-split one row, then recompute the validation snapshot
    pub fn set_allocation(&mut self, row: usize, entity: &str, value: f64) -> Result<()> {
        let count = self.rows.len();
        let target = self.rows.get_mut(row).ok_or_else(|| {
            AllocatorError::InvalidTable(format!("row {} out of range ({} rows)", row, count))
        })?;
        target.set_entity_value(&self.entities, entity, value)?;
        self.summary = validate(&self.rows, &self.entities);
        Ok(())
    }
}

/// Run the full pipeline on an already-parsed table
pub fn process(table: &TransactionTable, config: &AllocatorConfig) -> Result<ProcessedStatement> {
    config.validate()?;

    let source = resolve_with_override(table, config.amount_policy, config.amount_column.as_deref())?;
    let layout = ColumnLayout::for_export(table, &source, &config.entities)?;

    let engine = AllocationEngine::new(config.entities.clone())
        .with_invalid_numeric_policy(config.on_invalid_numeric);
    let allocation = engine.allocate(table, &source)?;
    let summary = validate(&allocation.rows, &config.entities);

    Ok(ProcessedStatement {
        table: table.clone(),
        entities: config.entities.clone(),
        policy: config.amount_policy,
        source,
        layout,
        rows: allocation.rows,
        coercions: allocation.coercions,
        summary,
    })
}

/// Load a CSV statement from disk and process it
pub fn process_file(path: &Path, config: &AllocatorConfig) -> Result<ProcessedStatement> {
    let table = TransactionTable::load_csv(path)?;
    process(&table, config)
}
