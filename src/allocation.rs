// 💰 Allocation Engine - Split each transaction across entities
//
// Default policy: the default entity receives 100% of the amount (charges and
// credits alike), every other entity gets 0.0.
//
// Row invariants:
//   total_allocated  = Σ entity_values
//   allocation_check = source_amount - total_allocated
// Both are computed on read, so they cannot drift from the entity values.

use crate::entities::EntitySet;
use crate::error::{AllocatorError, Result};
use crate::resolver::{read_amounts, AmountSource, CoercionReport, InvalidNumericPolicy};
use crate::table::TransactionTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-decimal currency tolerance used for every balance judgment
pub const BALANCE_TOLERANCE: f64 = 0.01;

pub fn is_balanced(check: f64) -> bool {
    check.abs() < BALANCE_TOLERANCE
}

// ============================================================================
// ALLOCATION STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AllocationStatus {
    Balanced,
    /// Signed discrepancy (source amount minus total allocated)
    OffBy(f64),
}

impl AllocationStatus {
    pub fn from_check(check: f64) -> Self {
        if is_balanced(check) {
            AllocationStatus::Balanced
        } else {
            AllocationStatus::OffBy(check)
        }
    }

    pub fn is_balanced(&self) -> bool {
        matches!(self, AllocationStatus::Balanced)
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationStatus::Balanced => write!(f, "Balanced"),
            AllocationStatus::OffBy(amount) => write!(f, "Off by ${:.2}", amount),
        }
    }
}

// ============================================================================
// ALLOCATION ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRow {
    /// Index of the row in the source table
    pub source_row: usize,

    pub source_amount: f64,

    /// One value per entity, in entity-set order
    entity_values: Vec<f64>,

    trigger_index: Option<usize>,
}

impl AllocationRow {
    /// Default allocation: everything to the default entity
    pub fn with_default_allocation(source_row: usize, source_amount: f64, entities: &EntitySet) -> Self {
        let mut entity_values = vec![0.0; entities.len()];
        entity_values[entities.default_index()] = source_amount;

        AllocationRow {
            source_row,
            source_amount,
            entity_values,
            trigger_index: entities.trigger_index(),
        }
    }

    pub fn entity_values(&self) -> &[f64] {
        &self.entity_values
    }

    pub fn entity_value(&self, entities: &EntitySet, name: &str) -> Option<f64> {
        entities
            .index_of(name)
            .and_then(|i| self.entity_values.get(i).copied())
    }

    /// Manually re-allocate part of the amount to an entity
    pub fn set_entity_value(&mut self, entities: &EntitySet, name: &str, value: f64) -> Result<()> {
        let index = entities
            .index_of(name)
            .ok_or_else(|| AllocatorError::InvalidEntitySet(format!("unknown entity '{}'", name)))?;
        self.entity_values[index] = value;
        Ok(())
    }

    pub fn total_allocated(&self) -> f64 {
        self.entity_values.iter().sum()
    }

    pub fn allocation_check(&self) -> f64 {
        self.source_amount - self.total_allocated()
    }

    pub fn status(&self) -> AllocationStatus {
        AllocationStatus::from_check(self.allocation_check())
    }

    pub fn is_balanced(&self) -> bool {
        is_balanced(self.allocation_check())
    }

    /// True when the trigger entity carries a non-zero share
    pub fn property_flag(&self) -> bool {
        self.trigger_index
            .and_then(|i| self.entity_values.get(i))
            .map(|v| *v != 0.0)
            .unwrap_or(false)
    }
}

// ============================================================================
// ALLOCATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub rows: Vec<AllocationRow>,
    pub coercions: CoercionReport,
}

// ============================================================================
// ALLOCATION ENGINE
// ============================================================================

pub struct AllocationEngine {
    pub entities: EntitySet,
    pub on_invalid_numeric: InvalidNumericPolicy,
}

impl AllocationEngine {
    pub fn new(entities: EntitySet) -> Self {
        AllocationEngine {
            entities,
            on_invalid_numeric: InvalidNumericPolicy::Zero,
        }
    }

    pub fn with_invalid_numeric_policy(mut self, policy: InvalidNumericPolicy) -> Self {
        self.on_invalid_numeric = policy;
        self
    }

    /// Allocate every row of `table` using the resolved amount source
    ///
    /// Order-preserving and row-independent; nothing in `table` is modified.
    pub fn allocate(&self, table: &TransactionTable, source: &AmountSource) -> Result<Allocation> {
        self.entities.validate()?;

        let resolved = read_amounts(table, source, self.on_invalid_numeric)?;
        let rows = allocate_amounts(&resolved.amounts, &self.entities);

        tracing::info!(
            rows = rows.len(),
            default_entity = %self.entities.default_entity,
            "allocated transactions"
        );

        Ok(Allocation {
            rows,
            coercions: resolved.report,
        })
    }
}

/// Convenience wrapper around `AllocationEngine` with the default coercion policy
pub fn allocate(
    table: &TransactionTable,
    source: &AmountSource,
    entities: &EntitySet,
) -> Result<Allocation> {
    AllocationEngine::new(entities.clone()).allocate(table, source)
}

/// Pure map from `(source_row, amount)` pairs to default allocations
pub fn allocate_amounts(amounts: &[(usize, f64)], entities: &EntitySet) -> Vec<AllocationRow> {
    amounts
        .iter()
        .map(|&(row, amount)| AllocationRow::with_default_allocation(row, amount, entities))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
