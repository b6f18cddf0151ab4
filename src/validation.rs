// ✅ Validator - Aggregate balance checks across all rows
//
//   grand_total_check = Σ source_amount - Σ total_allocated
//
// Under the unmodified default policy this is ~0. Manual re-allocations that
// don't preserve the per-row sum show up here and in `unbalanced_count`.

use crate::allocation::{is_balanced, AllocationRow};
use crate::entities::EntitySet;
use serde::{Deserialize, Serialize};

// ============================================================================
// ENTITY TOTALS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTotal {
    pub entity: String,
    pub total: f64,
    /// Share of the grand transaction total (0.0 when that total is 0)
    pub percentage: f64,
    /// Rows where this entity's allocation is non-zero
    pub transaction_count: usize,
}

/// `part / whole * 100`, or 0.0 for a zero whole
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

// ============================================================================
// VALIDATION SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub row_count: usize,
    pub unbalanced_count: usize,
    /// Σ allocation_check over unbalanced rows only
    pub total_unallocated: f64,
    /// Entity-set order
    pub entity_totals: Vec<EntityTotal>,
    pub total_transactions: f64,
    pub total_allocated: f64,
    pub grand_total_check: f64,
    /// Positions (in the allocation output) of rows needing review
    pub unbalanced_rows: Vec<usize>,
}

impl ValidationSummary {
    pub fn is_balanced(&self) -> bool {
        self.unbalanced_count == 0 && is_balanced(self.grand_total_check)
    }

    pub fn entity_total(&self, entity: &str) -> Option<f64> {
        self.entity_totals
            .iter()
            .find(|t| t.entity == entity)
            .map(|t| t.total)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} transactions, total ${:.2}, allocated ${:.2}, check ${:.2}, {} unbalanced",
            self.row_count,
            self.total_transactions,
            self.total_allocated,
            self.grand_total_check,
            self.unbalanced_count
        )
    }
}

/// Build the validation snapshot for a set of allocated rows
pub fn validate(rows: &[AllocationRow], entities: &EntitySet) -> ValidationSummary {
    let mut unbalanced_rows = Vec::new();
    let mut total_unallocated = 0.0;

    for (i, row) in rows.iter().enumerate() {
        let check = row.allocation_check();
        if !is_balanced(check) {
            unbalanced_rows.push(i);
            total_unallocated += check;
        }
    }

    let total_transactions: f64 = rows.iter().map(|r| r.source_amount).sum();
    let total_allocated: f64 = rows.iter().map(|r| r.total_allocated()).sum();

    let entity_totals = entities
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values = rows.iter().filter_map(|r| r.entity_values().get(i).copied());
            let total: f64 = values.clone().sum();
            EntityTotal {
                entity: name.to_string(),
                total,
                percentage: percentage_of(total, total_transactions),
                transaction_count: values.filter(|v| *v != 0.0).count(),
            }
        })
        .collect();

    let summary = ValidationSummary {
        row_count: rows.len(),
        unbalanced_count: unbalanced_rows.len(),
        total_unallocated,
        entity_totals,
        total_transactions,
        total_allocated,
        grand_total_check: total_transactions - total_allocated,
        unbalanced_rows,
    };

    if summary.unbalanced_count > 0 {
        tracing::warn!(
            unbalanced = summary.unbalanced_count,
            unallocated = summary.total_unallocated,
            "transactions need allocation review"
        );
    } else {
        tracing::info!(rows = summary.row_count, "all transactions balanced");
    }

    summary
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate_amounts;
    use crate::entities::{GOODFIRE_REALTY, PANOLA_HOLDINGS, RLV22};

    #[test]
    fn test_default_allocation_balances() {
        let entities = EntitySet::standard();
        let rows = allocate_amounts(&[(0, 100.0), (1, -150.0), (2, 42.5)], &entities);
        let summary = validate(&rows, &entities);

        assert_eq!(summary.row_count, 3);
        assert_eq!(summary.unbalanced_count, 0);
        assert_eq!(summary.total_unallocated, 0.0);
        assert!((summary.total_transactions - -7.5).abs() < 1e-9);
        assert!((summary.total_allocated - -7.5).abs() < 1e-9);
        assert!(summary.grand_total_check.abs() < 1e-9);
        assert!(summary.is_balanced());
        assert_eq!(summary.entity_total(PANOLA_HOLDINGS), Some(summary.total_transactions));
        assert_eq!(summary.entity_total(RLV22), Some(0.0));
        assert_eq!(summary.entity_totals[0].transaction_count, 3);
        assert_eq!(summary.entity_totals[2].transaction_count, 0);
    }

    #[test]
    fn test_unbalanced_rows() {
        let entities = EntitySet::standard();
        let mut rows = allocate_amounts(&[(0, 100.0), (1, 50.0), (2, 20.0)], &entities);

        rows[0].set_entity_value(&entities, PANOLA_HOLDINGS, 60.0).unwrap();
        rows[0].set_entity_value(&entities, GOODFIRE_REALTY, 30.0).unwrap();
        rows[2].set_entity_value(&entities, PANOLA_HOLDINGS, 25.0).unwrap();

        let summary = validate(&rows, &entities);

        assert_eq!(summary.unbalanced_count, 2);
        assert_eq!(summary.unbalanced_rows, vec![0, 2]);
        assert!((summary.total_unallocated - 5.0).abs() < 1e-9); // +10 and -5
        assert!((summary.grand_total_check - 5.0).abs() < 1e-9);
        assert!(!summary.is_balanced());
        assert_eq!(summary.entity_total(GOODFIRE_REALTY), Some(30.0));
    }

    #[test]
    fn test_sub_cent_difference_is_balanced() {
        let entities = EntitySet::standard();
        let mut rows = allocate_amounts(&[(0, 10.0)], &entities);
        rows[0].set_entity_value(&entities, PANOLA_HOLDINGS, 9.995).unwrap();

        let summary = validate(&rows, &entities);
        assert_eq!(summary.unbalanced_count, 0);
    }

    #[test]
    fn test_empty_rows() {
        let entities = EntitySet::standard();
        let summary = validate(&[], &entities);

        assert_eq!(summary.row_count, 0);
        assert_eq!(summary.total_transactions, 0.0);
        assert_eq!(summary.grand_total_check, 0.0);
        assert_eq!(summary.entity_totals.len(), 6);
        assert!(summary.entity_totals.iter().all(|t| t.percentage == 0.0));
    }

    #[test]
    fn test_percentage_zero_total() {
        let entities = EntitySet::standard();
        let rows = allocate_amounts(&[(0, 25.0), (1, -25.0)], &entities);
        let summary = validate(&rows, &entities);

        assert_eq!(summary.total_transactions, 0.0);
        for total in &summary.entity_totals {
            assert_eq!(total.percentage, 0.0);
            assert!(!total.percentage.is_nan());
        }

        assert_eq!(percentage_of(25.0, 100.0), 25.0);
        assert_eq!(percentage_of(5.0, 0.0), 0.0);

        println!("✅ Zero grand total reports 0% for every entity");
    }
}
