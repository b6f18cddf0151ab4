// 🏢 Entity Set - Who a transaction can be allocated to
//
// The entity list is ordered: that order defines the entity column order in
// every export and the contiguous cell range used by SUM formulas.

use crate::error::{AllocatorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const PANOLA_HOLDINGS: &str = "Panola Holdings LLC";
pub const ROBERT_DOW_PERSONAL: &str = "Robert Dow (Personal)";
pub const RLV22: &str = "RLV22 LLC";
pub const CSD_VAN_ZANDT: &str = "CSD Van Zandt LLC";
pub const GOODFIRE_REALTY: &str = "Goodfire Realty LLC";
pub const NDRE_III: &str = "NDRE III LLC";

/// The six entities in export order
pub const STANDARD_ENTITIES: [&str; 6] = [
    PANOLA_HOLDINGS,
    ROBERT_DOW_PERSONAL,
    RLV22,
    CSD_VAN_ZANDT,
    GOODFIRE_REALTY,
    NDRE_III,
];

// ============================================================================
// ENTITY SET
// ============================================================================

/// Ordered entity configuration passed into the allocation engine
///
/// - `default_entity` receives 100% of every amount
/// - `trigger_entity` drives the "Property" flag when its share is non-zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySet {
    pub names: Vec<String>,
    pub default_entity: String,
    pub trigger_entity: String,
}

impl EntitySet {
    /// Build and validate an entity set
    pub fn new(names: Vec<String>, default_entity: &str, trigger_entity: &str) -> Result<Self> {
        let set = EntitySet {
            names,
            default_entity: default_entity.to_string(),
            trigger_entity: trigger_entity.to_string(),
        };
        set.validate()?;
        Ok(set)
    }

    /// The fixed six-entity configuration
    pub fn standard() -> Self {
        EntitySet {
            names: STANDARD_ENTITIES.iter().map(|s| s.to_string()).collect(),
            default_entity: PANOLA_HOLDINGS.to_string(),
            trigger_entity: RLV22.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.names.is_empty() {
            return Err(AllocatorError::InvalidEntitySet(
                "at least one entity is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.names {
            if name.trim().is_empty() {
                return Err(AllocatorError::InvalidEntitySet(
                    "entity names must not be blank".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(AllocatorError::InvalidEntitySet(format!(
                    "duplicate entity '{}'",
                    name
                )));
            }
        }

        if self.index_of(&self.default_entity).is_none() {
            return Err(AllocatorError::InvalidEntitySet(format!(
                "default entity '{}' is not in the entity list",
                self.default_entity
            )));
        }
        if self.index_of(&self.trigger_entity).is_none() {
            return Err(AllocatorError::InvalidEntitySet(format!(
                "trigger entity '{}' is not in the entity list",
                self.trigger_entity
            )));
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn default_index(&self) -> usize {
        self.index_of(&self.default_entity).unwrap_or(0)
    }

    pub fn trigger_index(&self) -> Option<usize> {
        self.index_of(&self.trigger_entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }
}

impl Default for EntitySet {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_entity_order() {
        let entities = EntitySet::standard();

        assert_eq!(entities.len(), 6);
        assert_eq!(entities.names[0], "Panola Holdings LLC");
        assert_eq!(entities.names[5], "NDRE III LLC");
        assert_eq!(entities.default_index(), 0);
        assert_eq!(entities.trigger_index(), Some(2));
        assert!(entities.validate().is_ok());
    }

    #[test]
    fn test_custom_entity_set() {
        let entities = EntitySet::new(
            vec!["Alpha".to_string(), "Beta".to_string()],
            "Beta",
            "Alpha",
        )
        .unwrap();

        assert_eq!(entities.default_index(), 1);
        assert_eq!(entities.trigger_index(), Some(0));
    }

    #[test]
    fn test_rejects_unknown_default_entity() {
        let result = EntitySet::new(vec!["Alpha".to_string()], "Gamma", "Alpha");
        assert!(matches!(result, Err(AllocatorError::InvalidEntitySet(_))));
    }

    #[test]
    fn test_rejects_duplicates() {
        let result = EntitySet::new(
            vec!["Alpha".to_string(), "Alpha".to_string()],
            "Alpha",
            "Alpha",
        );
        assert!(result.is_err());

        println!("✅ Duplicate entity names rejected");
    }
}
