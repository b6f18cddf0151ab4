// ⚙️ Allocator Configuration
// Loaded from JSON; every field is optional and falls back to the defaults below.
//
// {
//   "amount_policy": "positional_pair",
//   "on_invalid_numeric": "skip",
//   "amount_column": "Debit",
//   "entities": {
//     "names": ["Panola Holdings LLC", "RLV22 LLC"],
//     "default_entity": "Panola Holdings LLC",
//     "trigger_entity": "RLV22 LLC"
//   }
// }

use crate::entities::EntitySet;
use crate::error::Result;
use crate::resolver::{AmountPolicy, InvalidNumericPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AllocatorConfig {
    pub entities: EntitySet,
    pub amount_policy: AmountPolicy,
    pub on_invalid_numeric: InvalidNumericPolicy,
    /// Manual amount column; wins over `amount_policy`
    pub amount_column: Option<String>,
}

impl AllocatorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: AllocatorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "loaded allocator config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.entities.validate()
    }

    pub fn with_policy(mut self, policy: AmountPolicy) -> Self {
        self.amount_policy = policy;
        self
    }

    pub fn with_invalid_numeric(mut self, policy: InvalidNumericPolicy) -> Self {
        self.on_invalid_numeric = policy;
        self
    }

    pub fn with_amount_column(mut self, column: impl Into<String>) -> Self {
        self.amount_column = Some(column.into());
        self
    }

    pub fn with_entities(mut self, entities: EntitySet) -> Self {
        self.entities = entities;
        self
    }
}
