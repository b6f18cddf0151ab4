// Statement Allocator - Core Library
// Splits credit-card statement transactions across entities and checks the split

pub mod error;
pub mod config;
pub mod entities;
pub mod table;
pub mod resolver;       // Column Resolver - where the amount lives
pub mod allocation;     // Allocation Engine - default split per row
pub mod validation;     // Validator - aggregate balance checks
pub mod formula;        // Formula Projector - spreadsheet formulas for export
pub mod export;
pub mod pipeline;

// Re-export commonly used types
pub use error::{AllocatorError, Result};
pub use config::AllocatorConfig;
pub use entities::{EntitySet, STANDARD_ENTITIES};
pub use table::{CellValue, TransactionTable};
pub use resolver::{
    resolve_amount_source, resolve_with_override, parse_amount, read_amounts,
    AmountPolicy, AmountSource, InvalidNumericPolicy, CoercedCell, CoercionReport,
};
pub use allocation::{
    allocate, allocate_amounts, is_balanced,
    Allocation, AllocationEngine, AllocationRow, AllocationStatus, BALANCE_TOLERANCE,
};
pub use validation::{validate, percentage_of, EntityTotal, ValidationSummary};
pub use formula::{
    letter_to_num, num_to_letter, project_formulas,
    AmountColumns, ColumnLayout, FormulaTable,
};
pub use export::{ExportPaths, ExportTable};
pub use pipeline::{process, process_file, ProcessedStatement};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
