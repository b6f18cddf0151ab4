use statement_allocator::export::{basic_table, write_all};
use statement_allocator::*;
use std::fs;
use std::io::Write;
use std::path::Path;

fn write_csv(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

const CHASE_STYLE: &str = "\
Transaction Date,Post Date,Description,Category,Type,Amount,Memo
01/02/2025,01/03/2025,PAYMENT THANK YOU,,Payment,-150.00,
01/05/2025,01/06/2025,HOME DEPOT #0412,Home,Sale,42.50,
01/07/2025,01/08/2025,SHELL OIL 5745,Gas,Sale,61.20,fleet
";

#[test]
fn test_end_to_end_exports() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "statement.csv", CHASE_STYLE);

    let processed = process_file(&csv, &AllocatorConfig::default()).unwrap();
    assert_eq!(processed.source.describe(), "Amount");
    assert_eq!(processed.rows.len(), 3);
    assert!(processed.summary.is_balanced());

    let out = dir.path().join("out");
    let paths = write_all(&processed, &out, "run").unwrap();

    let enhanced = fs::read_to_string(&paths.enhanced).unwrap();
    let lines: Vec<&str> = enhanced.lines().collect();
    // header + 3 rows + TOTALS
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("Transaction Date,Post Date,Description,Category,Type,Amount,Memo,Panola Holdings LLC"));
    assert!(lines[0].ends_with("Total_Allocated,Allocation_Check,Allocation_Status,Property"));
    // originals A..G, entities H..M, Total_Allocated N, check O, status P, property Q
    assert!(lines[1].contains("=SUM(H2:M2),=F2-N2,"));
    assert!(lines[4].starts_with("TOTALS,"));
    assert!(lines[4].contains("=SUM(F2:F4)"));

    let basic = fs::read_to_string(&paths.basic).unwrap();
    assert_eq!(basic.lines().count(), 4);
    assert!(basic.contains("-150.00,0.00,0.00,0.00,0.00,0.00,-150.00,0.00,Balanced,"));

    let summary = fs::read_to_string(&paths.summary).unwrap();
    assert!(summary.contains("Total Transactions,3"));
    assert!(summary.contains("Amount Column Used,Amount"));

    let entity_totals = fs::read_to_string(&paths.entity_totals).unwrap();
    assert_eq!(entity_totals.lines().count(), 7);
}

#[test]
fn test_credit_row_default_allocation() {
    let table = TransactionTable::from_reader(
        "Date,Description,Amount\n01/02/2025,PAYMENT,-150.00\n".as_bytes(),
        "payment.csv",
    )
    .unwrap();
    let processed = process(&table, &AllocatorConfig::default()).unwrap();
    let row = &processed.rows[0];

    assert_eq!(row.entity_values(), &[-150.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(row.allocation_check(), 0.0);
    assert_eq!(row.status().to_string(), "Balanced");
}

#[test]
fn test_positional_pair_scenario() {
    let csv = "\
Date,Posted,Description,Debit,Credit,Card
01/02/2025,01/03/2025,REFUNDED ORDER,100.00,-30.00,4411
";
    let table = TransactionTable::from_reader(csv.as_bytes(), "pair.csv").unwrap();
    let config = AllocatorConfig::default().with_policy(AmountPolicy::PositionalPair);
    let processed = process(&table, &config).unwrap();

    assert!(processed.source.is_pair());
    let row = &processed.rows[0];
    assert!((row.source_amount - 70.0).abs() < 1e-9);
    assert_eq!(
        row.entity_value(&processed.entities, "Panola Holdings LLC"),
        Some(row.source_amount)
    );
    assert!(row.is_balanced());

    let formulas = processed.formula_table();
    let check = formulas.column("Allocation_Check").unwrap();
    let status = formulas.column("Allocation_Status").unwrap();
    // originals A..F, entities G..L, Total_Allocated M, check N
    assert_eq!(formulas.rows[0][check], "=D2+E2-M2");
    assert_eq!(formulas.rows[1][check], "=D3+E3-M3");
    assert_eq!(
        formulas.rows[1][status],
        "=IF(ABS(N3)<0.01,\"Balanced\",\"Off by $\"&ROUND(N3,2))"
    );
    assert_eq!(formulas.rows[1][3], "=SUM(D2:D2)");
    assert_eq!(formulas.rows[1][4], "=SUM(E2:E2)");
}

#[test]
fn test_manual_split_scenario() {
    let table = TransactionTable::from_reader(
        "Date,Description,Amount\n01/05/2025,HOME DEPOT,42.50\n".as_bytes(),
        "split.csv",
    )
    .unwrap();
    let mut processed = process(&table, &AllocatorConfig::default()).unwrap();

    processed.set_allocation(0, "Panola Holdings LLC", 20.0).unwrap();
    processed.set_allocation(0, "RLV22 LLC", 22.5).unwrap();

    let row = &processed.rows[0];
    assert!((row.total_allocated() - 42.5).abs() < 1e-9);
    assert!(row.allocation_check().abs() < 1e-9);
    assert!(row.property_flag());
    assert!(processed.summary.is_balanced());
}

#[test]
fn test_unresolvable_amount_produces_no_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "memo.csv", "Date,Memo\n01/02/2025,coffee\n");
    let out = dir.path().join("out");

    let result = process_file(&csv, &AllocatorConfig::default())
        .and_then(|processed| write_all(&processed, &out, "run"));

    assert!(matches!(result, Err(AllocatorError::AmountColumnNotFound { .. })));
    assert!(!out.exists());
}

#[test]
fn test_malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "bad.csv", "Date,Amount\n01/02/2025,5.00,extra\n");

    let err = process_file(&csv, &AllocatorConfig::default()).unwrap_err();
    assert!(matches!(err, AllocatorError::Parse { .. }));
    assert!(!err.is_recoverable());
}

#[test]
fn test_idempotent_processing() {
    let table = TransactionTable::from_reader(CHASE_STYLE.as_bytes(), "chase.csv").unwrap();
    let config = AllocatorConfig::default();

    let first = process(&table, &config).unwrap();
    let second = process(&table, &config).unwrap();

    assert_eq!(first.rows, second.rows);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.formula_table(), second.formula_table());
}

fn reparse(table: &ExportTable, name: &str) -> TransactionTable {
    let mut out = Vec::new();
    table.write_csv(&mut out).unwrap();
    TransactionTable::from_reader(out.as_slice(), name).unwrap()
}

#[test]
fn test_reprocess_basic_export() {
    let table = TransactionTable::from_reader(CHASE_STYLE.as_bytes(), "chase.csv").unwrap();
    let config = AllocatorConfig::default();
    let first = process(&table, &config).unwrap();

    let exported = reparse(&basic_table(&first), "allocations.csv");
    assert_eq!(exported.column_count(), 17);

    let second = process(&exported, &config).unwrap();
    assert_eq!(second.layout.columns, (0..7).collect::<Vec<_>>());
    assert_eq!(second.rows, first.rows);
    assert_eq!(basic_table(&second), basic_table(&first));
    assert_eq!(second.formula_table(), first.formula_table());

    // the enhanced export of the re-run parses back too
    let enhanced = reparse(&second.formula_table(), "enhanced.csv");
    assert_eq!(enhanced.headers().iter().filter(|h| h.as_str() == "Total_Allocated").count(), 1);

    println!("✅ A basic export can be processed again");
}

#[test]
fn test_input_with_entity_and_check_columns() {
    let csv = "Date,Amount,Panola Holdings LLC,Total_Allocated\n01/05/2025,42.50,10.00,10.00\n";
    let table = TransactionTable::from_reader(csv.as_bytes(), "prior.csv").unwrap();
    let processed = process(&table, &AllocatorConfig::default()).unwrap();

    let basic = reparse(&basic_table(&processed), "allocations.csv");
    assert_eq!(basic.column_count(), 12);
    assert_eq!(basic.raw(0, basic.column_index("Panola Holdings LLC").unwrap()), "42.50");
    assert_eq!(basic.raw(0, basic.column_index("Total_Allocated").unwrap()), "42.50");

    let enhanced = reparse(&processed.formula_table(), "enhanced.csv");
    assert_eq!(enhanced.column_count(), 12);
    assert_eq!(enhanced.len(), 2);
}

#[test]
fn test_amount_column_clashing_with_generated_column() {
    let csv = "Date,Total_Allocated\n01/05/2025,42.50\n";
    let table = TransactionTable::from_reader(csv.as_bytes(), "clash.csv").unwrap();
    let config = AllocatorConfig::default().with_amount_column("Total_Allocated");

    let err = process(&table, &config).unwrap_err();
    assert!(matches!(err, AllocatorError::InvalidTable(_)));
}

#[test]
fn test_custom_entities_through_pipeline() {
    let entities = EntitySet::new(
        vec!["Alpha LLC".to_string(), "Beta LLC".to_string()],
        "Beta LLC",
        "Alpha LLC",
    )
    .unwrap();
    let config = AllocatorConfig::default().with_entities(entities);
    let table = TransactionTable::from_reader(CHASE_STYLE.as_bytes(), "chase.csv").unwrap();
    let processed = process(&table, &config).unwrap();

    assert_eq!(processed.rows[1].entity_values(), &[0.0, 42.5]);
    assert!(!processed.rows[1].property_flag());
    assert_eq!(processed.summary.entity_totals.len(), 2);

    let formulas = processed.formula_table();
    assert_eq!(formulas.headers.len(), 7 + 2 + 4);
    // originals A..G, entities H..I, Total_Allocated J, property M
    assert_eq!(formulas.rows[0][9], "=SUM(H2:I2)");
    assert_eq!(formulas.rows[0][12], "=IF(H2<>0,\"Required\",\"\")");
}
