use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use statement_allocator::export::{default_stem, format_currency, write_all};
use statement_allocator::{
    process, resolve_with_override, AllocatorConfig, AllocatorError, AmountPolicy,
    InvalidNumericPolicy, TransactionTable,
};

#[derive(Parser)]
#[command(author, version, about = "Credit card statement allocator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate a statement CSV and write the export files
    Process {
        csv: PathBuf,
        /// JSON config file (entities, policies)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Use this column as the amount, skipping detection
        #[arg(long = "amount-column")]
        amount_column: Option<String>,
        /// named-column | fixed-name | positional-pair
        #[arg(long)]
        policy: Option<AmountPolicy>,
        /// zero | error | skip
        #[arg(long = "on-invalid-numeric")]
        on_invalid_numeric: Option<InvalidNumericPolicy>,
        #[arg(long = "out-dir", default_value = ".")]
        out_dir: PathBuf,
    },
    /// Show which column would be used as the amount
    Detect {
        csv: PathBuf,
        #[arg(long)]
        policy: Option<AmountPolicy>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            csv,
            config,
            amount_column,
            policy,
            on_invalid_numeric,
            out_dir,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(policy) = policy {
                config = config.with_policy(policy);
            }
            if let Some(on_invalid) = on_invalid_numeric {
                config = config.with_invalid_numeric(on_invalid);
            }
            if let Some(column) = amount_column {
                config = config.with_amount_column(column);
            }
            run_process(&csv, &config, &out_dir)
        }
        Commands::Detect { csv, policy } => run_detect(&csv, policy.unwrap_or_default()),
    }
}

fn load_config(path: Option<&Path>) -> Result<AllocatorConfig> {
    match path {
        Some(path) => AllocatorConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(AllocatorConfig::default()),
    }
}

fn run_process(csv: &Path, config: &AllocatorConfig, out_dir: &Path) -> Result<()> {
    println!("💳 Credit Card Statement Allocator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading CSV...");
    let table = TransactionTable::load_csv(csv)
        .with_context(|| format!("Failed to read statement: {}", csv.display()))?;
    println!("✓ Loaded {} transactions", table.len());

    let processed = match process(&table, config) {
        Ok(processed) => processed,
        Err(e) if e.is_recoverable() => {
            eprintln!("❌ {}", e);
            eprintln!("   Re-run with --amount-column <NAME> to choose the amount column.");
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Failed to process statement"),
    };

    println!("✓ Amount column: {} ({})", processed.source.describe(), processed.policy);
    if !processed.coercions.is_clean() {
        println!(
            "⚠️  {} non-numeric amount cells ({} rows skipped)",
            processed.coercions.count(),
            processed.coercions.skipped_rows.len()
        );
    }

    let summary = &processed.summary;
    println!("\n🏢 Entity Allocation Summary");
    for total in &summary.entity_totals {
        println!(
            "   • {}: {} ({:.1}%, {} transactions)",
            total.entity,
            format_currency(total.total),
            total.percentage,
            total.transaction_count
        );
    }

    println!("\n✅ Validation Summary");
    println!("   Total Amount:    {}", format_currency(summary.total_transactions));
    println!("   Total Allocated: {}", format_currency(summary.total_allocated));
    println!("   Grand Total Check: ${:.2}", summary.grand_total_check);
    if summary.unbalanced_count == 0 {
        println!("🎉 All {} transactions are properly allocated!", summary.row_count);
    } else {
        println!("⚠️  {} transactions need allocation review", summary.unbalanced_count);
    }

    let stem = default_stem(chrono::Local::now());
    let paths = write_all(&processed, out_dir, &stem)
        .with_context(|| format!("Failed to write exports to {}", out_dir.display()))?;

    println!("\n📥 Exports");
    println!("   {}", paths.enhanced.display());
    println!("   {}", paths.basic.display());
    println!("   {}", paths.summary.display());
    println!("   {}", paths.entity_totals.display());

    Ok(())
}

fn run_detect(csv: &Path, policy: AmountPolicy) -> Result<()> {
    let table = TransactionTable::load_csv(csv)
        .with_context(|| format!("Failed to read statement: {}", csv.display()))?;

    match resolve_with_override(&table, policy, None) {
        Ok(source) => {
            println!("✅ Detected amount column: {} ({})", source.describe(), policy);
            Ok(())
        }
        Err(AllocatorError::AmountColumnNotFound { columns }) => {
            eprintln!("❌ Could not detect an amount column. Available columns:");
            for column in columns {
                eprintln!("   • {}", column);
            }
            std::process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}
