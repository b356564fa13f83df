//! Veil CLI
//!
//! Command-line interface for the Veil stealth payment protocol.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use veil_balance::{BalanceAggregator, StaticCatalog};
use veil_registry::{MemoryBalanceSource, MemoryLedger, MemoryNameRegistry};
use veil_scanner::{SyncConfig, SyncEngine};
use veil_stealth::{
    pay_to_name, pay_to_public_key, pay_to_receiving_address, IdentitySnapshot, MetaAccountStore,
    StealthPayment,
};

/// Veil - stealth address payments with ledger-scan recovery
#[derive(Parser)]
#[command(name = "veil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a meta key pair from a wallet-signature seed
    Generate {
        /// Wallet identity string the key belongs to
        #[arg(short, long)]
        identity: String,
        /// Seed bytes (the wallet signature)
        #[arg(short, long)]
        seed: String,
        /// Password sealing the snapshot file
        #[arg(short, long, env = "VEIL_PASSWORD")]
        password: String,
        /// Output file for the sealed snapshot (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rotate the receiving address of a stored identity
    Rotate {
        /// Path to the sealed snapshot file
        #[arg(short, long)]
        keys: PathBuf,
        /// Password for the snapshot file
        #[arg(short, long, env = "VEIL_PASSWORD")]
        password: String,
    },

    /// Derive a one-time payment destination for a recipient
    Pay {
        /// Recipient: a veil... receiving address string
        recipient: String,
    },

    /// Run the full payment cycle against in-process collaborators
    Demo,

    /// Benchmark scanning throughput
    Bench {
        /// Number of ledger events to generate
        #[arg(short, long, default_value = "10000")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "veil=debug,info"
    } else {
        "veil=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Generate {
            identity,
            seed,
            password,
            output,
        } => cmd_generate(&identity, &seed, &password, output).await,
        Commands::Rotate { keys, password } => cmd_rotate(&keys, &password).await,
        Commands::Pay { recipient } => cmd_pay(&recipient).await,
        Commands::Demo => cmd_demo().await,
        Commands::Bench { count } => cmd_bench(count).await,
    }
}

/// Generate a meta key pair and seal it to disk
async fn cmd_generate(
    identity: &str,
    seed: &str,
    password: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    println!("{}", "🔑 Generating Veil meta key...".cyan().bold());

    let store = MetaAccountStore::new();
    let address = store
        .generate(seed.as_bytes(), identity)
        .context("Key generation failed")?;

    println!("\n{}", "✅ Meta key generated:".green().bold());
    println!("   {} {}", "Identity:".dimmed(), identity);
    println!(
        "   {} {}",
        "Owner pub:".dimmed(),
        store.meta_public_key(identity)?.to_hex()
    );
    println!("   {} {}", "Receiving address:".yellow(), address.encode());

    let snapshot = store
        .export_identity(identity, password)
        .context("Failed to seal snapshot")?;

    if let Some(path) = output {
        std::fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;
        println!("\n{} {}", "✅ Sealed snapshot saved to:".green(), path.display());
    } else {
        println!("\n{}", "Sealed snapshot (JSON):".yellow().bold());
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    println!(
        "\n{}",
        "⚠️  The snapshot is sealed; funds are unrecoverable without the password!"
            .red()
            .bold()
    );

    Ok(())
}

/// Rotate the receiving address inside a sealed snapshot
async fn cmd_rotate(keys_path: &Path, password: &str) -> Result<()> {
    println!("{}", "🔄 Rotating receiving address...".cyan().bold());

    let snapshot: IdentitySnapshot = serde_json::from_reader(
        std::fs::File::open(keys_path).context("Failed to open snapshot file")?,
    )?;
    let identity = snapshot.identity.clone();

    let store = MetaAccountStore::new();
    store
        .import_identity(&snapshot, password)
        .context("Failed to open sealed snapshot")?;

    let address = store.rotate_receiving_address(&identity)?;
    let resealed = store.export_identity(&identity, password)?;
    std::fs::write(keys_path, serde_json::to_string_pretty(&resealed)?)?;

    println!("\n{}", "✅ Receiving address rotated:".green().bold());
    println!("   {} {}", "New address:".yellow(), address.encode());
    println!(
        "   {} unchanged (payments to old stealth addresses remain spendable)",
        "Owner key:".dimmed()
    );

    Ok(())
}

/// Derive a one-time destination for a recipient address string
async fn cmd_pay(recipient: &str) -> Result<()> {
    println!(
        "{} {}",
        "💸 Deriving stealth destination for:".cyan().bold(),
        recipient
    );

    let payment =
        pay_to_receiving_address(recipient).context("Invalid recipient address")?;

    print_payment(&payment);

    println!("\n{}", "ℹ️  Next steps:".cyan());
    println!("   1. Send funds to the one-time address above");
    println!("   2. Publish the (ephemeral pub, address) event on the ledger");
    println!("   (repeated payments to this address string land on the same");
    println!("    destination until the recipient rotates their address)");

    Ok(())
}

fn print_payment(payment: &StealthPayment) {
    println!("\n{}", "✅ Stealth destination derived:".green().bold());
    println!("   {} {}", "Address:".yellow(), payment.address);
    println!(
        "   {} {}",
        "Stealth pub:".dimmed(),
        payment.stealth_pub.to_hex()
    );
    println!(
        "   {} {}",
        "Ephemeral pub:".dimmed(),
        payment.ephemeral_pub.to_hex()
    );
}

/// Full payment cycle against in-process collaborators
async fn cmd_demo() -> Result<()> {
    println!("{}", "🎬 Veil end-to-end demo".cyan().bold());

    let store = Arc::new(MetaAccountStore::new());
    let ledger = Arc::new(MemoryLedger::new());
    let names = MemoryNameRegistry::new();
    let balances = Arc::new(MemoryBalanceSource::new());

    // 1. Recipient generates a meta key and registers a name
    println!("\n{}", "1. Recipient setup".dimmed());
    let address = store.generate(b"demo-wallet-signature", "recipient")?;
    names.register("alice", address.owner_pub);
    println!("   Receiving address: {}", address.encode().yellow());
    println!("   Registered name:   alice");

    // 2. Payer A pays via the name flow (fresh ephemeral per payment)
    println!("\n{}", "2. Payment via name lookup".dimmed());
    let payment_a = pay_to_name(&names, "alice").await?;
    ledger.publish(payment_a.ephemeral_pub, payment_a.address)?;
    balances.credit(payment_a.address, "0x2::sui::SUI", 2_500_000_000);
    println!("   Sent 2.5 SUI to {}", payment_a.address);

    // 3. Payer B pays via the shared address string (embedded nonce)
    println!("\n{}", "3. Payment via address string".dimmed());
    let payment_b = pay_to_receiving_address(&address.encode())?;
    ledger.publish(payment_b.ephemeral_pub, payment_b.address)?;
    balances.credit(payment_b.address, "0x2::sui::SUI", 1_000_000_000);
    println!("   Sent 1 SUI to {}", payment_b.address);

    // 4. Recipient syncs the event stream
    println!("\n{}", "4. Ledger sync".dimmed());
    let engine = SyncEngine::new(store.clone(), ledger);
    let report = engine
        .sync("recipient")
        .await?
        .report()
        .expect("no concurrent sync in the demo");
    println!(
        "   Scanned {} events, recovered {} accounts in {}ms",
        report.events_scanned, report.new_accounts, report.duration_ms
    );

    // 5. Balance rollup across recovered accounts
    println!("\n{}", "5. Balance aggregation".dimmed());
    let aggregator = BalanceAggregator::new(
        store.clone(),
        balances,
        Arc::new(StaticCatalog::mainnet()),
    );
    let summary = aggregator.aggregate("recipient").await?;

    println!("\n{}", "📈 Recovered balances:".green().bold());
    for total in &summary.totals {
        println!(
            "   {} {}",
            total.display_total.yellow().bold(),
            total.currency_id
        );
    }
    for entry in &summary.breakdown {
        println!(
            "      {} {} at {}",
            entry.display_amount, entry.currency_id, entry.address
        );
    }

    let sui_total = summary
        .total_for("0x2::sui::SUI")
        .map(|t| t.raw_total)
        .unwrap_or(0);
    if sui_total == 3_500_000_000 {
        println!("\n   {} Both payments recovered and spendable!", "✅".green());
    } else {
        println!("\n   {} Expected 3.5 SUI, found {}", "❌".red(), sui_total);
    }

    Ok(())
}

/// Benchmark scanning throughput
async fn cmd_bench(count: usize) -> Result<()> {
    println!(
        "{} {} ledger events",
        "📊 Benchmarking with".cyan().bold(),
        count
    );

    // Generate keys
    println!("\n{}", "1. Generating keys...".dimmed());
    let start = std::time::Instant::now();
    let store = Arc::new(MetaAccountStore::new());
    store.generate(b"bench-wallet-signature", "bench")?;
    let owner_pub = store.meta_public_key("bench")?;
    println!("   ✓ Key generation: {:?}", start.elapsed());

    // Publish events
    println!("\n{}", "2. Publishing events...".dimmed());
    let ledger = Arc::new(MemoryLedger::new());

    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let other_pub =
        veil_crypto::public_from_scalar(&veil_crypto::random_scalar()).unwrap();
    let start = std::time::Instant::now();
    for i in 0..count {
        // Mix of our payments and unrelated ones
        let payment = if i % 100 == 0 {
            pay_to_public_key(&owner_pub)?
        } else {
            pay_to_public_key(&other_pub)?
        };
        ledger.publish(payment.ephemeral_pub, payment.address)?;
        pb.inc(1);
    }
    pb.finish();
    println!("   ✓ Published {} events: {:?}", count, start.elapsed());

    // Sync
    println!("\n{}", "3. Scanning...".dimmed());
    let engine = SyncEngine::with_config(store.clone(), ledger, SyncConfig::new());
    let start = std::time::Instant::now();
    let report = engine
        .sync("bench")
        .await?
        .report()
        .expect("no concurrent sync in the benchmark");
    let scan_time = start.elapsed();

    let rate = count as f64 / scan_time.as_secs_f64();

    println!("   ✓ Scanned {} events: {:?}", report.events_scanned, scan_time);
    println!("   ✓ Recovered {} accounts", report.new_accounts);
    println!("\n{}", "📈 Results:".green().bold());
    println!("   Scan rate: {:.0} events/sec", rate);
    println!(
        "   Time per event: {:.2}µs",
        scan_time.as_micros() as f64 / count as f64
    );

    let expected = count.div_ceil(100);
    if report.new_accounts as usize == expected {
        println!("   {} All expected payments recovered!", "✅".green());
    } else {
        println!(
            "   {} Expected {}, recovered {}",
            "❌".red(),
            expected,
            report.new_accounts
        );
    }

    Ok(())
}
