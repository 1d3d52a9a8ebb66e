//! Podium onboarding CLI - bulk-create employee accounts from CSV
//!
//! # Main Commands
//!
//! ```bash
//! podium-onboarding parse team.csv          # Validate a CSV, print rows and errors as JSON
//! podium-onboarding import team.csv         # Create accounts (batch, sequential fallback)
//! podium-onboarding serve                   # Start HTTP server (port 3000)
//! ```
//!
//! # Other Commands
//!
//! ```bash
//! podium-onboarding import team.csv --dry-run      # Parse and show what would be sent
//! podium-onboarding import team.csv --sequential   # Skip the batch endpoint
//! podium-onboarding policy cost-center.json        # Check a cost-center policy
//! ```
//!
//! The employee API is configured through `PODIUM_API_URL`, `PODIUM_API_TOKEN`
//! and `PODIUM_API_TIMEOUT_SECS` (a `.env` file is read if present).

use clap::{Parser, Subcommand};
use onboarding::{
    import_employees, import_employees_sequential, parse_employees_file,
    validate_cost_center_policy, CancellationToken, ClientConfig, CostCenterPolicy,
    HttpEmployeeApi, ImportMode, ImportReport, ParseOutcome,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "podium-onboarding")]
#[command(about = "Import employees into Podium from a CSV file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a CSV file, output rows and errors as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Source encoding (auto-detect if not specified)
        #[arg(short, long)]
        encoding: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a CSV file and create an account for every valid row
    Import {
        /// Input CSV file
        input: PathBuf,

        /// Source encoding (auto-detect if not specified)
        #[arg(short, long)]
        encoding: Option<String>,

        /// Create accounts one request at a time instead of one batch call
        #[arg(long)]
        sequential: bool,

        /// Parse and show what would be imported without calling the API
        #[arg(long)]
        dry_run: bool,

        /// Import the valid rows even if some lines were rejected
        #[arg(short, long)]
        yes: bool,

        /// Output file for the import report (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a cost-center policy JSON document
    Policy {
        /// Policy JSON file
        input: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input,
            encoding,
            output,
        } => cmd_parse(&input, encoding.as_deref(), output.as_deref()),

        Commands::Import {
            input,
            encoding,
            sequential,
            dry_run,
            yes,
            output,
        } => {
            cmd_import(
                &input,
                encoding.as_deref(),
                sequential,
                dry_run,
                yes,
                output.as_deref(),
            )
            .await
        }

        Commands::Policy { input } => cmd_policy(&input),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load(input: &Path, encoding: Option<&str>) -> Result<ParseOutcome, Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());
    let outcome = parse_employees_file(input, encoding)?;

    eprintln!("   ✅ Valid: {}", outcome.rows.len());
    if !outcome.errors.is_empty() {
        eprintln!("   ❌ Rejected: {}", outcome.errors.len());
        for err in outcome.errors.iter().take(10) {
            eprintln!("     - {}", err);
        }
        if outcome.errors.len() > 10 {
            eprintln!("     ... and {} more", outcome.errors.len() - 10);
        }
    }

    Ok(outcome)
}

fn cmd_parse(
    input: &Path,
    encoding: Option<&str>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = load(input, encoding)?;

    let json = serde_json::to_string_pretty(&outcome)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_import(
    input: &Path,
    encoding: Option<&str>,
    sequential: bool,
    dry_run: bool,
    yes: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = load(input, encoding)?;

    if outcome.is_structural_failure() {
        return Err(outcome.errors[0].message.clone().into());
    }
    if outcome.rows.is_empty() {
        return Err("no valid rows to import".into());
    }
    if !outcome.errors.is_empty() && !yes && !dry_run {
        return Err(format!(
            "{} lines were rejected; fix them or pass --yes to import the {} valid rows",
            outcome.errors.len(),
            outcome.rows.len()
        )
        .into());
    }

    if dry_run {
        eprintln!("\n🔍 Dry run: {} employees would be created", outcome.rows.len());
        let json = serde_json::to_string_pretty(&outcome.rows)?;
        write_output(&json, output)?;
        return Ok(());
    }

    let api = HttpEmployeeApi::new(ClientConfig::from_env()?)?;
    eprintln!("\n🚀 Importing {} employees into {}", outcome.rows.len(), api.config().base_url);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⚠️  Cancelling...");
            on_ctrl_c.cancel();
        }
    });

    let progress = |completed: usize, total: usize| {
        eprint!("\r   ⏳ {}/{}", completed, total);
        let _ = std::io::stderr().flush();
    };

    let report = if sequential {
        ImportReport {
            mode: ImportMode::Sequential,
            results: import_employees_sequential(&api, &outcome.rows, Some(&progress), Some(&cancel))
                .await,
            fallback_reason: None,
        }
    } else {
        import_employees(&api, &outcome.rows, Some(&progress), Some(&cancel)).await
    };
    eprintln!();

    eprintln!("\n📊 Results ({:?}):", report.mode);
    if let Some(ref reason) = report.fallback_reason {
        eprintln!("   Batch unavailable: {}", reason);
    }
    eprintln!("   ✅ Imported: {}", report.succeeded());
    eprintln!("   ❌ Failed: {}", report.failed());
    for failure in report.failures().take(10) {
        eprintln!(
            "     - Line {} ({}): {}",
            failure.line,
            failure.email,
            failure.message.as_deref().unwrap_or("import failed")
        );
    }

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)?;

    if report.failed() > 0 {
        std::process::exit(1);
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_policy(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating policy: {}", input.display());

    let content = fs::read_to_string(input)?;
    let policy: CostCenterPolicy = serde_json::from_str(&content)?;

    validate_cost_center_policy(&policy)?;

    eprintln!("   Categories: {}", policy.allowed_categories.join(", "));
    eprintln!("   Limit per ride: {:.2}", policy.spending_limit_per_ride);
    match policy.business_hours {
        Some(ref hours) => eprintln!("   Business hours: {} - {}", hours.start, hours.end),
        None => eprintln!("   Business hours: any time"),
    }
    eprintln!("✅ Policy is valid");

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    onboarding::server::start_server(port, config).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
