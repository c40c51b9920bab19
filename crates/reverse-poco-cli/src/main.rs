//! reverse-poco CLI - generate Entity Framework Core classes from a database.

use clap::{Parser, Subcommand};
use reverse_poco::{
    health_check, Config, ConfigurationStyle, GenError, Generator, NamingConvention,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "reverse-poco")]
#[command(about = "Reverse-engineer Entity Framework Core POCO classes from a database schema")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the schema and write entity, context and procedure files
    Generate {
        /// Override output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Override C# namespace
        #[arg(long)]
        namespace: Option<String>,

        /// Override DbContext class name
        #[arg(long)]
        context_name: Option<String>,

        /// Override naming convention: verbatim or word-capitalized
        #[arg(long)]
        naming: Option<String>,

        /// Override configuration style: annotation-based or builder-based
        #[arg(long)]
        style: Option<String>,

        /// Dry run: read and render without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the assembled schema as JSON
    Inspect,

    /// Test the database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), GenError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Generate {
            output_dir,
            namespace,
            context_name,
            naming,
            style,
            dry_run,
        } => {
            // Apply overrides
            if let Some(dir) = output_dir {
                config.generation.output_dir = dir;
            }
            if let Some(ns) = namespace {
                config.generation.namespace = ns;
            }
            if let Some(name) = context_name {
                config.generation.context_name = name;
            }
            if let Some(naming) = naming {
                config.generation.naming_convention = naming.parse::<NamingConvention>()?;
            }
            if let Some(style) = style {
                config.generation.configuration_style = style.parse::<ConfigurationStyle>()?;
            }
            config.validate()?;

            let generator = Generator::new(config).await?;
            let result = generator.run(dry_run).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                let status_msg = if dry_run { "Dry run completed!" } else { "Generation completed!" };
                println!("\n{}", status_msg);
                println!("  Source: {} ({})", result.dialect, result.schema);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Tables: {}", result.tables);
                println!("  Columns: {}", result.columns);
                println!("  Procedures: {}", result.procedures);
                if result.dangling_foreign_keys > 0 {
                    println!(
                        "  Foreign keys to tables outside the schema: {}",
                        result.dangling_foreign_keys
                    );
                }
                let verb = if dry_run { "Would write" } else { "Wrote" };
                println!("  {} {} files:", verb, result.files.len());
                for file in &result.files {
                    println!("    {}", file.display());
                }
            }
        }

        Commands::Inspect => {
            let generator = Generator::new(config).await?;
            let schema = generator.inspect().await?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }

        Commands::HealthCheck => {
            let result = health_check(&config.connection).await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Database ({}): {} ({}ms)",
                    result.dialect,
                    if result.connected { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if result.connected {
                    println!("  Tables: {}", result.tables);
                }
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
            }

            if !result.connected {
                return Err(GenError::connection(
                    result.error.unwrap_or_default(),
                    "health check",
                ));
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries generated JSON
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
