use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use momenta::aggregate::{self, bubbles, ZoomTier};
use momenta::config::Config;
use momenta::export::{self, ExportFormat};
use momenta::logging;
use momenta::model::TimelineEvent;

struct CliArgs {
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    format: ExportFormat,
    tier: ZoomTier,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = CliArgs {
        config_path: None,
        input: None,
        output: None,
        format: ExportFormat::Json,
        tier: ZoomTier::Month,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("momenta {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--input" | "-i" => {
                if i + 1 < args.len() {
                    parsed.input = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --input requires a path argument");
                    std::process::exit(1);
                }
            }
            "--output" | "-o" => {
                if i + 1 < args.len() {
                    parsed.output = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --output requires a path argument");
                    std::process::exit(1);
                }
            }
            "--format" | "-f" => {
                if i + 1 < args.len() {
                    parsed.format = match args[i + 1].as_str() {
                        "json" => ExportFormat::Json,
                        "csv" => ExportFormat::Csv,
                        other => {
                            eprintln!("Unknown format: {}", other);
                            std::process::exit(1);
                        }
                    };
                    i += 1;
                } else {
                    eprintln!("Error: --format requires json or csv");
                    std::process::exit(1);
                }
            }
            "--tier" | "-t" => {
                if i + 1 < args.len() {
                    parsed.tier = match ZoomTier::from_str(&args[i + 1]) {
                        Ok(tier) => tier,
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            std::process::exit(1);
                        }
                    };
                    i += 1;
                } else {
                    eprintln!("Error: --tier requires a zoom tier");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"momenta - life timeline aggregation and layout engine

USAGE:
    momenta [OPTIONS]

OPTIONS:
    --config, -c PATH   Path to config file
    --input, -i PATH    Events JSON file to load
    --output, -o PATH   Write the aggregated timeline here
    --format, -f FMT    Export format: json or csv (default json)
    --tier, -t TIER     Zoom tier: year, month, week, day, focus
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    MOMENTA_LOG         Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/momenta/config.toml"#
    );
}

fn main() -> Result<()> {
    let args = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(Some(Config::config_dir().join("logs")));

    // Load configuration
    let config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let input = match &args.input {
        Some(path) => path.clone(),
        None => {
            print_help();
            return Ok(());
        }
    };

    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read events from {}", input.display()))?;
    let events: Vec<TimelineEvent> =
        serde_json::from_str(&content).context("Failed to parse events JSON")?;

    let stats = aggregate::timeline_stats(&events, args.tier);
    let nodes = aggregate::aggregate_tiers(
        &events,
        args.tier,
        None,
        &HashSet::new(),
        &config.tiers,
    );
    let overview = bubbles::aggregate_bubbles(&events, args.tier);

    println!(
        "{} events ({} assets) -> {} nodes, {} bubbles at {} tier",
        stats.event_count,
        stats.asset_count,
        nodes.len(),
        overview.len(),
        args.tier.as_str()
    );
    if let Some((bucket, count)) = &stats.busiest_bucket {
        println!("Busiest bucket: {} with {} events", bucket, count);
    }

    if let Some(output) = &args.output {
        let count = export::export_events(&events, output, args.format)?;
        println!(
            "Exported {} events as {} to {}",
            count,
            args.format.name(),
            output.display()
        );
    }

    Ok(())
}
