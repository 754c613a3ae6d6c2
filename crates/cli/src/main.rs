//! patternlab CLI, the main entry point.
//!
//! Commands:
//! - `run`       Run every pattern script and write a report
//! - `bench`     Cost and performance tables for the intelligence patterns
//! - `risk`      Score a lending profile
//! - `handoff`   Inspect a handoff context package
//! - `validate`  Check a JSON payload against a schema
//! - `patterns`  List the benchmark catalog
//! - `config`    Show or create the configuration file

use clap::{Parser, Subcommand};
use patternlab_config::{AppConfig, LoggingConfig};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "patternlab",
    about = "patternlab: run, score and benchmark the agent pattern catalog",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.patternlab/config.toml)
    #[arg(short, long, global = true, env = "PATTERNLAB_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run pattern scripts and write a test report
    Run {
        /// Categories to run, e.g. `1,intelligence`
        #[arg(long)]
        category: Option<String>,

        /// Frameworks to run (`adk`, `crewai`)
        #[arg(long)]
        framework: Option<String>,

        /// Catalog root (overrides `runner.catalog_root`)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Report directory (overrides `runner.report_dir`)
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Report format: markdown, json or both
        #[arg(long, default_value = "both")]
        format: String,

        /// Only list the scripts that would run
        #[arg(long)]
        list: bool,
    },

    /// Illustrative cost and performance benchmarks
    Bench {
        #[command(subcommand)]
        command: BenchCommands,
    },

    /// Score a lending profile for credit, market and regulatory risk
    Risk {
        /// Built-in profile: low, medium, high or critical
        #[arg(long, default_value = "medium", conflicts_with = "file")]
        profile: String,

        /// JSON file holding a lending profile
        #[arg(long)]
        file: Option<PathBuf>,

        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a handoff context package
    Handoff {
        /// JSON context package; the built-in sample when omitted
        file: Option<PathBuf>,

        /// Merge these packages into the first one
        #[arg(long = "merge")]
        merge: Vec<PathBuf>,

        /// Print the restored package as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a JSON payload against a schema
    Validate {
        /// Schema name, e.g. `order`, `invoice`, `support-ticket`
        schema: String,

        /// JSON file to check
        file: PathBuf,
    },

    /// List the benchmark pattern catalog
    Patterns,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum BenchCommands {
    /// Token, API call and dollar estimates
    Cost {
        /// Comma-separated pattern keys (all when omitted)
        #[arg(long)]
        patterns: Option<String>,

        /// Pricing model (overrides `bench.default_model`)
        #[arg(long)]
        model: Option<String>,

        /// Export results: json, csv or both
        #[arg(long)]
        export: Option<String>,

        /// Export directory (overrides `bench.output_dir`)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Simulated latency and throughput under load
    Perf {
        /// Comma-separated pattern keys (all when omitted)
        #[arg(long)]
        patterns: Option<String>,

        /// Comma-separated load levels, e.g. `1,5,10`
        #[arg(long)]
        load: Option<String>,

        /// Export results: json, csv or both
        #[arg(long)]
        export: Option<String>,

        /// Export directory (overrides `bench.output_dir`)
        #[arg(long)]
        output: Option<PathBuf>,

        /// RNG seed for reproducible numbers
        #[arg(long)]
        seed: Option<u64>,

        /// Scale applied to simulated sleeps (0.01 runs 100x faster)
        #[arg(long)]
        time_scale: Option<f64>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file path
    Path,
}

fn load_config(path: Option<&std::path::Path>) -> Result<AppConfig, String> {
    match path {
        Some(p) => AppConfig::load_with_overrides(p),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))
}

fn init_tracing(verbose: bool, logging: &LoggingConfig) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // `config init` must work even when the existing file is broken
    if let Commands::Config {
        command: ConfigCommands::Init { force },
    } = &cli.command
    {
        init_tracing(cli.verbose, &LoggingConfig::default());
        return commands::config_cmd::init(cli.config.as_deref(), *force);
    }

    let config = load_config(cli.config.as_deref())?;
    init_tracing(cli.verbose, &config.logging);

    match cli.command {
        Commands::Run {
            category,
            framework,
            root,
            report_dir,
            format,
            list,
        } => {
            let opts = commands::run::RunOptions {
                category,
                framework,
                root,
                report_dir,
                format,
                list,
            };
            commands::run::run(&config, opts).await?
        }
        Commands::Bench { command } => match command {
            BenchCommands::Cost {
                patterns,
                model,
                export,
                output,
            } => commands::bench::cost(&config, patterns, model, export, output)?,
            BenchCommands::Perf {
                patterns,
                load,
                export,
                output,
                seed,
                time_scale,
            } => {
                let opts = commands::bench::PerfOptions {
                    patterns,
                    load,
                    export,
                    output,
                    seed,
                    time_scale,
                };
                commands::bench::perf(&config, opts).await?
            }
        },
        Commands::Risk {
            profile,
            file,
            json,
        } => commands::risk::run(&profile, file.as_deref(), json)?,
        Commands::Handoff { file, merge, json } => {
            commands::handoff::run(file.as_deref(), &merge, json)?
        }
        Commands::Validate { schema, file } => commands::validate::run(&schema, &file)?,
        Commands::Patterns => commands::patterns::run()?,
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_cmd::show(&config)?,
            ConfigCommands::Path => commands::config_cmd::path(cli.config.as_deref())?,
            ConfigCommands::Init { force } => {
                commands::config_cmd::init(cli.config.as_deref(), force)?
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bench_perf() {
        let cli = Cli::try_parse_from([
            "patternlab", "bench", "perf", "--patterns", "prioritization", "--load", "1,5",
            "--seed", "7", "--export", "csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Bench {
                command: BenchCommands::Perf { patterns, load, seed, export, .. },
            } => {
                assert_eq!(patterns.as_deref(), Some("prioritization"));
                assert_eq!(load.as_deref(), Some("1,5"));
                assert_eq!(seed, Some(7));
                assert_eq!(export.as_deref(), Some("csv"));
            }
            _ => panic!("expected bench perf"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["patternlab", "patterns", "--verbose", "--config", "/tmp/c.toml"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["patternlab", "run", "--framework", "adk"]).unwrap();
        match cli.command {
            Commands::Run { framework, format, list, .. } => {
                assert_eq!(framework.as_deref(), Some("adk"));
                assert_eq!(format, "both");
                assert!(!list);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn risk_profile_conflicts_with_file() {
        let result = Cli::try_parse_from([
            "patternlab", "risk", "--profile", "high", "--file", "p.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn broken_config_is_one_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[runner\ninterpreter = ").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.starts_with("Failed to load config: "));
        assert!(err.contains("Failed to parse config file at"));
        assert!(err.contains("config.toml"));
    }

    #[test]
    fn validate_requires_schema_and_file() {
        assert!(Cli::try_parse_from(["patternlab", "validate", "order"]).is_err());
        let cli = Cli::try_parse_from(["patternlab", "validate", "order", "o.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Validate { .. }));
    }
}
