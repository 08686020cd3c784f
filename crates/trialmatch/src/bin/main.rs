//! trialmatch command-line interface

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trialmatch::cli::{EngineOptions, doid, evaluate, init_logging, lint, output, rules};

/// Clinical trial eligibility matching
#[derive(Parser)]
#[command(name = "trialmatch")]
#[command(author, version, about = "Clinical trial eligibility tools", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, pretty, table)
    #[arg(short = 'f', long, global = true)]
    format: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

/// Ontology and evaluation settings
#[derive(clap::Args)]
struct EngineArgs {
    /// Disease ontology in obograph JSON format
    #[arg(short, long)]
    doid: PathBuf,

    /// Curated DOID additions (main cancer types, adeno-squamous mappings)
    #[arg(long)]
    doid_config: Option<PathBuf>,

    /// Evaluation settings (JSON)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Date the evaluation is done at (default: today)
    #[arg(long)]
    reference_date: Option<NaiveDate>,
}

impl From<EngineArgs> for EngineOptions {
    fn from(args: EngineArgs) -> Self {
        Self {
            doid: args.doid,
            doid_config: args.doid_config,
            eval_config: args.config,
            reference_date: args.reference_date,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Match patients against trial protocols
    Evaluate {
        /// Trial protocol files (JSON)
        #[arg(short, long = "protocol", required = true)]
        protocols: Vec<PathBuf>,

        /// Patient record files (JSON)
        #[arg(required = true)]
        patients: Vec<PathBuf>,

        /// Only report trials the patient may be eligible for
        #[arg(short, long)]
        eligible_only: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Check protocol criteria without evaluating patients
    Lint {
        /// Trial protocol files (JSON)
        protocols: Vec<PathBuf>,

        /// Strict mode (warnings as errors)
        #[arg(short, long)]
        strict: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// List the rule catalogue
    Rules {
        /// Only rules of this group (general, tumor, molecular, ...)
        #[arg(short, long)]
        group: Option<String>,

        /// Only rules whose name contains this text
        filter: Option<String>,
    },

    /// Look up disease ontology terms
    Doid {
        /// DOID ids or term names
        queries: Vec<String>,

        /// Disease ontology in obograph JSON format
        #[arg(short, long)]
        doid: PathBuf,

        /// Curated DOID additions
        #[arg(long)]
        doid_config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Evaluate {
            protocols,
            patients,
            eligible_only,
            engine,
        } => {
            let config = evaluate::EvaluateConfig {
                protocols,
                patients,
                engine: engine.into(),
                eligible_only,
                output_format: cli.format.clone(),
                output_file: cli.output.clone(),
            };
            evaluate::evaluate(config).await
        }

        Commands::Lint {
            protocols,
            strict,
            engine,
        } => {
            let config = lint::LintConfig {
                protocols,
                engine: engine.into(),
                strict,
                verbose: cli.verbose,
                output_format: cli.format.clone(),
            };
            lint::lint(config).await
        }

        Commands::Rules { group, filter } => {
            let config = rules::RulesConfig {
                group,
                filter,
                output_format: cli.format.clone(),
                output_file: cli.output.clone(),
            };
            rules::rules(config).await
        }

        Commands::Doid {
            queries,
            doid,
            doid_config,
        } => {
            let config = doid::DoidConfig {
                doid,
                doid_config,
                queries,
                output_format: cli.format.clone(),
                output_file: cli.output.clone(),
            };
            doid::doid(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
