mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Scenario expression evaluator.
#[derive(Parser)]
#[command(
    name = "scenario",
    version,
    about = "Scenario expression evaluator",
    disable_help_subcommand = true
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one scenario expression and print its value
    Eval {
        /// Expression text, e.g. "Equal (Exactly 0) Zero"
        expr: String,
        /// World config file (.toml or .json)
        #[arg(long)]
        world: Option<PathBuf>,
    },

    /// Show command documentation
    Help {
        /// Command to describe; a namespace followed by a command selects
        /// a nested command (e.g. `Erc20 TotalSupply`)
        path: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Eval { expr, world } => {
            commands::eval::cmd_eval(&expr, world.as_deref(), cli.output, cli.quiet);
        }
        Commands::Help { path } => {
            commands::help::cmd_help(&path, cli.output, cli.quiet);
        }
    }
}

/// Report an error on stderr in the requested format and exit non-zero.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) -> ! {
    if !quiet {
        match output {
            OutputFormat::Text => eprintln!("{}", msg),
            OutputFormat::Json => {
                eprintln!("{}", serde_json::json!({ "error": msg }));
            }
        }
    }
    process::exit(1);
}
