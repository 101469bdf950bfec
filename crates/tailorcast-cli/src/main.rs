mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::forecast::ForecastArgs;
use input::InputArgs;

/// Uniform-shop demand, inventory and revenue analytics
#[derive(Parser)]
#[command(
    name = "tailorcast",
    version,
    about = "Uniform-shop demand, inventory and revenue analytics",
    long_about = "Reads a snapshot of uniform orders (and optionally students) as JSON \
                  and runs seasonal, demand, configuration, trend, inventory, revenue \
                  forecast and dashboard analyses over it."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine settings file (YAML or JSON); replaces `settings` in the input
    #[arg(long, global = true)]
    config: Option<String>,

    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full report: forecast, seasonality, demand, trends and inventory
    Report(InputArgs),
    /// Revenue by weekday, month and quarter
    Seasonal(InputArgs),
    /// Product type, course and gender distribution
    Demand(InputArgs),
    /// Most ordered and trending (type, gender, course) combinations
    Configurations(InputArgs),
    /// Next-quarter outlook and growth opportunities
    Trends(InputArgs),
    /// Stock recommendations with shortage and surplus risks
    Inventory(InputArgs),
    /// Daily revenue forecast
    Forecast(ForecastArgs),
    /// Operational KPIs over orders and students
    Dashboard(InputArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    let config = cli.config.as_deref();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Report(args) => commands::report::run_report(args, config),
        Commands::Seasonal(args) => commands::insights::run_seasonal(args, config),
        Commands::Demand(args) => commands::insights::run_demand(args, config),
        Commands::Configurations(args) => commands::insights::run_configurations(args, config),
        Commands::Trends(args) => commands::insights::run_trends(args, config),
        Commands::Inventory(args) => commands::insights::run_inventory(args, config),
        Commands::Forecast(args) => commands::forecast::run_forecast(args, config),
        Commands::Dashboard(args) => commands::dashboard::run_dashboard(args, config),
        Commands::Version => {
            println!("tailorcast {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
