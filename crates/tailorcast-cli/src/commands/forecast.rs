use clap::Args;
use serde_json::Value;

use tailorcast_core::forecast;

use crate::input::{self, InputArgs};

/// Arguments for the daily revenue forecast
#[derive(Args)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Days to forecast (overrides settings.horizon_days)
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Seed for training and the fallback model (overrides settings.seed)
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run_forecast(args: ForecastArgs, config: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let mut analytics_input = input::load(&args.input, config)?;
    if let Some(horizon) = args.horizon {
        analytics_input.settings.horizon_days = horizon;
    }
    if let Some(seed) = args.seed {
        analytics_input.settings.seed = seed;
    }
    let result = forecast::revenue_forecast(&analytics_input)?;
    Ok(serde_json::to_value(result)?)
}
