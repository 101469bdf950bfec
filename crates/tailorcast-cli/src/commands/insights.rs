use serde_json::Value;

use tailorcast_core::insights;

use crate::input::{self, InputArgs};

pub fn run_seasonal(args: InputArgs, config: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let analytics_input = input::load(&args, config)?;
    let result = insights::seasonality(&analytics_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_demand(args: InputArgs, config: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let analytics_input = input::load(&args, config)?;
    let result = insights::demand(&analytics_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_configurations(args: InputArgs, config: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let analytics_input = input::load(&args, config)?;
    let result = insights::popular_configurations(&analytics_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_trends(args: InputArgs, config: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let analytics_input = input::load(&args, config)?;
    let result = insights::future_trends(&analytics_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_inventory(args: InputArgs, config: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let analytics_input = input::load(&args, config)?;
    let result = insights::inventory_needs(&analytics_input)?;
    Ok(serde_json::to_value(result)?)
}
