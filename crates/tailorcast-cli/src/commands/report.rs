use serde_json::Value;

use tailorcast_core::report;

use crate::input::{self, InputArgs};

pub fn run_report(args: InputArgs, config: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let analytics_input = input::load(&args, config)?;
    let result = report::generate_report(&analytics_input)?;
    Ok(serde_json::to_value(result)?)
}
