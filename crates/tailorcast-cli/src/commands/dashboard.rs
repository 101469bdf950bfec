use serde_json::Value;

use tailorcast_core::dashboard;

use crate::input::{self, InputArgs};

pub fn run_dashboard(args: InputArgs, config: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let analytics_input = input::load(&args, config)?;
    if analytics_input.students.is_empty() {
        tracing::warn!("no students in input; student analytics will be empty");
    }
    let result = dashboard::build_dashboard(&analytics_input)?;
    Ok(serde_json::to_value(result)?)
}
