pub mod file;
pub mod stdin;

use clap::Args;
use serde_json::Value;

use tailorcast_core::calendar::parse_timestamp;
use tailorcast_core::types::AnalyticsInput;

/// Input options shared by every analysis subcommand
#[derive(Args)]
pub struct InputArgs {
    /// Path to JSON input: an array of orders, or `{orders, students, settings}`
    #[arg(long)]
    pub input: Option<String>,

    /// Reference instant for trailing windows (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<String>,
}

/// Read the snapshot from `--input` or piped stdin, then apply the settings
/// file and `--as-of` override.
pub fn load(args: &InputArgs, config: Option<&str>) -> Result<AnalyticsInput, Box<dyn std::error::Error>> {
    let raw: Value = if let Some(ref path) = args.input {
        file::read_json_value(path)?
    } else if let Some(data) = stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required".into());
    };

    let mut input: AnalyticsInput = if raw.is_array() {
        AnalyticsInput::from_orders(serde_json::from_value(raw)?)
    } else {
        serde_json::from_value(raw)?
    };

    if let Some(path) = config {
        input.settings = file::read_settings(path)?;
    }
    if let Some(ref stamp) = args.as_of {
        let as_of = parse_timestamp(stamp).ok_or_else(|| format!("Unrecognised --as-of value '{stamp}'"))?;
        input.settings.as_of = Some(as_of);
    }

    tracing::debug!(
        orders = input.orders.len(),
        students = input.students.len(),
        "input loaded"
    );
    Ok(input)
}
