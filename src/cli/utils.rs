use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config;
use crate::database::Database;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let (Some(Value::Object(extra)), Some(body)) = (data, response.as_object_mut()) {
                body.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Connect using DATABASE_URL and the configured pool limits
pub async fn connect() -> anyhow::Result<Database> {
    let _ = dotenvy::dotenv();
    Database::connect(&config::config().database)
        .await
        .context("failed to connect to database (is DATABASE_URL set?)")
}
